//! Clap derive structures for the `ipamctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ipamctl -- declare DNS and IP address resources on an IPAM appliance
#[derive(Debug, Parser)]
#[command(
    name = "ipamctl",
    version,
    about = "Manage IPAM and DNS objects from the command line",
    long_about = "Create, read, update, and delete configurations, blocks, networks,\n\
        DHCP ranges, IP allocations, zones, and DNS records on an IPAM\n\
        appliance through its REST API.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Appliance profile to use
    #[arg(long, short = 'p', env = "IPAM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Appliance host (overrides profile)
    #[arg(long, short = 'H', env = "IPAM_HOST", global = true)]
    pub host: Option<String>,

    /// Appliance port (overrides profile)
    #[arg(long, env = "IPAM_PORT", global = true)]
    pub port: Option<u16>,

    /// Plain HTTP instead of HTTPS
    #[arg(long, global = true)]
    pub http: bool,

    /// Login user (overrides profile)
    #[arg(long, short = 'u', env = "IPAM_USERNAME", global = true)]
    pub username: Option<String>,

    /// Configuration the command works in (overrides profile)
    #[arg(long, short = 'C', env = "IPAM_CONFIGURATION", global = true)]
    pub configuration: Option<String>,

    /// DNS view (overrides profile)
    #[arg(long, env = "IPAM_VIEW", global = true)]
    pub view: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "IPAM_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "IPAM_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "IPAM_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configurations
    #[command(alias = "cfg")]
    Configuration(ConfigurationArgs),

    /// Manage DNS views
    View(ViewArgs),

    /// Manage DNS zones and their server roles
    #[command(alias = "z")]
    Zone(ZoneArgs),

    /// Manage address blocks
    Block(BlockArgs),

    /// Manage networks
    #[command(alias = "net")]
    Network(NetworkArgs),

    /// Manage DHCP ranges
    Range(RangeArgs),

    /// Allocate, update, and release IP addresses
    Ip(IpArgs),

    /// Manage host records
    Host(HostArgs),

    /// Manage CNAME records
    Cname(CnameArgs),

    /// Manage TXT records
    Txt(TxtArgs),

    /// Manage SRV records
    Srv(SrvArgs),

    /// Manage generic records
    Generic(GenericArgs),

    /// Manage external host records
    ExternalHost(ExternalHostArgs),

    /// Turn the PTR of a host record on or off
    Ptr(PtrArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared record arguments ──────────────────────────────────────────

/// Name and zone addressing one DNS record.
#[derive(Debug, Args)]
pub struct RecordName {
    /// Record name; qualified with --zone unless it already ends with it
    pub name: String,

    /// Zone; derived from the name when omitted
    #[arg(long, short = 'z', default_value = "")]
    pub zone: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIGURATION / VIEW
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigurationArgs {
    #[command(subcommand)]
    pub command: ConfigurationCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigurationCommand {
    /// Create a configuration
    Create {
        name: String,
        /// Property string (`key=value|...`)
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Show a configuration
    Get { name: String },
    /// Replace a configuration's properties
    Update {
        name: String,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Delete a configuration
    Delete { name: String },
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[command(subcommand)]
    pub command: ViewCommand,
}

#[derive(Debug, Subcommand)]
pub enum ViewCommand {
    /// Create a view in the configuration
    Create {
        name: String,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Show a view
    Get { name: String },
    /// Views cannot be updated; reports the limitation
    Update { name: String },
    /// Delete a view
    Delete { name: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ZONE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ZoneArgs {
    #[command(subcommand)]
    pub command: ZoneCommand,
}

/// Fields shared by zone create and update.
#[derive(Debug, Args)]
pub struct ZoneSpec {
    /// Absolute zone name
    pub fqdn: String,

    /// Mark the zone deployable
    #[arg(long)]
    pub deployable: bool,

    #[arg(long, default_value = "")]
    pub properties: String,

    /// Desired server role, `"ROLE, server_fqdn"` (repeatable)
    #[arg(long = "server-role", short = 'r')]
    pub server_roles: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum ZoneCommand {
    /// Create a zone and apply its server roles
    Create(ZoneSpec),
    /// Show a zone
    Get { fqdn: String },
    /// Update a zone and reconcile its server roles
    Update(ZoneSpec),
    /// Delete a zone
    Delete { fqdn: String },
    /// Deploy a zone to its servers
    Deploy {
        fqdn: String,
        /// Queue the deployment instead of running it now
        #[arg(long)]
        batch: bool,
    },
    /// List a zone's deployment roles
    Roles { fqdn: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BLOCK / NETWORK / RANGE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    pub command: BlockCommand,
}

#[derive(Debug, Subcommand)]
pub enum BlockCommand {
    /// Create a block, optionally inside a parent block
    Create {
        /// Block CIDR
        cidr: String,
        /// Parent block CIDR
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Show a block
    Get { cidr: String },
    /// Update a block's name and properties
    Update {
        cidr: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Delete a block
    Delete { cidr: String },
}

#[derive(Debug, Args)]
pub struct NetworkArgs {
    #[command(subcommand)]
    pub command: NetworkCommand,
}

#[derive(Debug, Subcommand)]
pub enum NetworkCommand {
    /// Create a network with an explicit CIDR
    Create {
        /// Network CIDR
        #[arg(required_unless_present = "from_file")]
        cidr: Option<String>,
        /// Parent block CIDR
        #[arg(long, short = 'b', required_unless_present = "from_file")]
        block: Option<String>,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        gateway: String,
        #[arg(long, default_value = "")]
        template: String,
        /// Caller tag stored with the network
        #[arg(long, default_value = "")]
        allocated_id: String,
        #[arg(long, default_value = "")]
        properties: String,
        /// Read the network fields from a JSON object instead
        #[arg(long, short = 'F', conflicts_with_all = ["cidr", "block"])]
        from_file: Option<PathBuf>,
    },
    /// Allocate the next free network of a given size in a block
    Next {
        /// Parent block CIDR
        #[arg(long, short = 'b')]
        block: String,
        /// Prefix length of the new network
        #[arg(long)]
        size: u32,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        gateway: String,
        #[arg(long, default_value = "")]
        allocated_id: String,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Show a network, by CIDR or by block + allocated id
    Get {
        #[arg(required_unless_present = "allocated_id")]
        cidr: Option<String>,
        #[arg(long, short = 'b', requires = "allocated_id")]
        block: Option<String>,
        #[arg(long, requires = "block")]
        allocated_id: Option<String>,
    },
    /// Update a network's name, gateway, and properties
    Update {
        cidr: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        gateway: String,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Delete a network
    Delete { cidr: String },
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    #[command(subcommand)]
    pub command: RangeCommand,
}

/// Network plus start/end addresses of a DHCP range.
#[derive(Debug, Args)]
pub struct RangeBounds {
    /// Network CIDR
    pub network: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Subcommand)]
pub enum RangeCommand {
    /// Create a DHCP range
    Create {
        #[command(flatten)]
        bounds: RangeBounds,
        #[arg(long, default_value = "")]
        template: String,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Show a DHCP range
    Get {
        #[command(flatten)]
        bounds: RangeBounds,
    },
    /// Update a DHCP range
    Update {
        #[command(flatten)]
        bounds: RangeBounds,
        #[arg(long, default_value = "")]
        template: String,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Delete a DHCP range
    Delete {
        #[command(flatten)]
        bounds: RangeBounds,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  IP ALLOCATION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct IpArgs {
    #[command(subcommand)]
    pub command: IpCommand,
}

/// Caller view of one allocation.
#[derive(Debug, Args)]
pub struct AllocationSpec {
    /// Host name; qualified with --zone when given
    #[arg(long, short = 'n')]
    pub name: String,

    /// Network CIDR the address lives in
    #[arg(long)]
    pub network: String,

    /// Zone for the host record; derived from the name when omitted
    #[arg(long, short = 'z', default_value = "")]
    pub zone: String,

    /// Explicit address; the next free one when omitted
    #[arg(long)]
    pub ip: Option<String>,

    #[arg(long)]
    pub mac: Option<String>,

    /// MAKE_STATIC, MAKE_RESERVED, or MAKE_DHCP_RESERVED
    #[arg(long)]
    pub action: Option<String>,

    #[arg(long, default_value = "")]
    pub properties: String,

    #[arg(long, default_value = "")]
    pub template: String,
}

#[derive(Debug, Subcommand)]
pub enum IpCommand {
    /// Allocate an address and publish its host record
    Allocate(AllocationSpec),
    /// Show an address
    Get { address: String },
    /// Update an existing allocation in place
    Update(AllocationSpec),
    /// Release an allocation (host record when zoned, address otherwise)
    Release {
        address: String,
        #[arg(long, short = 'n', default_value = "")]
        name: String,
        #[arg(long, short = 'z', default_value = "")]
        zone: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DNS RECORDS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct HostArgs {
    #[command(subcommand)]
    pub command: HostCommand,
}

/// Writable fields of a host record.
#[derive(Debug, Args)]
pub struct HostSpec {
    #[command(flatten)]
    pub record: RecordName,

    /// Address (repeatable)
    #[arg(long = "address", short = 'a', required = true)]
    pub addresses: Vec<String>,

    /// TTL in seconds; inherited from the zone when omitted
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub ttl: i64,

    #[arg(long, default_value = "")]
    pub properties: String,
}

#[derive(Debug, Subcommand)]
pub enum HostCommand {
    /// Create a host record
    Create(HostSpec),
    /// Show a host record
    Get(RecordName),
    /// Update a host record
    Update(HostSpec),
    /// Delete a host record
    Delete(RecordName),
    /// Deploy a host record
    Deploy {
        #[command(flatten)]
        record: RecordName,
        #[arg(long)]
        batch: bool,
    },
}

#[derive(Debug, Args)]
pub struct CnameArgs {
    #[command(subcommand)]
    pub command: CnameCommand,
}

#[derive(Debug, Subcommand)]
pub enum CnameCommand {
    /// Create a CNAME record
    Create {
        #[command(flatten)]
        record: RecordName,
        /// Target name
        #[arg(long)]
        linked_record: String,
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        ttl: i64,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Show a CNAME record
    Get(RecordName),
    /// Delete a CNAME record
    Delete(RecordName),
}

#[derive(Debug, Args)]
pub struct TxtArgs {
    #[command(subcommand)]
    pub command: TxtCommand,
}

#[derive(Debug, Subcommand)]
pub enum TxtCommand {
    /// Create a TXT record
    Create {
        #[command(flatten)]
        record: RecordName,
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        ttl: i64,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Show a TXT record
    Get(RecordName),
    /// Delete a TXT record
    Delete(RecordName),
}

#[derive(Debug, Args)]
pub struct SrvArgs {
    #[command(subcommand)]
    pub command: SrvCommand,
}

#[derive(Debug, Subcommand)]
pub enum SrvCommand {
    /// Create an SRV record
    Create {
        #[command(flatten)]
        record: RecordName,
        /// Target host
        #[arg(long)]
        linked_record: String,
        #[arg(long)]
        port: u16,
        #[arg(long, default_value_t = 0)]
        priority: u16,
        #[arg(long, default_value_t = 0)]
        weight: u16,
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        ttl: i64,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Show an SRV record
    Get(RecordName),
    /// Delete an SRV record
    Delete(RecordName),
}

#[derive(Debug, Args)]
pub struct GenericArgs {
    #[command(subcommand)]
    pub command: GenericCommand,
}

#[derive(Debug, Subcommand)]
pub enum GenericCommand {
    /// Create a generic record
    Create {
        #[command(flatten)]
        record: RecordName,
        /// Record type, e.g. `MX` or `NAPTR`
        #[arg(long = "type")]
        record_type: String,
        /// Raw record data
        #[arg(long)]
        data: String,
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        ttl: i64,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Show a generic record
    Get(RecordName),
    /// Delete a generic record
    Delete(RecordName),
}

#[derive(Debug, Args)]
pub struct ExternalHostArgs {
    #[command(subcommand)]
    pub command: ExternalHostCommand,
}

#[derive(Debug, Subcommand)]
pub enum ExternalHostCommand {
    /// Create an external host record
    Create {
        #[command(flatten)]
        record: RecordName,
        #[arg(long = "address", short = 'a')]
        addresses: Vec<String>,
        #[arg(long, default_value = "")]
        properties: String,
    },
    /// Show an external host record
    Get(RecordName),
    /// Delete an external host record
    Delete(RecordName),
}

#[derive(Debug, Args)]
pub struct PtrArgs {
    #[command(subcommand)]
    pub command: PtrCommand,
}

#[derive(Debug, Subcommand)]
pub enum PtrCommand {
    /// Set the PTR flag of an existing host record
    Set {
        /// Fully qualified host name
        fqdn: String,
        /// yes/true/1 or no/false/0
        #[arg(long, default_value = "true")]
        value: String,
    },
    /// Clear the PTR flag; the host record stays
    Clear { fqdn: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a field on the active profile
    Set {
        /// Profile field, e.g. `host`, `port`, `configuration`, `view`
        key: String,
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's password in the system keyring
    SetPassword,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
