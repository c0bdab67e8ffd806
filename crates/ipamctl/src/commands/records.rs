//! DNS record command handlers: host, CNAME, TXT, SRV, generic, external
//! host, and the PTR toggle.

use ipam_core::{
    CnameRecord, ExternalHostRecord, GenericRecord, HostRecord, ObjectManager, SrvRecord,
    TxtRecord, absolute_name,
};
use serde::Serialize;

use crate::cli::{
    CnameArgs, CnameCommand, ExternalHostArgs, ExternalHostCommand, GenericArgs, GenericCommand,
    GlobalOpts, HostArgs, HostCommand, HostSpec, PtrArgs, PtrCommand, RecordName, SrvArgs,
    SrvCommand, TxtArgs, TxtCommand,
};
use crate::config::Scope;
use crate::error::CliError;
use crate::output;

use super::util;

impl RecordName {
    /// Absolute name: the zone is appended unless already present.
    fn fqdn(&self) -> String {
        absolute_name(&self.name, &self.zone)
    }
}

fn ttl_text(ttl: i64) -> String {
    if ttl < 0 {
        "inherited".into()
    } else {
        ttl.to_string()
    }
}

fn print_record<T: Serialize>(
    record: &T,
    fqdn: &str,
    detail: impl Fn(&T) -> String,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = output::render_single(&global.output, record, detail, |_| fqdn.to_owned())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Confirm, delete, and report one record.
async fn delete_record<F>(kind: &str, fqdn: &str, global: &GlobalOpts, delete: F) -> Result<(), CliError>
where
    F: std::future::Future<Output = Result<(), ipam_core::CoreError>>,
{
    if !util::confirm(&format!("Delete {kind} {fqdn}?"), global.yes)? {
        return Ok(());
    }
    delete.await?;
    output::status(&format!("{kind} {fqdn} deleted"), global.quiet);
    Ok(())
}

// ── Host records ────────────────────────────────────────────────────

fn host_detail(h: &HostRecord) -> String {
    output::detail_lines(&[
        ("FQDN", h.fqdn()),
        ("Addresses", h.address_list().join(", ")),
        ("TTL", ttl_text(h.effective_ttl())),
        ("Zone", h.zone.clone()),
        ("Properties", h.properties.clone()),
    ])
}

fn host_record(spec: HostSpec, cfg: &str, view: &str) -> HostRecord {
    let mut record = HostRecord::new(cfg, view, &spec.record.zone, &spec.record.fqdn());
    record.addresses = spec.addresses.join(",");
    record.ttl = spec.ttl;
    record.properties = spec.properties;
    record
}

pub async fn handle_host(
    manager: &ObjectManager,
    args: HostArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (cfg, view) = scope.dns()?;
    match args.command {
        HostCommand::Create(spec) => {
            let created = manager.create_host_record(&host_record(spec, cfg, view)).await?;
            print_record(&created, &created.fqdn(), host_detail, global)
        }

        HostCommand::Get(record) => {
            let fqdn = record.fqdn();
            let found = manager.get_host_record(cfg, view, &record.zone, &fqdn).await?;
            print_record(&found, &fqdn, host_detail, global)
        }

        HostCommand::Update(spec) => {
            let updated = manager.update_host_record(&host_record(spec, cfg, view)).await?;
            print_record(&updated, &updated.fqdn(), host_detail, global)
        }

        HostCommand::Delete(record) => {
            let fqdn = record.fqdn();
            let delete = manager.delete_host_record(cfg, view, &record.zone, &fqdn);
            delete_record("host record", &fqdn, global, delete).await
        }

        HostCommand::Deploy { record, batch } => {
            let fqdn = record.fqdn();
            let reply = manager
                .deploy_host_record(cfg, view, &record.zone, &fqdn, batch)
                .await?;
            output::status(&format!("host record {fqdn} deployment requested"), global.quiet);
            output::print_output(&reply, global.quiet);
            Ok(())
        }
    }
}

// ── CNAME records ───────────────────────────────────────────────────

fn cname_detail(c: &CnameRecord) -> String {
    output::detail_lines(&[
        ("FQDN", c.fqdn()),
        ("Target", c.linked_record.clone()),
        ("TTL", ttl_text(c.effective_ttl())),
        ("Properties", c.properties.clone()),
    ])
}

pub async fn handle_cname(
    manager: &ObjectManager,
    args: CnameArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (cfg, view) = scope.dns()?;
    match args.command {
        CnameCommand::Create {
            record,
            linked_record,
            ttl,
            properties,
        } => {
            let fqdn = record.fqdn();
            let mut desired = CnameRecord::new(cfg, view, &record.zone, &fqdn);
            desired.linked_record = linked_record;
            desired.ttl = ttl;
            desired.properties = properties;
            let created = manager.create_cname_record(&desired).await?;
            print_record(&created, &fqdn, cname_detail, global)
        }
        CnameCommand::Get(record) => {
            let fqdn = record.fqdn();
            let found = manager.get_cname_record(cfg, view, &record.zone, &fqdn).await?;
            print_record(&found, &fqdn, cname_detail, global)
        }
        CnameCommand::Delete(record) => {
            let fqdn = record.fqdn();
            let delete = manager.delete_cname_record(cfg, view, &record.zone, &fqdn);
            delete_record("CNAME record", &fqdn, global, delete).await
        }
    }
}

// ── TXT records ─────────────────────────────────────────────────────

fn txt_detail(t: &TxtRecord) -> String {
    output::detail_lines(&[
        ("FQDN", t.fqdn()),
        ("Text", t.text.clone()),
        ("TTL", ttl_text(t.effective_ttl())),
        ("Properties", t.properties.clone()),
    ])
}

pub async fn handle_txt(
    manager: &ObjectManager,
    args: TxtArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (cfg, view) = scope.dns()?;
    match args.command {
        TxtCommand::Create {
            record,
            text,
            ttl,
            properties,
        } => {
            let fqdn = record.fqdn();
            let mut desired = TxtRecord::new(cfg, view, &record.zone, &fqdn);
            desired.text = text;
            desired.ttl = ttl;
            desired.properties = properties;
            let created = manager.create_txt_record(&desired).await?;
            print_record(&created, &fqdn, txt_detail, global)
        }
        TxtCommand::Get(record) => {
            let fqdn = record.fqdn();
            let found = manager.get_txt_record(cfg, view, &record.zone, &fqdn).await?;
            print_record(&found, &fqdn, txt_detail, global)
        }
        TxtCommand::Delete(record) => {
            let fqdn = record.fqdn();
            let delete = manager.delete_txt_record(cfg, view, &record.zone, &fqdn);
            delete_record("TXT record", &fqdn, global, delete).await
        }
    }
}

// ── SRV records ─────────────────────────────────────────────────────

fn srv_detail(s: &SrvRecord) -> String {
    output::detail_lines(&[
        ("FQDN", s.fqdn()),
        ("Target", s.linked_record.clone()),
        ("Port", s.port.to_string()),
        ("Priority", s.priority.to_string()),
        ("Weight", s.weight.to_string()),
        ("TTL", ttl_text(s.effective_ttl())),
        ("Properties", s.properties.clone()),
    ])
}

pub async fn handle_srv(
    manager: &ObjectManager,
    args: SrvArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (cfg, view) = scope.dns()?;
    match args.command {
        SrvCommand::Create {
            record,
            linked_record,
            port,
            priority,
            weight,
            ttl,
            properties,
        } => {
            let fqdn = record.fqdn();
            let mut desired = SrvRecord::new(cfg, view, &record.zone, &fqdn);
            desired.linked_record = linked_record;
            desired.port = port;
            desired.priority = priority;
            desired.weight = weight;
            desired.ttl = ttl;
            desired.properties = properties;
            let created = manager.create_srv_record(&desired).await?;
            print_record(&created, &fqdn, srv_detail, global)
        }
        SrvCommand::Get(record) => {
            let fqdn = record.fqdn();
            let found = manager.get_srv_record(cfg, view, &record.zone, &fqdn).await?;
            print_record(&found, &fqdn, srv_detail, global)
        }
        SrvCommand::Delete(record) => {
            let fqdn = record.fqdn();
            let delete = manager.delete_srv_record(cfg, view, &record.zone, &fqdn);
            delete_record("SRV record", &fqdn, global, delete).await
        }
    }
}

// ── Generic records ─────────────────────────────────────────────────

fn generic_detail(g: &GenericRecord) -> String {
    output::detail_lines(&[
        ("FQDN", g.fqdn()),
        ("Type", g.record_type.clone()),
        ("Data", g.data.clone()),
        ("TTL", ttl_text(g.effective_ttl())),
        ("Properties", g.properties.clone()),
    ])
}

pub async fn handle_generic(
    manager: &ObjectManager,
    args: GenericArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (cfg, view) = scope.dns()?;
    match args.command {
        GenericCommand::Create {
            record,
            record_type,
            data,
            ttl,
            properties,
        } => {
            let fqdn = record.fqdn();
            let mut desired = GenericRecord::new(cfg, view, &record.zone, &fqdn);
            desired.record_type = record_type.to_ascii_uppercase();
            desired.data = data;
            desired.ttl = ttl;
            desired.properties = properties;
            let created = manager.create_generic_record(&desired).await?;
            print_record(&created, &fqdn, generic_detail, global)
        }
        GenericCommand::Get(record) => {
            let fqdn = record.fqdn();
            let found = manager.get_generic_record(cfg, view, &record.zone, &fqdn).await?;
            print_record(&found, &fqdn, generic_detail, global)
        }
        GenericCommand::Delete(record) => {
            let fqdn = record.fqdn();
            let delete = manager.delete_generic_record(cfg, view, &record.zone, &fqdn);
            delete_record("generic record", &fqdn, global, delete).await
        }
    }
}

// ── External host records ───────────────────────────────────────────

fn external_host_detail(e: &ExternalHostRecord) -> String {
    output::detail_lines(&[
        ("FQDN", e.fqdn()),
        ("Addresses", e.addresses.clone()),
        ("Properties", e.properties.clone()),
    ])
}

pub async fn handle_external_host(
    manager: &ObjectManager,
    args: ExternalHostArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (cfg, view) = scope.dns()?;
    match args.command {
        ExternalHostCommand::Create {
            record,
            addresses,
            properties,
        } => {
            let fqdn = record.fqdn();
            let mut desired = ExternalHostRecord::new(cfg, view, &record.zone, &fqdn);
            desired.addresses = addresses.join(",");
            desired.properties = properties;
            let created = manager.create_external_host_record(&desired).await?;
            print_record(&created, &fqdn, external_host_detail, global)
        }
        ExternalHostCommand::Get(record) => {
            let fqdn = record.fqdn();
            let found = manager
                .get_external_host_record(cfg, view, &record.zone, &fqdn)
                .await?;
            print_record(&found, &fqdn, external_host_detail, global)
        }
        ExternalHostCommand::Delete(record) => {
            let fqdn = record.fqdn();
            let delete = manager.delete_external_host_record(cfg, view, &record.zone, &fqdn);
            delete_record("external host record", &fqdn, global, delete).await
        }
    }
}

// ── PTR ─────────────────────────────────────────────────────────────

pub async fn handle_ptr(
    manager: &ObjectManager,
    args: PtrArgs,
    scope: &Scope,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (cfg, view) = scope.dns()?;
    let cancel = util::cancel_on_interrupt();
    let (fqdn, record) = match args.command {
        PtrCommand::Set { fqdn, value } => {
            let record = manager.set_ptr(cfg, view, &fqdn, &value, &cancel).await?;
            (fqdn, record)
        }
        PtrCommand::Clear { fqdn } => {
            let record = manager.clear_ptr(cfg, view, &fqdn, &cancel).await?;
            (fqdn, record)
        }
    };
    print_record(&record, &fqdn, host_detail, global)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_names_are_qualified_once() {
        let short = RecordName {
            name: "www".into(),
            zone: "example.com".into(),
        };
        assert_eq!(short.fqdn(), "www.example.com");

        let full = RecordName {
            name: "www.example.com".into(),
            zone: "example.com".into(),
        };
        assert_eq!(full.fqdn(), "www.example.com");
    }

    #[test]
    fn negative_ttl_reads_as_inherited() {
        assert_eq!(ttl_text(-1), "inherited");
        assert_eq!(ttl_text(300), "300");
    }

    #[test]
    fn host_record_joins_addresses() {
        let spec = HostSpec {
            record: RecordName {
                name: "a".into(),
                zone: "example.com".into(),
            },
            addresses: vec!["10.0.0.5".into(), "10.0.0.6".into()],
            ttl: 300,
            properties: String::new(),
        };
        let record = host_record(spec, "Lab", "default");
        assert_eq!(record.fqdn(), "a.example.com");
        assert_eq!(record.addresses, "10.0.0.5,10.0.0.6");
        assert_eq!(record.ttl, 300);
        assert_eq!(record.zone, "example.com");
    }
}
