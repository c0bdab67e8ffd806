//! CLI configuration: thin wrapper around `ipam_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --username, --configuration, ...).

use std::time::Duration;

use ipam_core::{ConnectionConfig, Scheme};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use ipam_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── Scope ───────────────────────────────────────────────────────────

/// Configuration and view a command works in.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    configuration: Option<String>,
    view: Option<String>,
}

impl Scope {
    pub fn configuration(&self) -> Result<&str, CliError> {
        self.configuration.as_deref().ok_or_else(|| CliError::Validation {
            field: "configuration".into(),
            reason: "pass --configuration (-C) or set `configuration` in the profile".into(),
        })
    }

    pub fn view(&self) -> Result<&str, CliError> {
        self.view.as_deref().ok_or_else(|| CliError::Validation {
            field: "view".into(),
            reason: "pass --view or set `view` in the profile".into(),
        })
    }

    /// Configuration plus view, for DNS commands.
    pub fn dns(&self) -> Result<(&str, &str), CliError> {
        Ok((self.configuration()?, self.view()?))
    }
}

// ── Resolution ──────────────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Apply flag overrides on top of a profile.
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if global.http {
        profile.transport = Scheme::Http;
    }
    if global.username.is_some() {
        profile.username.clone_from(&global.username);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.configuration.is_some() {
        profile.configuration.clone_from(&global.configuration);
    }
    if global.view.is_some() {
        profile.view.clone_from(&global.view);
    }
}

/// Pick the profile to connect with.
///
/// Without a stored profile, `--host` alone is enough to build one.
fn select_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    if let Some(profile) = config.profiles.get(&name) {
        return Ok((name, profile.clone()));
    }
    if let Some(ref host) = global.host {
        return Ok((name, Profile::new(host.clone())));
    }
    if global.profile.is_some() {
        let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name,
            available: available.join(", "),
        });
    }
    Err(CliError::NoConfig {
        path: config_path().display().to_string(),
    })
}

/// Translate config file + global flags into a connection and a scope.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<(ConnectionConfig, Scope), CliError> {
    let (name, mut profile) = select_profile(global, config)?;
    apply_overrides(&mut profile, global);

    let mut connection =
        ipam_config::profile_to_connection_config(&profile, &name, &config.defaults)?;
    connection.timeout = Duration::from_secs(global.timeout);

    let scope = Scope {
        configuration: profile.configuration,
        view: profile.view,
    };
    Ok((connection, scope))
}
