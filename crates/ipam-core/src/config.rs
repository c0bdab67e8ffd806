// ── Runtime connection configuration ──
//
// Describes *how* to reach an appliance: host, credentials, TLS, timeout.
// Never touches disk; the CLI (via ipam-config) builds one and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use ipam_api::{Credentials, HostConfig, TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed appliances).
    DangerAcceptInvalid,
}

/// Everything needed to open a session against one appliance.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: HostConfig,
    pub credentials: Credentials,
    pub tls: TlsVerification,
    /// Per-request deadline.
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(host: HostConfig, credentials: Credentials) -> Self {
        Self {
            host,
            credentials,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Transport settings for the connector's single client.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            cookie_jar: None,
        }
        .with_cookie_jar()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipam_api::Scheme;
    use secrecy::SecretString;

    #[test]
    fn transport_carries_timeout_and_jar() {
        let mut config = ConnectionConfig::new(
            HostConfig::new(Scheme::Https, "bam.local", 443),
            Credentials::new("admin", SecretString::from("pw".to_owned())),
        );
        config.timeout = Duration::from_secs(5);
        config.tls = TlsVerification::DangerAcceptInvalid;

        let transport = config.transport();
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert!(transport.cookie_jar.is_some());
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
    }
}
