//! Server configuration.
//!
//! Every option is a `serve` flag with an environment fallback, so a `.env`
//! file (loaded by `dotenvy`) is enough to configure a deployment.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;

use crate::mail::MailConfig;
use crate::store::DEFAULT_STORAGE_DIR;

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(long, env = "FAIRFUND_ADDRESS", default_value = "127.0.0.1")]
    pub address: String,

    /// Port to listen on
    #[arg(short, long, env = "FAIRFUND_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory holding applications, reviews and uploads
    #[arg(long, env = "FAIRFUND_STORAGE", default_value = DEFAULT_STORAGE_DIR)]
    pub storage: PathBuf,

    /// Let search engines index the site
    #[arg(long, env = "FAIRFUND_ALLOW_CRAWLERS")]
    pub allow_crawlers: bool,

    /// Answer every API route with 503
    #[arg(long, env = "FAIRFUND_MAINTENANCE")]
    pub maintenance: bool,

    #[command(flatten)]
    pub mail: MailConfig,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.address, self.port).parse()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
            storage: PathBuf::from(DEFAULT_STORAGE_DIR),
            allow_crawlers: false,
            maintenance: false,
            mail: MailConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ServerConfig,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from(["fairfund", "--port", "9000", "--storage", "/tmp/ff", "--maintenance"]);
        assert_eq!(cli.config.port, 9000);
        assert_eq!(cli.config.storage, PathBuf::from("/tmp/ff"));
        assert!(cli.config.maintenance);
        assert!(!cli.config.allow_crawlers);
        assert_eq!(cli.config.mail.smtp_host, None);
    }

    #[test]
    fn test_smtp_flags() {
        let cli = TestCli::parse_from([
            "fairfund",
            "--smtp-host",
            "mail.example.org",
            "--smtp-from",
            "fund@example.org",
            "--smtp-starttls",
        ]);
        assert_eq!(cli.config.mail.smtp_host.as_deref(), Some("mail.example.org"));
        assert_eq!(cli.config.mail.smtp_port, 587);
        assert!(cli.config.mail.smtp_starttls);
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }
}
