use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Contact URI placed in the VAPID `sub` claim (e.g., "mailto:ops@example.com").
    pub vapid_subject: String,
    /// Seconds a push service may hold an undelivered message.
    pub push_ttl: u32,
    /// Upper bound for a single delivery attempt during a broadcast.
    pub delivery_timeout: Duration,
}

impl ServerConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("herald.db")
    }

    #[must_use]
    pub fn vapid_path(&self) -> PathBuf {
        self.data_dir.join("vapid.json")
    }

    #[must_use]
    pub fn admin_token_path(&self) -> PathBuf {
        self.data_dir.join(".admin_token")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            vapid_subject: "mailto:newsroom@localhost".to_string(),
            push_ttl: 86_400,
            delivery_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rooted_at_data_dir() {
        let config = ServerConfig::with_data_dir("/srv/herald");
        assert_eq!(config.db_path(), PathBuf::from("/srv/herald/herald.db"));
        assert_eq!(config.vapid_path(), PathBuf::from("/srv/herald/vapid.json"));
        assert_eq!(config.admin_token_path(), PathBuf::from("/srv/herald/.admin_token"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");

        let bad = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(bad.socket_addr().is_err());
    }
}
