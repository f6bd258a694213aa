use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub id: i32,
    pub host: String,
    pub port: u16,
}

impl ServerInfo {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Abd,
    Blocking,
}

// Immutable after load. JSON on disk: a servers array, the protocol
// discriminator, the two quorum sizes, and an optional num_replicas check.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    pub servers: Vec<ServerInfo>,
    pub protocol: Protocol,
    pub read_quorum: usize,
    pub write_quorum: usize,
    #[serde(default)]
    pub num_replicas: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no servers configured")]
    NoServers,
    #[error("duplicate server id {0}")]
    DuplicateServerId(i32),
    #[error("invalid quorum sizes: read={read}, write={write}, servers={servers}")]
    InvalidQuorum {
        read: usize,
        write: usize,
        servers: usize,
    },
}

impl ClusterConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError::NoServers);
        }
        let mut seen = HashSet::new();
        for server in &self.servers {
            if !seen.insert(server.id) {
                return Err(ConfigError::DuplicateServerId(server.id));
            }
        }
        let n = self.servers.len();
        if self.read_quorum == 0
            || self.write_quorum == 0
            || self.read_quorum > n
            || self.write_quorum > n
        {
            return Err(ConfigError::InvalidQuorum {
                read: self.read_quorum,
                write: self.write_quorum,
                servers: n,
            });
        }
        if let Some(expected) = self.num_replicas {
            if expected != n {
                warn!(expected, actual = n, "num_replicas does not match the server list");
            }
        }
        // R + W > N is what forces every read quorum to overlap every write
        // quorum; smaller sizes are accepted but flagged.
        if self.read_quorum + self.write_quorum <= n {
            warn!(
                read = self.read_quorum,
                write = self.write_quorum,
                servers = n,
                "quorum sizes do not guarantee overlap"
            );
        }
        Ok(())
    }

    pub fn server(&self, id: i32) -> Option<&ServerInfo> {
        self.servers.iter().find(|server| server.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "servers": [
            {"id": 0, "host": "localhost", "port": 5001},
            {"id": 1, "host": "localhost", "port": 5002},
            {"id": 2, "host": "localhost", "port": 5003}
        ],
        "protocol": "abd",
        "read_quorum": 2,
        "write_quorum": 2,
        "num_replicas": 3
    }"#;

    #[test]
    fn parses_the_json_format() {
        let config: ClusterConfig = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.servers.len(), 3);
        assert_eq!(config.protocol, Protocol::Abd);
        assert_eq!(config.read_quorum, 2);
        assert_eq!(config.write_quorum, 2);
        assert_eq!(config.server(1).unwrap().address(), "localhost:5002");
        config.validate().unwrap();
    }

    #[test]
    fn parses_the_blocking_discriminator() {
        let raw = SAMPLE.replace("\"abd\"", "\"blocking\"");
        let config: ClusterConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(config.protocol, Protocol::Blocking);
    }

    #[test]
    fn rejects_an_empty_server_list() {
        let config = ClusterConfig {
            servers: vec![],
            protocol: Protocol::Abd,
            read_quorum: 1,
            write_quorum: 1,
            num_replicas: None,
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoServers)));
    }

    #[test]
    fn rejects_duplicate_server_ids() {
        let mut config: ClusterConfig = serde_json::from_str(SAMPLE).unwrap();
        config.servers[2].id = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateServerId(0))
        ));
    }

    #[test]
    fn rejects_degenerate_quorums() {
        let mut config: ClusterConfig = serde_json::from_str(SAMPLE).unwrap();
        config.read_quorum = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidQuorum { .. })
        ));

        let mut config: ClusterConfig = serde_json::from_str(SAMPLE).unwrap();
        config.write_quorum = 4;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidQuorum { .. })
        ));
    }
}
