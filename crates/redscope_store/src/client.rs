//! Redis-backed [`KeyStore`] implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::types::{KeyValue, ValueKind};
use crate::KeyStore;

/// How many keys one SCAN page asks the server for.
const SCAN_PAGE_SIZE: usize = 100;

const DEFAULT_PORT: u16 = 6379;

/// Connection settings for the Redis server, from the `[redis]` config table.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// `host:port`; the port defaults to 6379 when omitted.
    pub server: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub db: i64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_response_timeout_secs() -> u64 {
    5
}

fn default_max_retries() -> usize {
    3
}

impl RedisConfig {
    fn connection_info(&self) -> ConnectionInfo {
        let (host, port) = match self.server.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (self.server.clone(), DEFAULT_PORT),
            },
            None => (self.server.clone(), DEFAULT_PORT),
        };
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(host, port),
            redis: RedisConnectionInfo {
                db: self.db,
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

/// Shared read-only Redis handle.
///
/// Cheap to clone; every clone multiplexes over the same managed
/// connection, so all workers and the detail fetcher share one socket.
#[derive(Clone)]
pub struct StoreClient {
    conn: ConnectionManager,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl StoreClient {
    /// Connect and verify the server answers PING before anything else runs.
    pub async fn connect(cfg: &RedisConfig) -> Result<Self, StoreError> {
        info!(server = %cfg.server, db = cfg.db, "connecting to redis");

        let client = redis::Client::open(cfg.connection_info()).map_err(StoreError::Connect)?;
        let manager_cfg = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .set_response_timeout(Duration::from_secs(cfg.response_timeout_secs))
            .set_number_of_retries(cfg.max_retries);
        let mut conn = ConnectionManager::new_with_config(client, manager_cfg)
            .await
            .map_err(StoreError::Connect)?;

        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(StoreError::Connect)?;
        if reply != "PONG" {
            return Err(StoreError::Connect(redis::RedisError::from((
                redis::ErrorKind::ResponseError,
                "unexpected PING reply",
            ))));
        }

        debug!("redis connection verified");
        Ok(Self { conn })
    }
}

/// Map a WRONGTYPE reply onto the mismatch variant; everything else stays a
/// command failure. The code is carried differently depending on how the
/// error was surfaced, so both the parsed code and the text are checked.
fn classify(key: &str, kind: ValueKind, err: redis::RedisError) -> StoreError {
    if err.code() == Some("WRONGTYPE") || err.to_string().contains("WRONGTYPE") {
        StoreError::WrongKind {
            key: key.to_string(),
            declared: kind,
        }
    } else {
        StoreError::Command(err)
    }
}

impl KeyStore for StoreClient {
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, page): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_PAGE_SIZE)
                .query_async(&mut conn)
                .await?;
            keys.extend(page);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(keys)
    }

    async fn fetch(&self, key: &str, kind: ValueKind) -> Result<KeyValue, StoreError> {
        let mut conn = self.conn.clone();
        match kind {
            ValueKind::Scalar => {
                let value: Option<String> = conn
                    .get(key)
                    .await
                    .map_err(|err| classify(key, kind, err))?;
                match value {
                    Some(value) => Ok(KeyValue::Scalar(value)),
                    None => Err(StoreError::Missing {
                        key: key.to_string(),
                    }),
                }
            }
            ValueKind::List => {
                let items: Vec<String> = conn
                    .lrange(key, 0, -1)
                    .await
                    .map_err(|err| classify(key, kind, err))?;
                Ok(KeyValue::List(items))
            }
            ValueKind::Set => {
                // SMEMBERS order is unspecified; sort for stable rendering.
                let mut members: Vec<String> = conn
                    .smembers(key)
                    .await
                    .map_err(|err| classify(key, kind, err))?;
                members.sort();
                Ok(KeyValue::Set(members))
            }
            ValueKind::SortedSet => {
                let members: Vec<(String, f64)> = conn
                    .zrange_withscores(key, 0, -1)
                    .await
                    .map_err(|err| classify(key, kind, err))?;
                Ok(KeyValue::SortedSet(members))
            }
            ValueKind::Hash => {
                let fields: BTreeMap<String, String> = conn
                    .hgetall(key)
                    .await
                    .map_err(|err| classify(key, kind, err))?;
                Ok(KeyValue::Hash(fields))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(server: &str) -> RedisConfig {
        RedisConfig {
            server: server.to_string(),
            password: None,
            db: 0,
            connect_timeout_secs: 5,
            response_timeout_secs: 5,
            max_retries: 3,
        }
    }

    #[test]
    fn server_port_defaults_when_omitted() {
        let info = config("cache.internal").connection_info();
        match info.addr {
            ConnectionAddr::Tcp(host, port) => {
                assert_eq!(host, "cache.internal");
                assert_eq!(port, DEFAULT_PORT);
            }
            other => panic!("unexpected addr: {other:?}"),
        }
    }

    #[test]
    fn server_port_is_parsed() {
        let info = config("127.0.0.1:7000").connection_info();
        match info.addr {
            ConnectionAddr::Tcp(host, port) => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 7000);
            }
            other => panic!("unexpected addr: {other:?}"),
        }
    }

    #[test]
    fn wrongtype_reply_classifies_as_mismatch() {
        let err = redis::RedisError::from((
            redis::ErrorKind::ResponseError,
            "WRONGTYPE",
            "Operation against a key holding the wrong kind of value".to_string(),
        ));
        // The classifier keys off the server code, not the error kind.
        let classified = classify("user:1", ValueKind::Hash, err);
        assert!(classified.is_shape_mismatch());
    }

    #[test]
    fn io_errors_stay_command_failures() {
        let err = redis::RedisError::from((redis::ErrorKind::IoError, "broken pipe"));
        let classified = classify("user:1", ValueKind::Hash, err);
        assert!(!classified.is_shape_mismatch());
    }
}
