//! Connection parameters for [`RespEngine`](crate::RespEngine).

use serde::Deserialize;

/// Where and how to reach the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectParams {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Sent with `AUTH` after connecting, if set.
    pub password: Option<String>,
    /// Selected with `SELECT` after connecting, if non-zero.
    pub db: u32,
}

impl ConnectParams {
    /// Parameters for `host:port` with no password and database 0.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ConnectParams {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Sets the password sent with `AUTH`.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the database selected after connecting.
    pub fn with_db(mut self, db: u32) -> Self {
        self.db = db;
        self
    }
}

impl Default for ConnectParams {
    fn default() -> Self {
        ConnectParams {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            db: 0,
        }
    }
}

impl std::fmt::Display for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let params: ConnectParams = serde_json::from_str(r#"{ "port": 6380 }"#).unwrap();
        assert_eq!(params, ConnectParams::new("127.0.0.1", 6380));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(serde_json::from_str::<ConnectParams>(r#"{ "hots": "x" }"#).is_err());
    }

    #[test]
    fn displays_address() {
        let params = ConnectParams::new("cache.local", 7000).with_db(3);
        assert_eq!(params.to_string(), "cache.local:7000");
        assert_eq!(params.db, 3);
    }
}
