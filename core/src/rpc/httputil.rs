// Helpers shared by HTTP front ends

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpUtilError {
    #[error("Invalid boolean query value: {0}")]
    InvalidBool(String),

    #[error("Invalid RPC address: {0}")]
    InvalidAddr(String),
}

/// Parse a boolean query value. A missing or empty value yields `default`.
pub fn bool_from_query(value: Option<&str>, default: bool) -> Result<bool, HttpUtilError> {
    match value.unwrap_or("") {
        "" => Ok(default),
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        other => Err(HttpUtilError::InvalidBool(other.to_string())),
    }
}

/// First value of `key` in a raw query string
pub fn query_param<'a>(query: Option<&'a str>, key: &str) -> Option<&'a str> {
    query?
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Split `host:port` into its parts
pub fn split_rpc_addr(addr: &str) -> Result<(String, u16), HttpUtilError> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| HttpUtilError::InvalidAddr(addr.to_string()))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| HttpUtilError::InvalidAddr(addr.to_string()))?;
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_from_query() {
        assert_eq!(bool_from_query(None, true), Ok(true));
        assert_eq!(bool_from_query(Some(""), false), Ok(false));
        assert_eq!(bool_from_query(Some("on"), false), Ok(true));
        assert_eq!(bool_from_query(Some("1"), false), Ok(true));
        assert_eq!(bool_from_query(Some("off"), true), Ok(false));
        assert_eq!(bool_from_query(Some("0"), true), Ok(false));
        assert!(bool_from_query(Some("maybe"), true).is_err());
    }

    #[test]
    fn test_query_param() {
        let q = Some("pretty=on&x=1&flag");
        assert_eq!(query_param(q, "pretty"), Some("on"));
        assert_eq!(query_param(q, "x"), Some("1"));
        assert_eq!(query_param(q, "flag"), Some(""));
        assert_eq!(query_param(q, "missing"), None);
        assert_eq!(query_param(None, "pretty"), None);
    }

    #[test]
    fn test_split_rpc_addr() {
        assert_eq!(
            split_rpc_addr("localhost:3435"),
            Ok(("localhost".to_string(), 3435))
        );
        assert!(split_rpc_addr("localhost").is_err());
        assert!(split_rpc_addr("localhost:http").is_err());
    }
}
