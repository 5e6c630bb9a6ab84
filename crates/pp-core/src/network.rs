//! Caller network identity, the key used for abuse blocking.
//!
//! This is whatever address the request claims to come from. A caller who
//! controls `X-Forwarded-For` or rotates addresses can step around a block;
//! it is a deterrent, not an authentication boundary.

use serde::{Deserialize, Serialize};

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkIdentity(String);

impl NetworkIdentity {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::unknown()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN.to_string())
    }

    /// First entry of a forwarded-for header, else the peer address, else "unknown".
    pub fn from_request_parts(forwarded_for: Option<&str>, peer_addr: Option<&str>) -> Self {
        let forwarded = forwarded_for
            .and_then(|header| header.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty());

        match forwarded.or(peer_addr.map(str::trim).filter(|p| !p.is_empty())) {
            Some(addr) => Self(addr.to_string()),
            None => Self::unknown(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key: `.` and `:` become `_` (`1.2.3.4` -> `1_2_3_4`).
    pub fn block_key(&self) -> String {
        self.0.replace(['.', ':'], "_")
    }
}

impl std::fmt::Display for NetworkIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
