//! Strongly-typed identifiers used across the domain.
//!
//! A [`CompanyId`] is a 12-byte, roughly time-ordered identifier rendered as
//! 24 lowercase hex characters:
//!
//! | bytes  | content                                   |
//! |--------|-------------------------------------------|
//! | 0..4   | creation time, unix seconds (big endian)  |
//! | 4..9   | random value fixed for the process        |
//! | 9..12  | counter, randomly seeded (big endian)     |
//!
//! Ids minted by one process never collide; ids minted by different processes
//! collide only if both the process value and the counter coincide within the
//! same second.

use core::fmt;
use core::str::FromStr;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::DomainError;

const ID_LEN: usize = 12;

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(|| {
    let b = *Uuid::new_v4().as_bytes();
    [b[0], b[1], b[2], b[3], b[4]]
});

static COUNTER: LazyLock<AtomicU32> = LazyLock::new(|| {
    let b = *Uuid::new_v4().as_bytes();
    AtomicU32::new(u32::from_be_bytes([0, b[0], b[1], b[2]]))
});

/// Identifier of a company record. Assigned by the server, never by clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompanyId([u8; ID_LEN]);

impl CompanyId {
    /// Mint a fresh identifier stamped with the current time.
    pub fn new() -> Self {
        Self::with_timestamp(Utc::now())
    }

    /// Mint a fresh identifier stamped with `at` (second precision).
    pub fn with_timestamp(at: DateTime<Utc>) -> Self {
        let secs = (at.timestamp() as u32).to_be_bytes();
        let count = COUNTER.fetch_add(1, Ordering::Relaxed).to_be_bytes();
        let unique = *PROCESS_UNIQUE;

        let mut bytes = [0u8; ID_LEN];
        bytes[0..4].copy_from_slice(&secs);
        bytes[4..9].copy_from_slice(&unique);
        // Only the low 24 bits of the counter are kept.
        bytes[9..12].copy_from_slice(&count[1..4]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// The creation second encoded in the identifier.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        Utc.timestamp_opt(i64::from(secs), 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// External (hex) representation, as used in URLs and JSON.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl Default for CompanyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for CompanyId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_LEN * 2 {
            return Err(DomainError::invalid_id(format!(
                "CompanyId: expected {} hex characters, got {}",
                ID_LEN * 2,
                s.len()
            )));
        }

        let mut bytes = [0u8; ID_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = s
                .get(i * 2..i * 2 + 2)
                .ok_or_else(|| DomainError::invalid_id(format!("CompanyId: {s:?}")))?;
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|e| DomainError::invalid_id(format!("CompanyId: {e}")))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for CompanyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompanyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn renders_as_24_lowercase_hex_chars() {
        let id = CompanyId::new().to_hex();
        assert_eq!(id.len(), 24);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn ids_minted_in_a_burst_are_unique() {
        let ids: HashSet<CompanyId> = (0..10_000).map(|_| CompanyId::new()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn ids_minted_across_threads_are_unique() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..1_000).map(|_| CompanyId::new()).collect::<Vec<_>>()))
            .collect();

        let mut ids = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(ids.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(ids.len(), 8_000);
    }

    #[test]
    fn timestamp_is_close_to_now() {
        let before = Utc::now().timestamp();
        let ts = CompanyId::new().timestamp().timestamp();
        let after = Utc::now().timestamp();
        assert!(ts >= before && ts <= after);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("x".parse::<CompanyId>().is_err());
        assert!("zzzzzzzzzzzzzzzzzzzzzzzz".parse::<CompanyId>().is_err());
        assert!("0123456789abcdef012345678".parse::<CompanyId>().is_err());
        assert!("é123456789abcdef0123456".parse::<CompanyId>().is_err());
    }

    #[test]
    fn serializes_as_json_string() {
        let id = CompanyId::from_bytes([0xab; 12]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abababababababababababab\"");
        let back: CompanyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    proptest! {
        #[test]
        fn hex_form_parses_back(bytes in any::<[u8; 12]>()) {
            let id = CompanyId::from_bytes(bytes);
            prop_assert_eq!(id.to_hex().parse::<CompanyId>().unwrap(), id);
        }
    }
}
