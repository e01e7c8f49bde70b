//! The company record: the single persisted entity of the service.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::id::CompanyId;

/// Client-supplied company fields.
///
/// Unknown fields (including any client attempt at `id` or `when`) are ignored
/// during decoding; missing fields take their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyDraft {
    pub name: String,
    pub description: String,
    pub floor: i64,
    pub unit: i64,
}

/// A stored company. `id` and `when` are always server-assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub description: String,
    pub floor: i64,
    pub unit: i64,
    /// Creation time at microsecond precision; the listing sort key.
    pub when: DateTime<Utc>,
}

impl Company {
    /// Turn a draft into a record with a fresh id, created at `now`.
    ///
    /// `now` is truncated to microseconds, the finest precision every store
    /// can sort on.
    pub fn register(draft: CompanyDraft, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(6);
        Self {
            id: CompanyId::with_timestamp(now),
            name: draft.name,
            description: draft.description,
            floor: draft.floor,
            unit: draft.unit,
            when: now,
        }
    }
}
