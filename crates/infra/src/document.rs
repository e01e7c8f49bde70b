//! Typed documents and their collection-agnostic stored form.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use companies_core::Company;

/// A record that can live in a document collection.
///
/// Every document carries a server-assigned id and a creation time; the
/// creation time is the sort key for [`Session::find_recent`].
///
/// [`Session::find_recent`]: crate::Session::find_recent
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Name of the collection the document belongs to.
    const COLLECTION: &'static str;

    /// External representation of the document id.
    fn document_id(&self) -> String;

    fn created_at(&self) -> DateTime<Utc>;
}

/// A document as the backends see it: indexed columns plus a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub body: JsonValue,
}

impl StoredDocument {
    pub fn encode<D: Document>(doc: &D) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: doc.document_id(),
            created_at: doc.created_at(),
            body: serde_json::to_value(doc)?,
        })
    }

    pub fn decode<D: Document>(self) -> Result<D, serde_json::Error> {
        serde_json::from_value(self.body)
    }
}

impl Document for Company {
    const COLLECTION: &'static str = "companies";

    fn document_id(&self) -> String {
        self.id.to_hex()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.when
    }
}
