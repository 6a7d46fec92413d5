//! Core data model for the ingestion pipeline.
//!
//! A [`Triple`] is the transient unit of work decoded from one stream record;
//! [`Entity`] and [`Relationship`] are the durable rows it materializes into.
//! All durable state lives in the relational store, never cached in process
//! memory, so every run observes the store's current truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned entity identifier (`BIGSERIAL` column).
pub type EntityId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// A subject-predicate-object record extracted from one decoded message.
///
/// Produced per message and consumed immediately by the persistence phase;
/// never stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    /// When the record was decoded, not when it was produced upstream.
    pub observed_at: Timestamp,
}

impl Triple {
    /// Build a triple observed now.
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            observed_at: Utc::now(),
        }
    }
}

/// A named, uniquely identified node materialized from either side of a triple.
///
/// Name uniqueness is the entity's sole identity invariant: the first upsert
/// of a name creates the row, every later upsert of the same name is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: String,
    pub created_at: Timestamp,
}

/// A directed, named edge between two entity identifiers.
///
/// The ordered `(source_id, target_id, name)` triple is unique; distinct
/// names between the same ordered pair are distinct edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub name: String,
}
