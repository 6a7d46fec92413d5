//! LATTICE Core - Domain Types, Errors, and Shutdown Coordination
//!
//! Shared foundation for the LATTICE ingestion pipeline. This crate contains
//! the triple/entity/relationship data model, the error taxonomy used across
//! the workspace, and the cooperative shutdown coordinator. No I/O lives here.

pub mod error;
pub mod shutdown;
pub mod types;

pub use error::{DecodeError, LatticeError, LatticeResult, SchemaError, StoreError, StoreResult};
pub use shutdown::Shutdown;
pub use types::{Entity, EntityId, Relationship, Timestamp, Triple};
