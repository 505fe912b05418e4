//! # elicit-store
//!
//! The version chain store: per-question answer supersede chains and
//! the append-only per-project snapshot log.
//!
//! [`ChainStore`] is the persistence seam; [`InMemoryChainStore`] is
//! the reference implementation. A database-backed implementation
//! plugs in behind the same trait without touching the engine.

pub mod inmemory;
pub mod service;

pub use inmemory::InMemoryChainStore;
pub use service::ChainStore;
