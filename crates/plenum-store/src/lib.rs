//! # plenum-store
//!
//! In-memory reference implementation of the plenum storage contract.
//!
//! The production deployment fronts an external durable store; this crate
//! implements the same repository traits over process memory so the
//! discourse engine, selector, and resolver can run and be tested offline.
//! It is also the executable documentation of the storage invariants:
//! cascade deletes, vote upsert, order-position uniqueness, and serialized
//! turn-number assignment.

pub mod memory;

pub use memory::MemoryStore;
