//! Adapter registry.
//!
//! The registry stores factories by id, builds each adapter once on first
//! use, and runs lookups across the enabled sources in priority order. The
//! first usable result wins; one source failing never stops the chain.

mod adapter_registry;
mod pacer;

pub use adapter_registry::{AdapterFactory, AdapterRegistry, FallbackHit, InitReport};
pub use pacer::AdapterPacer;
