//! Caches for resolved dependencies
//!
//! Everything is keyed by the fingerprint of a dependency set.
//!
//! | Cache | Value | Lifetime |
//! |-------|-------|----------|
//! | [`PersistentCache`] | resolved [`Classpath`](crate::classpath::Classpath) | persisted to disk on save |
//! | [`ExecutionContextCache`] | built [`ExecutionContext`](crate::executor::ExecutionContext) | process |
//!
//! Both use [`FlightMap`] so concurrent requests for one fingerprint do the
//! work once.

pub mod context;
pub mod flight;
pub mod persistent;

pub use context::ExecutionContextCache;
pub use flight::FlightMap;
pub use persistent::PersistentCache;
