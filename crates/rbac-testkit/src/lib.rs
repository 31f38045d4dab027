//! RBAC Testing Infrastructure
//!
//! Shared fixtures and store wrappers for the RBAC crates' tests:
//!
//! - [`Scenario`] declares items, edges and assignments and builds a
//!   [`MemoryItemStore`](rbac_store::MemoryItemStore) from them.
//! - [`FaultyStore`] fails chosen store operations on demand.
//! - [`CountingStore`] counts store calls, so tests can assert that a path
//!   performs no writes or a single round trip.
//! - [`strategies`] holds proptest strategies for names and assignment sets.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! rbac-testkit = { workspace = true }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod counting;
pub mod faults;
pub mod fixtures;
pub mod strategies;

pub use counting::CountingStore;
pub use faults::{FaultyStore, StoreOperation};
pub use fixtures::{checkrole_scenario, chain_scenario, fixture_time, Scenario};

/// Install a test subscriber once per process
///
/// Output goes through the test writer so it only shows for failing tests.
/// The filter comes from `RUST_LOG`, defaulting to `debug` for RBAC crates.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rbac_authorization=debug,rbac_store=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
