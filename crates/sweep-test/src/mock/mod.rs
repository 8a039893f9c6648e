//! Mock remote store for testing.
//!
//! [`MockRemoteStore`] keeps objects in memory, keyed by container and key,
//! each with an ordered set of versions. Failures are injected per key and
//! stay in effect until the test changes them, so a protected object stays
//! protected across relistings.

mod gate;
mod store;

pub use gate::CallGate;
pub use store::{DeleteCall, ListCall, MockRemoteStore};
