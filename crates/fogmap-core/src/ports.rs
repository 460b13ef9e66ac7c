//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod query;

pub use query::ExploredAreaQuery;
