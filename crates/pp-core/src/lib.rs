//! picpop/crates/pp-core/src/lib.rs
//!
//! The domain types and interface definitions for picpop.

pub mod error;
pub mod models;
pub mod network;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use network::NetworkIdentity;
pub use traits::*;
