//! Types shared by every crate in the remote pad workspace.
//!
//! ## Architecture
//!
//! - **common** (this crate): error plumbing shared across layers
//! - **remote-core**: frame codec, connection manager and message router
//! - **remote-pad**: headless controller wiring the core to stdin and logs

pub mod error;

pub use error::error_location::ErrorLocation;
