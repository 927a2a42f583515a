//! Ad platform integrations — the adapter capability set the engines
//! depend on, plus a sandbox implementation for development and tests.
//!
//! The engines never depend on a concrete platform; decisions are computed
//! first and adapter calls are isolated side effects that may fail
//! independently.

pub mod adapter;
pub mod sandbox;

pub use adapter::{LaunchConfig, LaunchReceipt, PlatformAdapter, PlatformRegistry};
pub use sandbox::{SandboxAdapter, SandboxCall};
