//! Workspace entry crate.
//!
//! Re-exports the core service façade so host applications can depend on
//! `playcore` alone and enable `desktop-shims` for the desktop bridge
//! defaults.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
