//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the playback core:
//! - Logging and tracing infrastructure
//! - Configuration management (host bridges + playback timings)
//! - Event bus carrying the outbound event stream
//!
//! ## Overview
//!
//! Every other crate in the workspace depends on this one for its
//! configuration types, its event vocabulary and its logging conventions.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
