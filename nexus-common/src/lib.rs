//! # Nexus Common Library
//!
//! Shared code for the Nexus network services including:
//! - Error types (Error enum)
//! - Event types (NexusEvent enum) and EventBus
//! - Configuration loading and root folder resolution
//! - SSE stream utilities

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
