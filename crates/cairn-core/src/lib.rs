//! # Cairn Core
//!
//! Core types and error definitions shared by every Cairn crate:
//! the unified error enum, result alias, request validation helpers,
//! and tracing initialization.

pub mod error;
pub mod result;
pub mod telemetry;
pub mod validation;

pub use error::*;
pub use result::*;
pub use telemetry::*;
pub use validation::*;
