//! Shared types for Chime

mod error;

pub use error::{ChimeError, Result};
