//! # tonearm-core
//!
//! Core types, events, and error handling for the tonearm continuous-playback
//! engine.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
