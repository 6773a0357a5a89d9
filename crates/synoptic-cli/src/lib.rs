//! Library side of the `synoptic` binary.
//!
//! - [`logging`]: subscriber setup and value redaction
//! - [`output`]: timestamped raw, coded and audit CSV files

#![deny(unsafe_code)]

pub mod logging;
pub mod output;
