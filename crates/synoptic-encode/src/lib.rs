//! Code-book encoding of cleaned values.

#![deny(unsafe_code)]

pub mod candidates;
pub mod embedder;
pub mod encoder;
pub mod error;

pub use candidates::{MAX_WHOLE_TOKENS, candidates};
pub use embedder::{DEFAULT_DIMENSION, Embedder, NgramEmbedder, cosine_similarity};
pub use encoder::{DEFAULT_TRAINING_FLOOR, Encoded, Encoder, EncoderOptions};
pub use error::{EncodeError, Result};
