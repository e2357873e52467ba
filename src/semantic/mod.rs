//! Semantic similarity infrastructure for catalog ranking.
//!
//! This module provides local embeddings using fastembed-rs and in-memory
//! cosine similarity ranking.
//!
//! # Architecture
//!
//! - `embeddings`: Embedding provider trait and the fastembed wrapper
//! - `similarity`: Cosine similarity, thresholding and stable ranking

pub mod embeddings;
pub mod similarity;

pub use embeddings::{Embedder, EmbeddingError, EmbeddingModel};
pub use similarity::rank;

/// Default embedding model name
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Default similarity threshold for recommendations
pub const DEFAULT_THRESHOLD: f32 = 0.4;

/// Default maximum number of recommendations
pub const DEFAULT_LIMIT: usize = 10;
