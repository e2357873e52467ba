mod app;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::app::App;
use crate::catalog::{builtin, CatalogStore};
use crate::config::ExtractConfig;
use crate::extract::TextExtractor;
use crate::recommender::{RecommendParams, Recommender};
use crate::semantic::{Embedder, EmbeddingError};

pub const GENERAL_ABILITY: &str = "Measures numerical, verbal, and logical reasoning abilities.";
pub const SALES_PERSONALITY: &str =
    "Assesses personality traits important for success in sales roles.";
pub const CUSTOMER_SERVICE: &str =
    "Simulates real-world scenarios to evaluate customer service skills.";

/// Deterministic embedder backed by a lookup table.
///
/// Unknown texts embed to the zero vector, which scores 0.0 against
/// everything.
pub struct TableEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimensions: usize,
    pub query_calls: AtomicUsize,
    fail_queries: bool,
    query_delay: Option<Duration>,
}

impl TableEmbedder {
    pub fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        let dimensions = entries.first().map(|(_, v)| v.len()).unwrap_or(3);
        Self {
            vectors: entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
            dimensions,
            query_calls: AtomicUsize::new(0),
            fail_queries: false,
            query_delay: None,
        }
    }

    /// Vectors for the built-in catalog plus the given query texts.
    pub fn with_catalog(queries: &[(&str, Vec<f32>)]) -> Self {
        let mut entries = vec![
            (GENERAL_ABILITY, vec![1.0, 0.0, 0.0]),
            (SALES_PERSONALITY, vec![0.0, 1.0, 0.0]),
            (CUSTOMER_SERVICE, vec![0.8, 0.0, 0.6]),
        ];
        entries.extend(queries.iter().cloned());
        Self::new(&entries)
    }

    pub fn failing(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    fn lookup(&self, text: &str) -> Vec<f32> {
        self.vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dimensions])
    }
}

impl Embedder for TableEmbedder {
    fn model_id(&self) -> &str {
        "table"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.query_delay {
            std::thread::sleep(delay);
        }
        if self.fail_queries {
            return Err(EmbeddingError::EmbeddingFailed("model unavailable".to_string()));
        }

        Ok(self.lookup(text))
    }

    // catalog embedding bypasses the query counters, delay and failures
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.lookup(t)).collect())
    }
}

pub fn build_recommender(embedder: Arc<TableEmbedder>) -> Recommender {
    let store = Arc::new(CatalogStore::load(builtin(), embedder.as_ref()).unwrap());
    Recommender::new(store, embedder, RecommendParams::default()).unwrap()
}

pub fn build_app(embedder: Arc<TableEmbedder>) -> App {
    let extract_config = ExtractConfig {
        timeout_secs: 1,
        ..Default::default()
    };
    App::new(build_recommender(embedder), TextExtractor::new(extract_config))
}
