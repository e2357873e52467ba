//! Request-level facade over the recommender.
//!
//! Resolves a `{query}` or `{url}` request into query text, runs the
//! recommender and shapes the response entries.

pub mod errors;

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

pub use errors::AppError;

use crate::{
    catalog::{self, yes_no, CatalogItem, CatalogStore, TestType},
    config::Config,
    extract::TextExtractor,
    recommender::{RecommendError, Recommender, ScoredResult},
    semantic::{Embedder, EmbeddingModel},
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub query: Option<String>,

    /// A page whose leading paragraphs become the query. Takes precedence
    /// over `query` when both are given.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub threshold: Option<f32>,

    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub name: String,
    pub url: String,
    pub description: String,
    pub test_type: TestType,
    pub duration_minutes: u32,
    #[serde(serialize_with = "yes_no::serialize")]
    pub remote_testing: bool,
    #[serde(serialize_with = "yes_no::serialize")]
    pub adaptive_irt: bool,
    pub similarity_score: f32,
}

impl From<ScoredResult> for Recommendation {
    fn from(result: ScoredResult) -> Self {
        let ScoredResult { item, score } = result;
        Self {
            name: item.name,
            url: item.url,
            description: item.description,
            test_type: item.test_type,
            duration_minutes: item.duration_minutes,
            remote_testing: item.remote_testing,
            adaptive_irt: item.adaptive_irt,
            similarity_score: score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub results: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub model: String,
    pub catalog_items: usize,
    pub catalog_fingerprint: String,
}

pub struct App {
    recommender: Recommender,
    extractor: TextExtractor,
}

impl App {
    pub fn new(recommender: Recommender, extractor: TextExtractor) -> Self {
        Self {
            recommender,
            extractor,
        }
    }

    /// Load the catalog and the embedding model and embed the catalog.
    ///
    /// Everything expensive happens here, once; a returned `App` is ready
    /// to serve.
    pub fn init(config: &Config) -> Result<Self, AppError> {
        let rc = &config.recommender;

        let items = catalog::resolve(config.catalog_path.as_deref())?;

        let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingModel::new(
            &rc.model,
            config.base_path().clone(),
            Some(Duration::from_secs(rc.download_timeout_secs)),
        )?);

        let store = Arc::new(CatalogStore::load(items, embedder.as_ref())?);
        log::info!(
            "catalog ready: {} items, fingerprint {}",
            store.len(),
            store.fingerprint()
        );

        let embed_timeout =
            (rc.embed_timeout_secs > 0).then(|| Duration::from_secs(rc.embed_timeout_secs));
        let recommender =
            Recommender::new(store, embedder, rc.params())?.with_embed_timeout(embed_timeout);

        Ok(Self::new(recommender, TextExtractor::new(config.extract.clone())))
    }

    /// Turn a request into query text: fetched page text when `url` is set,
    /// the direct query otherwise.
    pub fn resolve_query(&self, request: &RecommendRequest) -> Result<String, AppError> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        let query_text = if let Some(url) = non_empty(&request.url) {
            self.extractor.extract(&url)?
        } else if let Some(query) = non_empty(&request.query) {
            query
        } else {
            log::debug!("request carries neither query nor url");
            return Err(RecommendError::EmptyQuery.into());
        };

        if query_text.trim().is_empty() {
            return Err(RecommendError::EmptyQuery.into());
        }

        Ok(query_text)
    }

    pub fn recommend(&self, request: RecommendRequest) -> Result<RecommendResponse, AppError> {
        let defaults = self.recommender.defaults();

        let threshold = request.threshold.unwrap_or(defaults.threshold);
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(AppError::InvalidParams(format!(
                "threshold must be between -1.0 and 1.0, got {threshold}"
            )));
        }
        let limit = request.limit.unwrap_or(defaults.limit);

        let query_text = self.resolve_query(&request)?;

        let results = self.recommender.recommend(&query_text, threshold, limit)?;

        Ok(RecommendResponse {
            results: results.into_iter().map(Recommendation::from).collect(),
        })
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        self.recommender.store().items()
    }

    pub fn health(&self) -> Health {
        let store = self.recommender.store();
        Health {
            status: "ok",
            model: store.model_id().to_string(),
            catalog_items: store.len(),
            catalog_fingerprint: store.fingerprint().to_string(),
        }
    }
}
