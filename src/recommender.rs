//! Ranks catalog items against free-text queries.
//!
//! The pipeline is linear: embed the query, score it against every catalog
//! embedding, keep scores strictly above the threshold, sort descending
//! (ties in catalog order) and truncate to the limit. Given a fixed catalog
//! and model the output is a pure function of the inputs.

use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use crate::catalog::{CatalogItem, CatalogStore};
use crate::semantic::{self, Embedder, EmbeddingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The provider may recover (busy, timed out).
    Transient,
    /// Retrying will not help (misconfiguration, model mismatch).
    Permanent,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Transient => f.write_str("transient"),
            FailureKind::Permanent => f.write_str("permanent"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("recommendation unavailable ({kind}): {reason}")]
    Unavailable { kind: FailureKind, reason: String },
}

impl RecommendError {
    fn permanent(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            kind: FailureKind::Permanent,
            reason: reason.into(),
        }
    }

    fn transient(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            kind: FailureKind::Transient,
            reason: reason.into(),
        }
    }
}

impl From<EmbeddingError> for RecommendError {
    fn from(err: EmbeddingError) -> Self {
        if err.is_transient() {
            Self::transient(err.to_string())
        } else {
            Self::permanent(err.to_string())
        }
    }
}

/// Threshold and limit applied to a recommendation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendParams {
    pub threshold: f32,
    pub limit: usize,
}

impl Default for RecommendParams {
    fn default() -> Self {
        Self {
            threshold: semantic::DEFAULT_THRESHOLD,
            limit: semantic::DEFAULT_LIMIT,
        }
    }
}

/// Query embeddings allowed to wait behind the one in progress.
const EMBED_QUEUE_DEPTH: usize = 8;

struct EmbedJob {
    text: String,
    deadline: Instant,
    reply: mpsc::Sender<Result<Vec<f32>, EmbeddingError>>,
}

/// A single long-lived thread running query embeddings in arrival order.
///
/// Jobs whose caller has already timed out are dropped without running, so
/// abandoned work never queues up in front of live requests.
struct EmbedWorker {
    jobs: mpsc::SyncSender<EmbedJob>,
    timeout: Duration,
}

impl EmbedWorker {
    fn spawn(embedder: Arc<dyn Embedder>, timeout: Duration) -> Self {
        let (jobs, queue) = mpsc::sync_channel::<EmbedJob>(EMBED_QUEUE_DEPTH);

        std::thread::spawn(move || {
            for job in queue {
                if Instant::now() >= job.deadline {
                    log::debug!("dropping query embedding, caller timed out");
                    continue;
                }
                let _ = job.reply.send(embedder.embed(&job.text));
            }
        });

        Self { jobs, timeout }
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, RecommendError> {
        let (reply, rx) = mpsc::channel();
        let job = EmbedJob {
            text: text.to_string(),
            deadline: Instant::now() + self.timeout,
            reply,
        };

        match self.jobs.try_send(job) {
            Ok(()) => {}
            Err(mpsc::TrySendError::Full(_)) => {
                return Err(RecommendError::transient("embedding provider is busy"))
            }
            Err(mpsc::TrySendError::Disconnected(_)) => {
                return Err(RecommendError::permanent("embedding worker has stopped"))
            }
        }

        match rx.recv_timeout(self.timeout) {
            Ok(result) => Ok(result?),
            // the worker drops expired jobs, which disconnects the reply channel
            Err(mpsc::RecvTimeoutError::Timeout | mpsc::RecvTimeoutError::Disconnected) => {
                Err(RecommendError::transient(format!(
                    "embedding provider did not answer within {}s",
                    self.timeout.as_secs_f32()
                )))
            }
        }
    }
}

/// One catalog item with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    pub item: CatalogItem,
    pub score: f32,
}

pub struct Recommender {
    store: Arc<CatalogStore>,
    embedder: Arc<dyn Embedder>,
    defaults: RecommendParams,
    embed_worker: Option<EmbedWorker>,
}

impl Recommender {
    /// Pair a catalog store with the embedder used to embed queries.
    ///
    /// The embedder must report the same model id the store was built with.
    pub fn new(
        store: Arc<CatalogStore>,
        embedder: Arc<dyn Embedder>,
        defaults: RecommendParams,
    ) -> Result<Self, RecommendError> {
        if store.model_id() != embedder.model_id() {
            return Err(RecommendError::permanent(format!(
                "catalog was embedded with model '{}' but queries use '{}'",
                store.model_id(),
                embedder.model_id()
            )));
        }

        Ok(Self {
            store,
            embedder,
            defaults,
            embed_worker: None,
        })
    }

    /// Bound the query embedding call. `None` waits indefinitely.
    pub fn with_embed_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.embed_worker = timeout.map(|t| EmbedWorker::spawn(Arc::clone(&self.embedder), t));
        self
    }

    pub fn defaults(&self) -> RecommendParams {
        self.defaults
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Rank catalog items against `query`.
    ///
    /// Returns at most `limit` items whose score is strictly greater than
    /// `threshold`, most similar first. An empty result means nothing
    /// matched well enough; it is not an error.
    pub fn recommend(
        &self,
        query: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredResult>, RecommendError> {
        if query.trim().is_empty() {
            return Err(RecommendError::EmptyQuery);
        }

        let query_embedding = self.embed_query(query)?;

        if query_embedding.len() != self.store.dimensions() {
            return Err(RecommendError::permanent(format!(
                "query embedding has {} dimensions, catalog has {}",
                query_embedding.len(),
                self.store.dimensions()
            )));
        }

        let ranked = semantic::rank(
            &query_embedding,
            self.store.embeddings().map(|(_, vector)| vector),
            threshold,
            limit,
        );

        log::debug!(
            "{} of {} catalog items above threshold {threshold}",
            ranked.len(),
            self.store.len()
        );

        ranked
            .into_iter()
            .map(|r| {
                self.store
                    .get(r.position)
                    .map(|item| ScoredResult {
                        item: item.clone(),
                        score: r.score,
                    })
                    .ok_or_else(|| {
                        RecommendError::permanent(format!("ranked position {} out of range", r.position))
                    })
            })
            .collect()
    }

    fn embed_query(&self, query: &str) -> Result<Vec<f32>, RecommendError> {
        match &self.embed_worker {
            Some(worker) => worker.embed(query),
            None => Ok(self.embedder.embed(query)?),
        }
    }
}
