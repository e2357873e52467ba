//! Catalog items paired 1:1 with their description embeddings.
//!
//! Embeddings are computed once when the store is built and never change
//! afterwards. Share the store behind an `Arc`; it needs no locking.

use sha2::{Digest, Sha256};

use super::{validate, CatalogError, CatalogItem};
use crate::semantic::{Embedder, EmbeddingError};

pub struct CatalogStore {
    items: Vec<CatalogItem>,
    embeddings: Vec<Vec<f32>>,
    model_id: String,
    dimensions: usize,
    fingerprint: String,
}

impl CatalogStore {
    /// Validate `items` and embed every description with `embedder`.
    ///
    /// Fails with `EmptyCatalog` when there is nothing to recommend.
    pub fn load(items: Vec<CatalogItem>, embedder: &dyn Embedder) -> Result<Self, CatalogError> {
        validate(&items)?;

        let descriptions: Vec<String> = items.iter().map(|i| i.description.clone()).collect();

        log::info!(
            "embedding {} catalog items with model '{}'",
            items.len(),
            embedder.model_id()
        );
        let embeddings = embedder.embed_batch(&descriptions)?;

        if embeddings.len() != items.len() {
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "provider returned {} vectors for {} catalog items",
                embeddings.len(),
                items.len()
            ))
            .into());
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or_default();
        if dimensions == 0 {
            return Err(
                EmbeddingError::EmbeddingFailed("provider returned empty vectors".to_string()).into(),
            );
        }
        if let Some(bad) = embeddings.iter().find(|v| v.len() != dimensions) {
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "inconsistent embedding dimensions: {} and {}",
                dimensions,
                bad.len()
            ))
            .into());
        }

        let fingerprint = fingerprint(embedder.model_id(), &descriptions);
        log::debug!("catalog fingerprint {fingerprint}");

        Ok(Self {
            items,
            embeddings,
            model_id: embedder.model_id().to_string(),
            dimensions,
            fingerprint,
        })
    }

    /// Catalog items with their embeddings, in catalog order.
    pub fn embeddings(&self) -> impl Iterator<Item = (&CatalogItem, &[f32])> {
        self.items
            .iter()
            .zip(self.embeddings.iter().map(Vec::as_slice))
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, position: usize) -> Option<&CatalogItem> {
        self.items.get(position)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Model id the embeddings were computed with.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// SHA256 over the model id and the embedded descriptions.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn fingerprint(model_id: &str, descriptions: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model_id.as_bytes());
    for description in descriptions {
        hasher.update([0u8]);
        hasher.update(description.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
