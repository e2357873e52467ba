use crate::{
    catalog::CatalogError, extract::ExtractError,
    recommender::RecommendError, semantic::EmbeddingError,
};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Recommend(#[from] RecommendError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("invalid request: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("embedding model error: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl AppError {
    /// Problems the requester can fix by changing the input.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AppError::Recommend(RecommendError::EmptyQuery)
                | AppError::Extract(ExtractError::InvalidUrl(_))
                | AppError::InvalidParams(_)
        )
    }
}
