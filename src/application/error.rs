use thiserror::Error;

use crate::{
    application::{
        foods::CatalogError, likes::LikeError, repos::StoreError, resolver::ResolveError,
        reviews::ReviewError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Like(#[from] LikeError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error("resource not found")]
    NotFound,
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Whether the failure stems from caller input rather than the environment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Domain(_)
                | AppError::NotFound
                | AppError::Resolve(ResolveError::Validation(_))
                | AppError::Catalog(CatalogError::Validation(_))
                | AppError::Catalog(CatalogError::Duplicate { .. })
                | AppError::Like(LikeError::UnknownFood { .. })
                | AppError::Review(ReviewError::Validation(_))
                | AppError::Review(ReviewError::NotFound { .. })
        )
    }
}
