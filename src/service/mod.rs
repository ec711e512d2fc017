pub mod ranking;
pub mod token_service;

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{PaginatedResult, QueryOptions};

pub use ranking::{paginate, sort_tokens};
pub use token_service::TokenService;

/// Paged token reads, as consumed by the broadcaster.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenQuery: Send + Sync {
    async fn get_tokens(&self, options: &QueryOptions) -> Result<PaginatedResult>;
}

#[async_trait]
impl TokenQuery for TokenService {
    async fn get_tokens(&self, options: &QueryOptions) -> Result<PaginatedResult> {
        TokenService::get_tokens(self, options).await
    }
}
