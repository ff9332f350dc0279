use async_trait::async_trait;

use crate::{
    tender::{PageCursor, TenderPage, TenderRecord},
    Result,
};

/// Parameters of one listing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub descending: bool,
    pub offset: Option<PageCursor>,
}

/// Hexagonal port for the procurement registry.
///
/// The HTTP implementation lives in `tbot-prozorro`; implementations own their
/// retry policy and only return an error once it is exhausted.
#[async_trait]
pub trait TenderSource: Send + Sync {
    async fn fetch_page(&self, req: &PageRequest) -> Result<TenderPage>;

    async fn fetch_tender(&self, id: &str) -> Result<TenderRecord>;
}
