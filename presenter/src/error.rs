use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenterError {
    #[error("a narrative needs at least one block")]
    Empty,
    #[error("page {page} out of range (narrative has {pages} pages)")]
    PageOutOfRange { page: usize, pages: usize },
}
