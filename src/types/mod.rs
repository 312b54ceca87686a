//! Shared request and response types for list and action endpoints.

mod pagination;
mod response;

pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use response::{MessageResponse, NoContent};
