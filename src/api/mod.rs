//! API extractors, response envelopes and pagination utilities

pub mod extract;
pub mod pagination;
pub mod response;

pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use response::{DataResponse, MessageResponse};
