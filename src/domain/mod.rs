//! Domain types and DTOs
//!
//! Request/response bodies for users, companies, tenders and applications,
//! plus the validation they share.

pub mod applications;
pub mod auth;
pub mod companies;
pub mod search;
pub mod tenders;
pub mod validation;

pub use applications::*;
pub use companies::*;
pub use search::*;
pub use tenders::*;

use serde::Deserialize;

/// Query for delete endpoints
///
/// Without `cascade=true`, deleting a record that still has dependants is refused.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct DeleteQuery {
    pub cascade: Option<bool>,
}

impl DeleteQuery {
    pub fn cascade(&self) -> bool {
        self.cascade.unwrap_or(false)
    }
}
