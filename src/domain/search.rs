use serde::Deserialize;

use super::validation::optional_text;
use crate::api::PaginationParams;

/// Filters for `GET /search`; every present filter must match
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchQuery {
    /// Keyword over name, description and services
    pub q: Option<String>,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub service: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SearchQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }

    /// Blank filters are treated as absent
    pub fn normalized(self) -> Self {
        Self {
            q: optional_text(self.q),
            name: optional_text(self.name),
            industry: optional_text(self.industry),
            service: optional_text(self.service),
            ..self
        }
    }
}
