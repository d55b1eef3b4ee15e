use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::required_text;
use crate::api::PaginationParams;
use crate::error::ApiError;

pub const PROPOSAL_MAX_LEN: usize = 20_000;

/// Request DTO for submitting an application
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplicationRequest {
    pub tender_id: Uuid,
    pub company_id: Uuid,
    pub proposal: String,
}

impl CreateApplicationRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        Ok(Self {
            proposal: required_text("proposal", &self.proposal, PROPOSAL_MAX_LEN)?,
            ..self
        })
    }
}

/// Response DTO for application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub tender_title: String,
    pub company_id: Uuid,
    pub company_name: String,
    pub proposal: String,
    pub submitted_at: DateTime<Utc>,
}

/// Filters for `GET /application`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApplicationQuery {
    pub tender_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ApplicationQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }
}
