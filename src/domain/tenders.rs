use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{optional_text, required_text, TENDER_TITLE_MAX_LEN};
use crate::api::PaginationParams;
use crate::error::ApiError;

fn check_budget(budget: Option<Decimal>) -> Result<Option<Decimal>, ApiError> {
    match budget {
        Some(b) if b.is_sign_negative() && !b.is_zero() => {
            Err(ApiError::bad_request("budget must not be negative"))
        }
        other => Ok(other),
    }
}

fn check_deadline(deadline: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    if deadline < today {
        return Err(ApiError::bad_request("deadline must not be in the past"));
    }
    Ok(deadline)
}

/// Request DTO for creating a tender
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenderRequest {
    pub company_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub budget: Option<Decimal>,
}

impl CreateTenderRequest {
    pub fn validate(self, today: NaiveDate) -> Result<Self, ApiError> {
        Ok(Self {
            company_id: self.company_id,
            title: required_text("title", &self.title, TENDER_TITLE_MAX_LEN)?,
            description: optional_text(self.description),
            deadline: check_deadline(self.deadline, today)?,
            budget: check_budget(self.budget)?,
        })
    }
}

/// Request DTO for updating a tender; omitted fields are left unchanged and
/// a blank `description` clears the stored one
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateTenderRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub budget: Option<Decimal>,
}

impl UpdateTenderRequest {
    pub fn validate(self, today: NaiveDate) -> Result<Self, ApiError> {
        Ok(Self {
            title: self
                .title
                .map(|t| required_text("title", &t, TENDER_TITLE_MAX_LEN))
                .transpose()?,
            description: self.description.map(|d| d.trim().to_string()),
            deadline: self
                .deadline
                .map(|d| check_deadline(d, today))
                .transpose()?,
            budget: check_budget(self.budget)?,
        })
    }
}

/// Response DTO for tender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenderResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub description: Option<String>,
    pub deadline: NaiveDate,
    pub budget: Option<Decimal>,
    pub is_open: bool,
    pub application_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters for `GET /tender`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TenderQuery {
    pub company_id: Option<Uuid>,
    pub q: Option<String>,
    pub open_only: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl TenderQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }
}
