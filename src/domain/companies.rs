use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{
    normalize_services, optional_text, required_text, COMPANY_NAME_MAX_LEN, INDUSTRY_MAX_LEN,
};
use crate::api::PaginationParams;
use crate::error::ApiError;

/// Request DTO for creating a company
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub industry: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

impl CreateCompanyRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        Ok(Self {
            name: required_text("name", &self.name, COMPANY_NAME_MAX_LEN)?,
            industry: required_text("industry", &self.industry, INDUSTRY_MAX_LEN)?,
            description: optional_text(self.description),
            services: normalize_services(self.services)?,
        })
    }
}

/// Request DTO for updating a company; omitted fields are left unchanged and
/// a blank `description` becomes `Some("")`, which clears the stored one
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateCompanyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub services: Option<Vec<String>>,
}

impl UpdateCompanyRequest {
    pub fn validate(self) -> Result<Self, ApiError> {
        Ok(Self {
            name: self
                .name
                .map(|n| required_text("name", &n, COMPANY_NAME_MAX_LEN))
                .transpose()?,
            industry: self
                .industry
                .map(|i| required_text("industry", &i, INDUSTRY_MAX_LEN))
                .transpose()?,
            description: self.description.map(|d| d.trim().to_string()),
            services: self.services.map(normalize_services).transpose()?,
        })
    }
}

/// Response DTO for company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub industry: String,
    pub description: Option<String>,
    pub services: Vec<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters for `GET /company`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CompanyQuery {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub user_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl CompanyQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.per_page)
    }
}
