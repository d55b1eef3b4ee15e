pub mod applications;
pub mod auth;
pub mod companies;
pub mod health;
pub mod search;
pub mod tenders;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;
use crate::config::Settings;

/// Headroom for multipart boundaries and headers around the logo bytes
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the API router with all routes
pub fn api_router(settings: &Settings) -> Router<Arc<AppState>> {
    let logo_body_limit = DefaultBodyLimit::max(settings.logo_max_bytes + MULTIPART_OVERHEAD);

    Router::new()
        // Public routes
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/search", get(search::search_companies))
        // Auth
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/me", get(auth::me))
        // Companies
        .route(
            "/company",
            post(companies::create_company).get(companies::list_companies),
        )
        .route(
            "/company/:company_id",
            get(companies::get_company)
                .patch(companies::update_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        )
        .route(
            "/company/:company_id/logo",
            post(companies::upload_logo).layer(logo_body_limit),
        )
        .route(
            "/company/:company_id/tenders",
            get(tenders::list_company_tenders),
        )
        // Tenders
        .route(
            "/tender",
            post(tenders::create_tender).get(tenders::list_tenders),
        )
        .route(
            "/tender/:tender_id",
            get(tenders::get_tender)
                .patch(tenders::update_tender)
                .put(tenders::update_tender)
                .delete(tenders::delete_tender),
        )
        .route(
            "/tender/:tender_id/applications",
            get(tenders::list_tender_applications),
        )
        // Applications
        .route(
            "/application",
            post(applications::submit_application).get(applications::list_applications),
        )
        .route(
            "/application/:application_id",
            get(applications::get_application).delete(applications::withdraw_application),
        )
}
