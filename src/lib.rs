//! B2B tender platform backend
//!
//! Companies register, post tenders and apply to each other's tenders over a
//! JSON HTTP API backed by PostgreSQL.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;
