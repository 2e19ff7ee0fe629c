//! Screensaver advertisement backend
//!
//! Manages uploaded media assets, video templates, and the tasks that bind
//! an asset to a template for an external rendering pipeline. Files live in
//! S3-compatible object storage; metadata lives in PostgreSQL.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
