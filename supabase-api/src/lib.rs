//! HTTP Surface of the Supabase Admin Gateway
//!
//! Every administrative operation is a `POST /v1/{operation}` taking a JSON
//! body. Handlers translate the body into SQL or storage calls and forward
//! them to an [`AdminBackend`].
//!
//! # Routes
//!
//! - `GET /` service information
//! - `GET /health` liveness and reachability of the instance
//! - `GET /v1/specification` endpoint catalogue
//! - `POST /v1/*` tables, database, storage and edge functions

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::unused_async)]

pub mod error;
pub mod handlers;
pub mod server;
pub mod spec;

use std::sync::Arc;

use actix_web::web;

use supabase_client::AdminBackend;

pub use error::{HandlerError, HandlerResult};
pub use server::ApiServer;

use handlers::{database, functions, storage, tables};

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub backend: Arc<dyn AdminBackend>,
}

impl ApiState {
    pub fn new(backend: Arc<dyn AdminBackend>) -> Self {
        Self { backend }
    }
}

/// Register every gateway route on an app or scope
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        // Service
        .route("/", web::get().to(handlers::info_handler))
        .route("/health", web::get().to(handlers::health_handler))
        .route("/v1/specification", web::get().to(handlers::specification_handler))
        // Tables
        .route("/v1/query_table", web::post().to(tables::query_table))
        .route("/v1/generate_types", web::post().to(tables::generate_types))
        .route("/v1/list_tables", web::post().to(tables::list_tables))
        .route("/v1/create_table", web::post().to(tables::create_table))
        .route("/v1/alter_table", web::post().to(tables::alter_table))
        .route("/v1/drop_table", web::post().to(tables::drop_table))
        // Database
        .route("/v1/execute_query", web::post().to(database::execute_query))
        .route("/v1/get_database_schema", web::post().to(database::get_database_schema))
        .route("/v1/create_schema", web::post().to(database::create_schema))
        .route("/v1/delete_schema", web::post().to(database::delete_schema))
        .route("/v1/get_rls_policies", web::post().to(database::get_rls_policies))
        .route("/v1/create_rls_policy", web::post().to(database::create_rls_policy))
        .route("/v1/update_rls_policy", web::post().to(database::update_rls_policy))
        .route("/v1/delete_rls_policy", web::post().to(database::delete_rls_policy))
        // Storage
        .route("/v1/get_buckets", web::post().to(storage::get_buckets))
        .route("/v1/create_bucket", web::post().to(storage::create_bucket))
        .route("/v1/update_bucket", web::post().to(storage::update_bucket))
        .route("/v1/delete_bucket", web::post().to(storage::delete_bucket))
        .route("/v1/get_bucket_policies", web::post().to(storage::get_bucket_policies))
        .route("/v1/create_bucket_policy", web::post().to(storage::create_bucket_policy))
        .route("/v1/update_bucket_policy", web::post().to(storage::update_bucket_policy))
        .route("/v1/delete_bucket_policy", web::post().to(storage::delete_bucket_policy))
        // Edge functions
        .route("/v1/get_edge_functions", web::post().to(functions::get_edge_functions))
        .route("/v1/create_edge_function", web::post().to(functions::create_edge_function))
        .route("/v1/update_edge_function", web::post().to(functions::update_edge_function))
        .route("/v1/delete_edge_function", web::post().to(functions::delete_edge_function))
        .route("/v1/deploy_edge_function", web::post().to(functions::deploy_edge_function));
}
