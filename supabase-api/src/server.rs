//! HTTP server hosting the gateway routes

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::info;

use supabase_common::config::ServerConfig;
use supabase_common::error::Result;

use crate::{routes, ApiState};

/// Gateway HTTP server
pub struct ApiServer {
    config: ServerConfig,
    state: Arc<ApiState>,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: ApiState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        self.state.clone()
    }

    /// Run until the server is stopped
    pub async fn run(&self) -> Result<()> {
        let state = self.state.clone();
        let origins = self.config.cors_origins.clone();
        let host = self.config.host.clone();
        let port = self.config.port;

        info!("Starting admin gateway on {}:{}", host, port);
        info!("  CORS origins: {}", origins.join(", "));

        let mut server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .wrap(cors(&origins))
                .wrap(middleware::Compress::default())
                .wrap(middleware::Logger::default())
                .configure(routes)
        });

        if self.config.workers > 0 {
            server = server.workers(self.config.workers);
        }

        server.bind(format!("{host}:{port}"))?.run().await?;

        Ok(())
    }
}

/// Permissive when any origin is allowed, otherwise an explicit allow-list
fn cors(origins: &[String]) -> Cors {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Cors::permissive();
    }

    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use supabase_client::RecordingBackend;

    #[test]
    fn test_server_keeps_config() {
        let config = ServerConfig {
            port: 8088,
            ..ServerConfig::default()
        };
        let server = ApiServer::new(config, ApiState::new(Arc::new(RecordingBackend::new())));

        assert_eq!(server.config().port, 8088);
        assert_eq!(server.config().host, "0.0.0.0");
        assert_eq!(Arc::strong_count(&server.state()), 2);
    }

    #[actix_rt::test]
    async fn test_restricted_cors_rejects_foreign_origin() {
        use actix_web::dev::Service;
        use actix_web::{http::header, test};

        let origins = vec!["https://studio.example.com".to_string()];
        let backend = Arc::new(RecordingBackend::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::new(ApiState::new(backend))))
                .wrap(cors(&origins))
                .configure(routes),
        )
        .await;

        let allowed = test::TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "https://studio.example.com"))
            .to_request();
        let resp = test::call_service(&app, allowed).await;
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("https://studio.example.com")
        );

        let foreign = test::TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "https://evil.example.net"))
            .to_request();
        let rejected = match app.call(foreign).await {
            Ok(resp) => {
                !resp.status().is_success()
                    && resp
                        .headers()
                        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                        .is_none()
            }
            Err(_) => true,
        };
        assert!(rejected);
    }

    #[actix_rt::test]
    async fn test_wildcard_origin_is_permissive() {
        use actix_web::{http::header, test};

        let origins = vec!["*".to_string()];
        let backend = Arc::new(RecordingBackend::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::new(ApiState::new(backend))))
                .wrap(cors(&origins))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "https://anywhere.example.org"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert!(resp
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
