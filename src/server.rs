use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{web, App, HttpServer};
use tokio::sync::Semaphore;
use tracing::info;

use crate::catalog::{SqliteSource, TermCatalog};
use crate::config::Config;
use crate::error::ApiError;
use crate::generator::GeneratorService;
use crate::gpa::GpaLookup;
use crate::server_handlers;

/// Shared state behind every route.
pub struct AppState {
    pub catalog: Arc<TermCatalog>,
    pub generator: Arc<GeneratorService>,
    /// Where terms missing from the catalog are loaded from on demand.
    pub source: Option<SqliteSource>,
    /// Bounds the number of searches running at once.
    pub permits: Arc<Semaphore>,
    pub timeout: Duration,
    pub max_input_courses: usize,
}

impl AppState {
    pub fn new(
        catalog: Arc<TermCatalog>,
        gpa: Arc<dyn GpaLookup>,
        source: Option<SqliteSource>,
        config: &Config,
    ) -> Self {
        let generator = GeneratorService::new(catalog.clone(), gpa, config.limits);
        AppState {
            catalog,
            generator: Arc::new(generator),
            source,
            permits: Arc::new(Semaphore::new(std::cmp::max(1, num_cpus::get()))),
            timeout: config.generate_timeout,
            max_input_courses: config.max_input_courses,
        }
    }
}

/// Registers the API routes. Shared by `run_server` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(format!("Invalid request body: {}", err)).into()),
    )
    .route("/health", web::get().to(server_handlers::health_handler))
    .route("/api/terms", web::get().to(server_handlers::terms_handler))
    .route("/api/schedules/generate", web::post().to(server_handlers::generate_handler));
}

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

pub async fn run_server(config: Config, state: AppState) -> std::io::Result<()> {
    let bind = config.bind_addr();
    let origins = config.cors_allowed_origins.clone();
    let data = web::Data::new(state);

    info!(%bind, "starting HTTP server");
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&origins))
            .app_data(data.clone())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}
