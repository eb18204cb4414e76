use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod db;
pub mod overlay;
pub mod render;
pub mod template;

pub use crate::config::AppConfig;
pub use crate::db::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
    /// Payload key that the template configuration asked for but the request lacked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            key: None,
            template_id: None,
        }
    }

    /// Body whose `error` and `message` both carry `message`.
    pub fn from_message(message: &str) -> Self {
        Self::new(message, message)
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn with_template_id(mut self, template_id: &str) -> Self {
        self.template_id = Some(template_id.to_string());
        self
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::render::handlers::get_filled_pdf,
        crate::render::handlers::get_filled_pdf_method,
    ),
    components(
        schemas(
            render::models::RenderRequest,
            ErrorResponse,
        )
    ),
    tags(
        (name = "PDF Render", description = "Fill stored PDF templates with request data.")
    )
)]
pub struct ApiDoc;

/// Register every route served by the application.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").configure(render::handlers::config));
}

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = match AppState::new_with_config(config.clone()).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to connect to database. Please check DATABASE_URL in .env and ensure the database is running. Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("pdfrender")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let allowed_origins = config.allowed_origins.clone();

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(configure_app)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
