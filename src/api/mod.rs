pub mod handlers;
pub mod models;
pub mod openapi;

use crate::api::models::ApiError;
use crate::config::Config;
use crate::core::errors::BillbusterError;
use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use http::{HeaderValue, Method, StatusCode, header};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use handlers::SharedService;

/// Full application router: health check, `/api` routes, Swagger UI and the tower layers.
pub fn build_router(service: SharedService, config: &Config) -> Result<Router, BillbusterError> {
    Ok(Router::new()
        .route("/", get(|| async { "OK" }))
        .nest("/api", handlers::api_routes(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .fallback(not_found)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(middleware::map_response(json_error_body))
        .layer(cors_layer(config)?)
        .layer(TraceLayer::new_for_http()))
}

async fn not_found() -> ApiError {
    ApiError(BillbusterError::RouteNotFound)
}

// The method router and the timeout layer answer with empty bodies.
async fn json_error_body(response: Response) -> Response {
    if response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }
    let error = match response.status() {
        StatusCode::METHOD_NOT_ALLOWED => BillbusterError::MethodNotAllowed,
        StatusCode::REQUEST_TIMEOUT => BillbusterError::RequestTimeout,
        _ => return response,
    };
    let allow = response.headers().get(header::ALLOW).cloned();
    let mut json = ApiError(error).into_response();
    if let Some(allow) = allow {
        json.headers_mut().insert(header::ALLOW, allow);
    }
    json
}

// Production only answers the configured frontend; development accepts any origin.
fn cors_layer(config: &Config) -> Result<CorsLayer, BillbusterError> {
    if !config.is_production() {
        return Ok(CorsLayer::permissive());
    }
    let origin = config
        .frontend_url
        .parse::<HeaderValue>()
        .map_err(|e| BillbusterError::ConfigError(format!("FRONTEND_URL is not a valid origin: {}", e)))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}
