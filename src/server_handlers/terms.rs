use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::server::AppState;

/// GET /api/terms
/// Terms currently held in memory, newest first.
pub async fn terms_handler(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({"terms": state.catalog.loaded_terms()}))
}
