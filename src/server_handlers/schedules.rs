use std::sync::Arc;
use std::time::Instant;

use actix_web::{web, HttpResponse};
use tracing::{info, warn};

use crate::catalog::TermCatalog;
use crate::error::ApiError;
use crate::generator::{CancelToken, GenerateRequest};
use crate::server::AppState;

/// Rejects requests the generator should never see.
pub fn validate_request(req: &GenerateRequest, max_input_courses: usize) -> Result<(), ApiError> {
    if req.term.trim().is_empty() {
        return Err(ApiError::BadRequest("term is required".to_string()));
    }
    if req.courses.is_empty() {
        return Err(ApiError::BadRequest("at least one course is required".to_string()));
    }
    if req.courses.len() > max_input_courses {
        return Err(ApiError::BadRequest(format!(
            "too many courses: {} (max {})",
            req.courses.len(),
            max_input_courses
        )));
    }
    for (i, course) in req.courses.iter().enumerate() {
        if course.course_key().is_none() {
            return Err(ApiError::BadRequest(format!(
                "course {}: unrecognized course code {:?}",
                i,
                format!("{} {}", course.subject, course.course_number).trim()
            )));
        }
    }
    Ok(())
}

/// Makes sure `term` is in memory, loading it from the course database when
/// one is configured.
async fn ensure_term_loaded(state: &AppState, term: &str) -> Result<(), ApiError> {
    if state.catalog.is_term_loaded(term) {
        return Ok(());
    }
    let Some(source) = state.source.clone() else {
        return Err(ApiError::NotFound(format!("Term not found: {}", term)));
    };

    let catalog: Arc<TermCatalog> = Arc::clone(&state.catalog);
    let term = term.to_string();
    tokio::task::spawn_blocking(move || source.load_term_if_needed(&catalog, &term))
        .await
        .map_err(|e| ApiError::Internal(format!("term load task failed: {}", e)))??;
    Ok(())
}

/// POST /api/schedules/generate
pub async fn generate_handler(
    state: web::Data<AppState>,
    body: web::Json<GenerateRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    validate_request(&req, state.max_input_courses)?;
    ensure_term_loaded(&state, &req.term).await?;

    let start = Instant::now();
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let permits = Arc::clone(&state.permits);
    let generator = Arc::clone(&state.generator);
    let term = req.term.clone();

    // waiting for a slot counts against the same deadline as the search
    let work = async move {
        let permit = permits
            .acquire_owned()
            .await
            .map_err(|_| ApiError::Internal("failed to acquire generator slot".to_string()))?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            generator.generate_response(&req, &worker_cancel)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("generation task failed: {}", e)))
    };

    match tokio::time::timeout(state.timeout, work).await {
        Ok(Ok(resp)) => {
            info!(
                %term,
                returned = resp.schedules.len(),
                total = resp.stats.total_generated,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "generate request served"
            );
            Ok(HttpResponse::Ok().json(resp))
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            // the worker notices on its next node and releases the permit
            cancel.cancel();
            let ms = state.timeout.as_millis() as u64;
            warn!(%term, timeout_ms = ms, "schedule generation timed out");
            Err(ApiError::Timeout(ms))
        }
    }
}
