use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use std::time::Instant;

/// Process start time, injected as app data so the health endpoint can
/// report uptime.
#[derive(Debug, Clone, Copy)]
pub struct ServerStart(pub Instant);

/// Health check endpoint
///
/// Returns the current status of the API, a timestamp, and seconds of uptime.
#[get("/health")]
pub async fn health(start: web::Data<ServerStart>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "timestamp": Utc::now(),
        "uptime": start.0.elapsed().as_secs_f64()
    }))
}
