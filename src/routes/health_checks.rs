use actix_web::{get, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

/// Process start, for the uptime figure
pub struct StartedAt(pub Instant);

impl Default for StartedAt {
    fn default() -> Self {
        Self(Instant::now())
    }
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Liveness only; never touches the downstream executor.
#[get("/health")]
pub async fn health_check(started_at: web::Data<StartedAt>) -> HttpResponse {
    HttpResponse::Ok().json(HealthCheckResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: started_at.0.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}
