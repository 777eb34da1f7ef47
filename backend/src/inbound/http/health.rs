//! Liveness and readiness checks for orchestrators and load balancers.
//!
//! Readiness also asks each registered [`ReadinessCheck`] (the database pool
//! in production) whether its dependency answers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

/// Dependency consulted by the readiness check.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    /// Short name reported in the health body.
    fn name(&self) -> &'static str;

    /// Whether the dependency is currently usable.
    async fn is_ready(&self) -> bool;
}

/// Shared health state.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    checks: Vec<Arc<dyn ReadinessCheck>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl HealthState {
    /// Start live but not ready.
    pub fn new(checks: Vec<Arc<dyn ReadinessCheck>>) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            checks,
        }
    }

    /// Mark the server as accepting traffic.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness so orchestrators drain the instance during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    async fn readiness(&self) -> HealthBody {
        let mut checks = Vec::with_capacity(self.checks.len());
        let mut all_ok = self.ready.load(Ordering::Acquire);
        for check in &self.checks {
            let ok = check.is_ready().await;
            if !ok {
                warn!(check = check.name(), "readiness check failed");
            }
            all_ok &= ok;
            checks.push(CheckBody {
                name: check.name(),
                ok,
            });
        }
        HealthBody { ok: all_ok, checks }
    }
}

#[derive(Debug, Serialize)]
struct CheckBody {
    name: &'static str,
    ok: bool,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    ok: bool,
    checks: Vec<CheckBody>,
}

fn health_response(body: &HealthBody) -> HttpResponse {
    let mut response = if body.ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(body)
}

/// Readiness check: 200 once started and every dependency answers.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server or a dependency is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    health_response(&state.readiness().await)
}

/// Liveness check: 200 until [`HealthState::mark_unhealthy`] is called.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    health_response(&HealthBody {
        ok: state.is_alive(),
        checks: Vec::new(),
    })
}
