//! System endpoints invoked by the task publisher. These bypass the channel
//! filter and are never scoped to a tenant.

use actix_web::{HttpResponse, post, web};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route verify_all,
    route verify_monitor,
}

/// Schedule a verification task for every monitor of every channel
#[post("/jobs/verify")]
pub async fn verify_all(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.fan_out.trigger_all().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Monitors verified",
        "scheduled": report.scheduled,
        "failed": report.failed,
    })))
}

/// Probe one monitor; a failed probe answers 502 so the publisher may redeliver
#[post("/jobs/verify/{id}")]
pub async fn verify_monitor(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let log = state.executor.execute(&id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Monitor verified and log created",
        "data": log,
    })))
}
