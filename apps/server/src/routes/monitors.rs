use actix_web::{HttpResponse, delete, get, post, put, web};
use uppe_core::{MonitorPatch, NewMonitor};

use crate::channel::Channel;
use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route create_monitor,
    route list_monitors,
    route update_monitor,
    route delete_monitor,
}

#[post("/monitors")]
pub async fn create_monitor(
    state: web::Data<AppState>,
    channel: Channel,
    body: web::Json<NewMonitor>,
) -> Result<HttpResponse, ApiError> {
    let monitor = state.registry.create(channel.as_str(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(monitor))
}

/// Monitors of the calling channel, in store key order
#[get("/monitors")]
pub async fn list_monitors(state: web::Data<AppState>, channel: Channel) -> Result<HttpResponse, ApiError> {
    let monitors = state.registry.list(channel.as_str()).await?;
    Ok(HttpResponse::Ok().json(monitors))
}

#[put("/monitors/{id}")]
pub async fn update_monitor(
    state: web::Data<AppState>,
    channel: Channel,
    id: web::Path<String>,
    body: web::Json<MonitorPatch>,
) -> Result<HttpResponse, ApiError> {
    let monitor = state.registry.update(channel.as_str(), &id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(monitor))
}

#[delete("/monitors/{id}")]
pub async fn delete_monitor(
    state: web::Data<AppState>,
    channel: Channel,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state.registry.delete(channel.as_str(), &id).await?;
    Ok(HttpResponse::NoContent().finish())
}
