use actix_web::{HttpResponse, get, post, web};
use uppe_core::NewLog;

use crate::channel::Channel;
use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route list_logs,
    route append_log,
}

#[get("/monitors/{id}/logs")]
pub async fn list_logs(
    state: web::Data<AppState>,
    channel: Channel,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let logs = state.logs.list(channel.as_str(), &id).await?;
    Ok(HttpResponse::Ok().json(logs))
}

/// Direct log sink, independent of verification
#[post("/monitors/{id}/logs")]
pub async fn append_log(
    state: web::Data<AppState>,
    channel: Channel,
    id: web::Path<String>,
    body: web::Json<NewLog>,
) -> Result<HttpResponse, ApiError> {
    let log = state.logs.append(channel.as_str(), &id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(log))
}
