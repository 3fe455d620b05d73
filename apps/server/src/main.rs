#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::{Logger, from_fn};
use actix_web::{App, HttpServer, web};
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;
use uppe_core::jobs::FanOutScheduler;

mod channel;
mod config;
mod error;
mod routes;
mod state;

use config::Config;
use error::{ApiError, AppError};
use logger::init_tracing;
use state::AppState;

/// Multi-tenant uptime monitoring API
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML config file (default: $XDG_CONFIG_HOME/uppe/server.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_config(cli.config.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;

    if cli.print_config {
        println!("{config}");
        return Ok(());
    }
    info!("{config}");

    let state = AppState::from_config(&config).await?;

    if let Some(period) = config.fan_out_interval() {
        info!(period_seconds = period.as_secs(), "Starting in-process fan-out scheduler");
        FanOutScheduler::new(state.fan_out.clone(), period).spawn();
    }

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    run_server(addr, state).await
}

async fn run_server(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    let state = web::Data::new(state);

    info!(%addr, "Starting HTTP server");
    HttpServer::new(move || build_app(state.clone())).bind(addr)?.run().await?;

    Ok(())
}

/// The full application: shared state, JSON error mapping, the channel filter
/// and every route
fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let json_config =
        web::JsonConfig::default().error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());

    App::new()
        .app_data(state)
        .app_data(json_config)
        .wrap(from_fn(channel::require_channel))
        .wrap(Logger::default())
        .configure(routes::routes)
}
