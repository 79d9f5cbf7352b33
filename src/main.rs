#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod clock;
mod hours;
mod prelude;
mod server;
mod twiml;

use std::sync::Arc;

use clap::{Parser, crate_version};
use tokio::net::TcpListener;

use crate::{cli::Args, clock::SystemClock, prelude::*, server::AppState};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    let args = Args::parse();
    info!(version = crate_version!(), args.bind_address, "starting…");

    let window = args.business_hours.window().context("invalid business hours")?;
    info!(%window, forward_number = args.forward_number, "resolved the business hours");

    let state = AppState::builder()
        .window(window)
        .clock(Arc::new(SystemClock))
        .messenger(Arc::new(args.twilio.new_client()?))
        .record(args.voicemail.record())
        .forward_number(args.forward_number)
        .maybe_sms_from_number(args.sms_from_number)
        .build();

    let listener =
        TcpListener::bind(&args.bind_address).await.context("failed to bind to the address")?;
    info!("serving…");
    axum::serve(listener, server::router(state)).with_graceful_shutdown(shutdown_signal()).await?;

    info!("done!");
    Ok(())
}

/// Per <https://github.com/tokio-rs/axum/blob/main/examples/graceful-shutdown/src/main.rs>.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
