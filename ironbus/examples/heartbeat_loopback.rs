/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Two applications exchanging heartbeats over the loopback bus.
//!
//! Run with:
//! ```sh
//! cargo run --example heartbeat_loopback
//! ```

use ironbus::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let (bus, _loopback) = MessageBus::in_memory();
    let domain = DomainId::new(0);

    let program = HeartbeatService::start(
        &bus,
        HeartbeatConfig::new("TICK", Application::TickProgram.as_i32(), domain)
            .with_interval(Duration::from_millis(500)),
    )?;
    let writer = HeartbeatService::start(
        &bus,
        HeartbeatConfig::new("WRITER", Application::TickWriter.as_i32(), domain)
            .with_interval(Duration::from_millis(700)),
    )?;

    info!(program = program.label(), writer = writer.label(), "heartbeat services started");

    program.register_heartbeat_listener(Arc::new(|message: &InfoMessage| {
        info!(from = message.from_app, data = %message.data, "program saw heartbeat");
    }));
    writer.register_heartbeat_listener(Arc::new(|message: &InfoMessage| {
        match message.info() {
            Some(InfoCode::Shutdown) => info!(from = message.from_app, "peer is shutting down"),
            _ => info!(from = message.from_app, data = %message.data, "writer saw heartbeat"),
        }
    }));

    program.start_sending_heartbeat();
    writer.start_sending_heartbeat();

    tokio::time::sleep(Duration::from_secs(3)).await;

    program.stop_sending_heartbeat();
    program.send_shutdown_message();
    tokio::time::sleep(Duration::from_millis(100)).await;

    program.stop_service();
    writer.stop_service();
    program.join().await;
    writer.join().await;
    bus.shutdown();

    info!("done");
    Ok(())
}
