/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Persistent command answered by a second application.
//!
//! The program sends a `PLACE_ORDERSET` command and keeps resending it until
//! the writer answers with `PLACE_ORDERSET_RESPONSE`.
//!
//! Run with:
//! ```sh
//! cargo run --example command_roundtrip
//! ```

use ironbus::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

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
    let config = CommandServiceConfig::default()
        .with_resend_threshold(Duration::from_millis(300))
        .with_retry_interval(Duration::from_millis(100));

    let program = CommandService::start(
        &bus,
        domain,
        topics::COMMAND,
        topics::COMMAND_RESPONSE,
        config.clone(),
    )?;
    let writer = CommandService::start(
        &bus,
        domain,
        topics::COMMAND_RESPONSE,
        topics::COMMAND,
        config,
    )?;

    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel::<Command>();
    writer.register_command_listener(Arc::new(move |command: &Command| {
        let _ = inbound_tx.send(command.clone());
    }));
    program.register_response_listener(Arc::new(|response: &Command| {
        info!(
            id = %response.id,
            code = response.command_code,
            data = %response.data,
            "response received"
        );
    }));

    let serializer = DataSerializer::new();
    let command = Command::between(
        Application::TickProgram,
        Application::TickWriter,
        CommandCode::PlaceOrderset,
        serializer.serialize_place_order_set(42, OrderSetCategory::NewLimit),
    );
    let id = command.id.clone();
    program.send_persistent(command, 5);
    info!(%id, pending = program.pending_count(), "persistent command sent");

    let Some(request) = inbound_rx.recv().await else {
        anyhow::bail!("writer stopped before receiving the command");
    };
    match serializer.deserialize_place_order_set(&request.data) {
        Some((order_set, category)) => info!(order_set, %category, "writer placing order set"),
        None => warn!(data = %request.data, "writer received a malformed order set"),
    }

    let response_code = request
        .command()
        .and_then(CommandCode::response_code)
        .map_or(request.command_code, CommandCode::as_i32);
    let mut response = request.response_to(response_code, "OK");
    writer.send_command(&mut response);

    tokio::time::sleep(Duration::from_millis(200)).await;
    info!(%id, pending = program.is_pending(&id), "after response");

    program.stop_service();
    writer.stop_service();
    program.join().await;
    writer.join().await;
    bus.shutdown();
    Ok(())
}
