//! Server-Sent Events support

use crate::runtime::{EngineEvent, IntakeSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, starting with an `init` snapshot
pub fn sse_stream(
    init: IntakeSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<EngineEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        let data = json!({ "type": "init", "intake": init });
        Ok(Event::default().event("init").data(data.to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(engine_event_to_axum(&event))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn event_name(event: &EngineEvent) -> &'static str {
    match event {
        EngineEvent::Message { .. } => "message",
        EngineEvent::StateChange { .. } => "state_change",
        EngineEvent::Focus => "focus",
        EngineEvent::ExchangeComplete => "exchange_complete",
        EngineEvent::Error { .. } => "error",
    }
}

fn engine_event_to_axum(event: &EngineEvent) -> Event {
    let data = serde_json::to_string(event)
        .unwrap_or_else(|e| json!({ "type": "error", "message": e.to_string() }).to_string());
    Event::default().event(event_name(event)).data(data)
}
