//! Server-Sent Events for live conversation updates

use crate::conversation::{ConversationEvent, ConversationSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Stream starting with the current snapshot followed by live events
pub fn sse_stream(
    snapshot: ConversationSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<ConversationEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(Event::default()
            .event("init")
            .data(json!({ "type": "init", "conversation": snapshot }).to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(to_axum_event(&event))),
        Err(e) => {
            // lagged clients resync from the next reset or snapshot fetch
            tracing::warn!(error = %e, "SSE subscriber lagged");
            None
        }
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn event_name(event: &ConversationEvent) -> &'static str {
    match event {
        ConversationEvent::MessageAppended { .. } => "message_appended",
        ConversationEvent::ContentUpdated { .. } => "content_updated",
        ConversationEvent::MessageCompleted { .. } => "message_completed",
        ConversationEvent::HistoryReset { .. } => "history_reset",
        ConversationEvent::Notice { .. } => "notice",
        ConversationEvent::Navigate { .. } => "navigate",
    }
}

fn to_axum_event(event: &ConversationEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event_name(event)).data(data)
}
