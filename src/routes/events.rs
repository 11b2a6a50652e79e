use crate::{auth::Authenticate, auth::AuthenticatedUser, state::AppState};
use actix_web::{get, web, HttpResponse};
use futures::stream::{self, StreamExt};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;

/// Server-Sent Events feed of the event bus.
///
/// Each published event becomes one frame whose `event:` is the channel name
/// (`task_update`, `user_session_update`) and whose `data:` is the JSON
/// payload. The feed is read-only: clients cannot publish through it.
#[get("/events", wrap = "Authenticate")]
pub async fn stream_events(state: web::Data<AppState>, user: AuthenticatedUser) -> HttpResponse {
    let receiver = state.events.subscribe();
    log::debug!("user {} subscribed to events", user.user_id);

    let hello = stream::once(async { Ok::<_, Infallible>(web::Bytes::from_static(b": connected\n\n")) });
    let updates = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let frame = web::Bytes::from(event.to_sse_frame());
                    return Some((Ok::<_, Infallible>(frame), receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("event listener lagged, {} event(s) dropped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(hello.chain(updates))
}
