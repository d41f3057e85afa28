use crate::app::AppState;
use async_stream::try_stream;
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use futures::Stream;
use std::{convert::Infallible, sync::Arc};

/// Live feed of signups, logins, referrals, and redemptions for the
/// dashboard.
pub async fn stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("new connection to event stream >>>");

    let mut rx = state.get_sender().subscribe();

    Sse::new(try_stream! {
        loop {
            match rx.recv().await {
                Ok(app_event) => {
                    match Event::default().json_data(&app_event) {
                        Ok(event) => yield event,
                        Err(e) => {
                            tracing::error!(error = ?e, "failed to encode app event");
                        }
                    }
                }

                Err(e) => {
                    tracing::error!(error = ?e, "failed to receive app event");
                }
            }
        }
    })
    .keep_alive(KeepAlive::default())
}
