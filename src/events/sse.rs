use axum::{
    http::{header::HeaderName, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::{stream, StreamExt};
use std::{convert::Infallible, time::Duration};

use super::EventBus;

/// Reconnect delay advertised to `EventSource` clients
pub const RETRY_AFTER: Duration = Duration::from_millis(3000);

/// Opens an SSE response subscribed to `bus`.
///
/// The first frame is the `retry:` hint, then one `data:` frame per published
/// event. A `:` comment goes out every `heartbeat` so proxies keep idle
/// connections open.
pub fn event_stream_response(bus: &dyn EventBus, heartbeat: Duration) -> Response {
    let retry = stream::once(async { Ok::<_, Infallible>(Event::default().retry(RETRY_AFTER)) });
    let events = bus
        .subscribe()
        .map(|frame| Ok::<_, Infallible>(Event::default().data(frame)));

    let sse = Sse::new(retry.chain(events)).keep_alive(KeepAlive::new().interval(heartbeat));

    (
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        sse,
    )
        .into_response()
}
