use crate::mcp::{Connect, SseBroadcaster, SseClientStream};
use actix::Addr;
use actix_web::http::header;
use actix_web::{error, web, Error, HttpResponse};

/// Long-lived keep-alive stream: one connected frame, then pings.
#[tracing::instrument(name = "SSE connection", skip(broadcaster))]
pub async fn events_handler(
    broadcaster: web::Data<Addr<SseBroadcaster>>,
) -> Result<HttpResponse, Error> {
    let handle = broadcaster.send(Connect).await.map_err(|err| {
        tracing::error!("SSE broadcaster unavailable: {}", err);
        error::ErrorServiceUnavailable("event channel unavailable")
    })?;
    let stream = SseClientStream::new(handle, broadcaster.get_ref().clone());

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(header::CacheControl(vec![header::CacheDirective::NoCache]))
        // Disable proxy buffering so frames go out as they are written
        .insert_header(("x-accel-buffering", "no"))
        .streaming(stream))
}
