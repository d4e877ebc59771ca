use crate::mcp::{sse_frame, Dispatcher, JsonRpcRequest, MalformedRequest};
use actix_web::http::header::{self, HeaderMap};
use actix_web::{error::ResponseError, http::StatusCode, web, HttpRequest, HttpResponse};
use serde_json::json;

/// Bodies rejected before they reach the dispatcher
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("{0}")]
    Malformed(MalformedRequest),
}

impl From<MalformedRequest> for RequestError {
    fn from(err: MalformedRequest) -> Self {
        Self::Malformed(err)
    }
}

impl ResponseError for RequestError {
    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::InvalidJson(_) => "Invalid JSON".to_string(),
            Self::Malformed(err) => err.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": message,
            "details": self.to_string(),
        }))
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// Only a caller that accepts SSE but not JSON gets the streamed reply
fn wants_event_stream(headers: &HeaderMap) -> bool {
    let accept = headers
        .get_all(header::ACCEPT)
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join(",");

    accept.contains("text/event-stream") && !accept.contains("application/json")
}

#[tracing::instrument(name = "JSON-RPC call", skip(req, body, dispatcher))]
pub async fn rpc_handler(
    req: HttpRequest,
    body: web::Bytes,
    dispatcher: web::Data<Dispatcher>,
) -> Result<HttpResponse, RequestError> {
    let value = serde_json::from_slice(&body).map_err(|err| {
        tracing::warn!("Rejecting unparseable JSON-RPC body: {}", err);
        RequestError::InvalidJson(err.to_string())
    })?;
    let request = JsonRpcRequest::from_value(value).map_err(|err| {
        tracing::warn!("Rejecting malformed JSON-RPC body: {}", err);
        RequestError::from(err)
    })?;

    let response = dispatcher.handle(request).await;

    if wants_event_stream(req.headers()) {
        let data = serde_json::to_value(&response).unwrap_or_else(|_| json!({}));
        return Ok(HttpResponse::Ok()
            .content_type("text/event-stream")
            .insert_header(header::CacheControl(vec![header::CacheDirective::NoCache]))
            .body(sse_frame(Some("message"), &data)));
    }

    Ok(HttpResponse::Ok().json(response))
}
