//! JSON-lines request loop.
//!
//! One request object per input line, tagged by `op`:
//!
//! ```text
//! {"op":"predict","composition":{"Al":97.9,"Mg":1.0,"Si":0.6}}
//! {"op":"suggest","target":"YS","value":300,"tolerance":0.1,"count":5,"id":"r2"}
//! {"op":"health"}
//! ```
//!
//! One enveloped reply per output line, in request order. An optional `id`
//! is echoed back in `meta.id`. Blank lines are skipped. The loop ends on
//! EOF or cancellation.

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::service::{AlloyService, PredictRequest, SuggestRequest};

/// A decoded protocol request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Predict(PredictRequest),
    Suggest(SuggestRequest),
    Health,
    Info,
}

/// Handle one input line and return the serialized reply.
pub async fn handle_line(service: &AlloyService, line: &str) -> String {
    let mut value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return encode(&ApiErrorResponse::bad_request(format!("Invalid JSON: {e}"), None)),
    };
    let id = value.as_object_mut().and_then(|obj| obj.remove("id"));

    let request: Request = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => return encode(&ApiErrorResponse::bad_request(format!("Invalid request: {e}"), id)),
    };

    match request {
        Request::Predict(req) => match service.predict(req).await {
            Ok(resp) => encode(&ApiResponse::ok(resp, id)),
            Err(e) => encode(&ApiErrorResponse::from_service(&e, id)),
        },
        Request::Suggest(req) => match service.suggest(req).await {
            Ok(resp) => encode(&ApiResponse::ok(resp, id)),
            Err(e) => encode(&ApiErrorResponse::from_service(&e, id)),
        },
        Request::Health => encode(&ApiResponse::ok(service.health(), id)),
        Request::Info => encode(&ApiResponse::ok(service.info(), id)),
    }
}

fn encode<T: serde::Serialize>(reply: &T) -> String {
    serde_json::to_string(reply).unwrap_or_else(|e| {
        format!(r#"{{"error":{{"code":"INTERNAL_ERROR","message":"failed to encode reply: {e}"}}}}"#)
    })
}

/// Serve requests from `reader` until EOF or `cancel` fires.
///
/// Returns the number of requests handled.
pub async fn serve<R, W>(
    service: &AlloyService,
    reader: R,
    mut writer: W,
    cancel: CancellationToken,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0usize;

    loop {
        let line = tokio::select! {
            () = cancel.cancelled() => {
                info!("Protocol loop cancelled");
                break;
            }
            next = lines.next_line() => match next {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Input closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read request line");
                    return Err(e);
                }
            },
        };

        if line.trim().is_empty() {
            continue;
        }

        let reply = handle_line(service, &line).await;
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        handled += 1;
    }

    info!(requests = handled, "Protocol loop stopped");
    Ok(handled)
}
