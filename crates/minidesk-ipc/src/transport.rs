//! Newline-delimited JSON transport.
//!
//! Each input line is a [`Frame`]; each output line is the matching
//! [`Reply`]. Replies are written in request order, one per non-blank line.
//!
//! ```text
//! → {"id":1,"request":{"channel":"document:get","payload":{"id":3}}}
//! ← {"id":1,"response":{"success":true,"data":null}}
//! ```

use minidesk_core::store::DocumentStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _};
use tracing::{debug, info, warn};

use crate::{
  envelope::{Envelope, ErrorBody, ErrorCode},
  handlers::DocumentHandlers,
  request::Request,
};

#[derive(Debug, Error)]
pub enum TransportError {
  #[error("transport I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to encode reply: {0}")]
  Encode(#[from] serde_json::Error),
}

pub type Result<T, E = TransportError> = std::result::Result<T, E>;

/// One request, tagged with a caller-chosen correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
  pub id:      u64,
  pub request: Request,
}

/// The answer to one [`Frame`]. `id` is absent only when the frame was too
/// malformed to recover it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
  #[serde(default)]
  pub id:       Option<u64>,
  pub response: Envelope<Value>,
}

/// Serve frames from `reader` until EOF, writing replies to `writer`.
///
/// Undecodable lines are answered with `UNKNOWN_ERROR` rather than ending the
/// loop; only I/O failures do that. Returns the number of replies written.
pub async fn serve<R, W, S>(
  mut reader: R,
  mut writer: W,
  handlers: &DocumentHandlers<S>,
) -> Result<u64>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
  S: DocumentStore,
{
  let mut buf = Vec::new();
  let mut served = 0u64;

  loop {
    buf.clear();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
      break;
    }

    let reply = match std::str::from_utf8(&buf) {
      Ok(line) if line.trim().is_empty() => continue,
      Ok(line) => answer(line.trim(), handlers).await,
      Err(e) => {
        warn!(error = %e, "frame is not valid UTF-8");
        malformed(None, format!("malformed request: {e}"))
      }
    };

    let mut bytes = serde_json::to_vec(&reply)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    served += 1;
  }

  info!(served, "input closed");
  Ok(served)
}

/// Decode one non-blank line and dispatch it.
async fn answer<S: DocumentStore>(line: &str, handlers: &DocumentHandlers<S>) -> Reply {
  match serde_json::from_str::<Frame>(line) {
    Ok(frame) => {
      debug!(id = frame.id, channel = frame.request.channel(), "frame received");
      Reply { id: Some(frame.id), response: handlers.dispatch(frame.request).await }
    }
    Err(e) => {
      warn!(error = %e, "malformed frame");
      malformed(recover_id(line), format!("malformed request: {e}"))
    }
  }
}

fn malformed(id: Option<u64>, message: String) -> Reply {
  Reply { id, response: Envelope::Failure(ErrorBody::new(ErrorCode::UnknownError, message)) }
}

/// Best-effort extraction of `id` from a line that failed to decode as a
/// [`Frame`].
fn recover_id(line: &str) -> Option<u64> {
  serde_json::from_str::<Value>(line).ok()?.get("id")?.as_u64()
}
