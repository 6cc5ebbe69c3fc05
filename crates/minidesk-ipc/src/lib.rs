//! Request/response boundary between the Minidesk UI and backend processes.
//!
//! Every operation answers with an [`Envelope`]: either
//! `{"success": true, "data": ...}` or
//! `{"success": false, "error": {"message": ..., "code": ...}}`. Failures are
//! always encoded, never propagated, so the remote caller can branch on
//! `success` without knowing the backend's error types.
//!
//! # Wiring
//!
//! ```rust,ignore
//! let handlers = DocumentHandlers::new(Arc::new(db.documents()?));
//! minidesk_ipc::serve(stdin, stdout, &handlers).await?;
//! ```

pub mod envelope;
pub mod handlers;
pub mod request;
pub mod transport;

pub use envelope::{Envelope, ErrorBody, ErrorCode};
pub use handlers::DocumentHandlers;
pub use request::Request;
pub use transport::{Frame, Reply, TransportError, serve};
