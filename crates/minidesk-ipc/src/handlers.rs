//! Per-channel handlers that turn store results into [`Envelope`]s.

use std::{fmt, sync::Arc, time::Duration};

use minidesk_core::{
  Classify,
  document::{Document, NewDocument},
  store::{DEFAULT_RECENT_LIMIT, DocumentStore},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::{
  envelope::{Envelope, ErrorBody, ErrorCode},
  request::{CreateRequest, DeleteResponse, IdRequest, Request, SearchRequest, UpdateRequest},
};

/// Exposes every [`DocumentStore`] operation as an envelope-returning call.
///
/// No method returns `Result`: each failure is logged and encoded as a
/// failed envelope.
pub struct DocumentHandlers<S> {
  store:   Arc<S>,
  timeout: Option<Duration>,
}

impl<S> Clone for DocumentHandlers<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store), timeout: self.timeout } }
}

impl<S: DocumentStore> DocumentHandlers<S> {
  /// Handlers that wait on the store for as long as it takes.
  pub fn new(store: Arc<S>) -> Self { Self { store, timeout: None } }

  /// Bound every [`dispatch`](Self::dispatch) by `timeout`. An elapsed
  /// request answers `UNKNOWN_ERROR`.
  ///
  /// Only the waiting is abandoned. A statement already handed to the
  /// database thread still runs, so a timed-out create, update or delete may
  /// have been committed anyway.
  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  // ─── Channels ──────────────────────────────────────────────────────────────

  pub async fn create(&self, req: CreateRequest) -> Envelope<Document> {
    let input: NewDocument = req.into();
    encode("document:create", self.store.create(input).await)
  }

  pub async fn get(&self, req: IdRequest) -> Envelope<Option<Document>> {
    encode("document:get", self.store.get_by_id(req.id).await)
  }

  pub async fn get_all(&self) -> Envelope<Vec<Document>> {
    encode("document:getAll", self.store.get_all().await)
  }

  pub async fn update(&self, req: UpdateRequest) -> Envelope<Document> {
    encode("document:update", self.store.update(req.id, req.patch).await)
  }

  pub async fn delete(&self, req: IdRequest) -> Envelope<DeleteResponse> {
    encode("document:delete", self.store.delete(req.id).await)
      .map(|success| DeleteResponse { success })
  }

  /// A negative `limit` returns every document, as SQLite's `LIMIT -1` does.
  pub async fn get_recent(&self, limit: Option<i64>) -> Envelope<Vec<Document>> {
    let limit = limit.map_or(DEFAULT_RECENT_LIMIT, |n| usize::try_from(n).unwrap_or(usize::MAX));
    encode("document:getRecent", self.store.get_recent(limit).await)
  }

  pub async fn get_shared(&self) -> Envelope<Vec<Document>> {
    encode("document:getShared", self.store.get_shared().await)
  }

  pub async fn search(&self, req: SearchRequest) -> Envelope<Vec<Document>> {
    encode("document:search", self.store.search_by_title(&req.query).await)
  }

  // ─── Dispatch ──────────────────────────────────────────────────────────────

  /// Route a decoded request to its channel, applying the configured timeout.
  pub async fn dispatch(&self, request: Request) -> Envelope<Value> {
    let channel = request.channel();
    debug!(channel, "dispatching request");

    let Some(limit) = self.timeout else {
      return self.route(request).await;
    };

    match tokio::time::timeout(limit, self.route(request)).await {
      Ok(envelope) => envelope,
      Err(_) => {
        error!(channel, ?limit, "request timed out");
        Envelope::Failure(ErrorBody::new(
          ErrorCode::UnknownError,
          format!("{channel} timed out after {} ms", limit.as_millis()),
        ))
      }
    }
  }

  async fn route(&self, request: Request) -> Envelope<Value> {
    match request {
      Request::Create(req) => to_value(self.create(req).await),
      Request::Get(req) => to_value(self.get(req).await),
      Request::GetAll => to_value(self.get_all().await),
      Request::Update(req) => to_value(self.update(req).await),
      Request::Delete(req) => to_value(self.delete(req).await),
      Request::GetRecent(limit) => to_value(self.get_recent(limit).await),
      Request::GetShared => to_value(self.get_shared().await),
      Request::Search(req) => to_value(self.search(req).await),
    }
  }
}

/// Log and encode a store failure; pass data through untouched.
fn encode<T, E>(channel: &'static str, result: Result<T, E>) -> Envelope<T>
where
  E: Classify + fmt::Display,
{
  match result {
    Ok(data) => Envelope::Success(data),
    Err(e) => {
      error!(channel, error = %e, "request failed");
      Envelope::Failure(ErrorBody::from_error(&e))
    }
  }
}

fn to_value<T: Serialize>(envelope: Envelope<T>) -> Envelope<Value> {
  match envelope {
    Envelope::Success(data) => match serde_json::to_value(data) {
      Ok(value) => Envelope::Success(value),
      Err(e) => {
        error!(error = %e, "failed to serialise response");
        Envelope::Failure(ErrorBody::new(ErrorCode::UnknownError, e.to_string()))
      }
    },
    Envelope::Failure(body) => Envelope::Failure(body),
  }
}

#[cfg(test)]
mod tests {
  use std::{
    future::{Future, pending},
    sync::atomic::{AtomicUsize, Ordering},
  };

  use minidesk_core::document::DocumentPatch;
  use minidesk_store_sqlite::{Database, SqliteDocumentStore};
  use serde_json::json;

  use super::*;

  async fn handlers() -> DocumentHandlers<SqliteDocumentStore> {
    let db = Database::open_in_memory().await.unwrap();
    DocumentHandlers::new(Arc::new(db.documents().unwrap()))
  }

  fn create_req(title: &str) -> CreateRequest {
    CreateRequest { title: title.to_owned(), content: None }
  }

  #[tokio::test]
  async fn create_then_get() {
    let h = handlers().await;

    let doc = h.create(create_req("Hello")).await.into_result().unwrap();
    let got = h.get(IdRequest { id: doc.id }).await.into_result().unwrap();
    assert_eq!(got, Some(doc));

    let missing = h.get(IdRequest { id: 999 }).await;
    assert_eq!(missing, Envelope::Success(None));
  }

  #[tokio::test]
  async fn validation_failure_is_encoded() {
    let h = handlers().await;
    let env = h.create(create_req("   ")).await;
    let err = env.into_result().unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(err.message, "Document title cannot be empty");
  }

  #[tokio::test]
  async fn update_missing_is_not_found() {
    let h = handlers().await;
    let env = h
      .update(UpdateRequest { id: 42, patch: DocumentPatch::default().title("x") })
      .await;
    assert_eq!(env.code(), Some(ErrorCode::NotFound));
  }

  #[tokio::test]
  async fn delete_reports_success_flag() {
    let h = handlers().await;
    let doc = h.create(create_req("bye")).await.into_result().unwrap();

    let first = h.delete(IdRequest { id: doc.id }).await;
    assert_eq!(first, Envelope::Success(DeleteResponse { success: true }));
    let second = h.delete(IdRequest { id: doc.id }).await;
    assert_eq!(second, Envelope::Success(DeleteResponse { success: false }));
  }

  #[tokio::test]
  async fn recent_defaults_to_twenty() {
    let h = handlers().await;
    for i in 0..25 {
      h.create(create_req(&format!("doc {i}"))).await.into_result().unwrap();
    }
    let all = h.get_recent(None).await.into_result().unwrap();
    assert_eq!(all.len(), DEFAULT_RECENT_LIMIT);
    let few = h.get_recent(Some(3)).await.into_result().unwrap();
    assert_eq!(few.len(), 3);
    let unbounded = h.get_recent(Some(-1)).await.into_result().unwrap();
    assert_eq!(unbounded.len(), 25);
  }

  #[tokio::test]
  async fn dispatch_produces_wire_shape() {
    let h = handlers().await;

    let created = h
      .dispatch(serde_json::from_value(json!({
        "channel": "document:create",
        "payload": { "title": "My Document" }
      })).unwrap())
      .await;
    let value = serde_json::to_value(&created).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["title"], "My Document");
    assert_eq!(value["data"]["isShared"], false);

    let shared = h
      .dispatch(Request::Update(UpdateRequest {
        id:    value["data"]["id"].as_i64().unwrap(),
        patch: DocumentPatch::default().shared(true),
      }))
      .await;
    assert!(shared.is_success());

    let found = h
      .dispatch(Request::Search(SearchRequest { query: "doc".into() }))
      .await
      .into_result()
      .unwrap();
    assert_eq!(found.as_array().unwrap().len(), 1);

    let listed = h.dispatch(Request::GetShared).await.into_result().unwrap();
    assert_eq!(listed[0]["title"], "My Document");
  }

  #[tokio::test]
  async fn storage_failure_is_database_error() {
    let mut db = Database::open_in_memory().await.unwrap();
    let h = DocumentHandlers::new(Arc::new(db.documents().unwrap()));
    db.close().await.unwrap();

    let env = h.dispatch(Request::GetAll).await;
    assert_eq!(env.code(), Some(ErrorCode::DatabaseError));
  }

  // ─── Timeout ───────────────────────────────────────────────────────────────

  /// A store that never answers. `create` records the write before
  /// stalling, like a statement already queued on the database thread.
  #[derive(Default)]
  struct StalledStore {
    created: AtomicUsize,
  }

  impl DocumentStore for StalledStore {
    type Error = minidesk_core::Error;

    fn create(
      &self,
      _: NewDocument,
    ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_ {
      async move {
        self.created.fetch_add(1, Ordering::SeqCst);
        pending::<Result<Document, Self::Error>>().await
      }
    }

    fn get_by_id(
      &self,
      _: i64,
    ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_ {
      pending()
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_ {
      pending()
    }

    fn update(
      &self,
      id: i64,
      _: DocumentPatch,
    ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_ {
      async move { Err(minidesk_core::Error::DocumentNotFound(id)) }
    }

    fn delete(&self, _: i64) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
      pending()
    }

    fn get_recent(
      &self,
      _: usize,
    ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_ {
      pending()
    }

    fn get_shared(&self) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_ {
      pending()
    }

    fn search_by_title<'a>(
      &'a self,
      _: &'a str,
    ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a {
      pending()
    }
  }

  #[tokio::test]
  async fn elapsed_request_is_unknown_error() {
    let h = DocumentHandlers::new(Arc::new(StalledStore::default()))
      .with_timeout(Some(Duration::from_millis(20)));

    let env = h.dispatch(Request::GetAll).await;
    let err = env.into_result().unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownError);
    assert!(err.message.contains("document:getAll"));
  }

  #[tokio::test]
  async fn fast_failure_beats_timeout() {
    let h = DocumentHandlers::new(Arc::new(StalledStore::default()))
      .with_timeout(Some(Duration::from_secs(5)));

    let env = h
      .dispatch(Request::Update(UpdateRequest { id: 1, patch: DocumentPatch::default() }))
      .await;
    assert_eq!(env.code(), Some(ErrorCode::NotFound));
  }

  #[tokio::test]
  async fn timed_out_write_may_still_have_happened() {
    let h = DocumentHandlers::new(Arc::new(StalledStore::default()))
      .with_timeout(Some(Duration::from_millis(20)));

    let env = h
      .dispatch(Request::Create(CreateRequest { title: "late".into(), content: None }))
      .await;
    assert_eq!(env.code(), Some(ErrorCode::UnknownError));
    assert_eq!(h.store().created.load(Ordering::SeqCst), 1);
  }
}
