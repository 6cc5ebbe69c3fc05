//! The `DocumentStore` trait.
//!
//! Implemented by storage backends (e.g. `minidesk-store-sqlite`). The IPC
//! boundary depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  Classify,
  document::{Document, DocumentPatch, NewDocument},
};

/// Row cap used by [`DocumentStore::get_recent`] when the caller gives none.
pub const DEFAULT_RECENT_LIMIT: usize = 20;

/// Abstraction over a document persistence backend.
///
/// Every list operation returns documents most-recently-updated first.
/// Validation failures and missing documents must surface as errors whose
/// [`Classify::kind`] is `Validation` / `NotFound` respectively.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  /// Validate and persist a new document. `created_at == updated_at` and
  /// `is_shared == false` on the returned value.
  fn create(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  /// Retrieve a document by id. Returns `None` if not found.
  fn get_by_id(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  fn get_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  /// Apply the present fields of `patch` and refresh `updated_at`.
  ///
  /// Fails with a not-found error if `id` does not exist, in which case
  /// nothing is written.
  fn update(
    &self,
    id: i64,
    patch: DocumentPatch,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  /// Remove a document. Returns whether a row was actually deleted.
  fn delete(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Like [`get_all`](Self::get_all), capped to `limit` rows.
  fn get_recent(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  fn get_shared(
    &self,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  /// Substring match on the title. An empty query matches everything.
  fn search_by_title<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;
}
