//! The SQLite implementation of [`DocumentStore`].

use minidesk_core::{
  document::{Document, DocumentPatch, NewDocument},
  store::DocumentStore,
  validate::validate_title,
};
use rusqlite::{OptionalExtension as _, params};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{RawDocument, like_substring, now},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Document persistence over an already-migrated connection.
///
/// Obtain one from [`crate::Database::documents`]. Cloning is cheap; the
/// inner connection handle is shared.
#[derive(Clone)]
pub struct SqliteDocumentStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDocumentStore {
  pub fn new(conn: tokio_rusqlite::Connection) -> Self { Self { conn } }

  /// Run a `SELECT` returning document rows and map them to entities.
  async fn query_documents(
    &self,
    sql: &'static str,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<Document>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawDocument::into_document).collect())
  }

  /// Overwrite `updatedAt` directly, bypassing the service rules.
  #[cfg(test)]
  pub(crate) async fn force_updated_at(&self, id: i64, updated_at: i64) {
    self
      .force_timestamp("UPDATE documents SET updatedAt = ?1 WHERE id = ?2", id, updated_at)
      .await;
  }

  #[cfg(test)]
  pub(crate) async fn force_created_at(&self, id: i64, created_at: i64) {
    self
      .force_timestamp("UPDATE documents SET createdAt = ?1 WHERE id = ?2", id, created_at)
      .await;
  }

  #[cfg(test)]
  async fn force_timestamp(&self, sql: &'static str, id: i64, value: i64) {
    self
      .conn
      .call(move |conn| {
        conn.execute(sql, params![value, id])?;
        Ok(())
      })
      .await
      .unwrap();
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteDocumentStore {
  type Error = Error;

  async fn create(&self, input: NewDocument) -> Result<Document> {
    validate_title(&input.title)?;

    let timestamp = now();
    let NewDocument { title, content } = input;
    let (title_param, content_param) = (title.clone(), content.clone());

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (title, content, createdAt, updatedAt, isShared)
           VALUES (?1, ?2, ?3, ?3, 0)",
          params![title_param, content_param, timestamp],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    debug!(id, "created document");
    Ok(Document {
      id,
      title,
      content,
      created_at: timestamp,
      updated_at: timestamp,
      is_shared: false,
    })
  }

  async fn get_by_id(&self, id: i64) -> Result<Option<Document>> {
    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, title, content, createdAt, updatedAt, isShared
             FROM documents WHERE id = ?1",
            params![id],
            RawDocument::from_row,
          )
          .optional()?)
      })
      .await?;

    Ok(raw.map(RawDocument::into_document))
  }

  async fn get_all(&self) -> Result<Vec<Document>> {
    self
      .query_documents(
        "SELECT id, title, content, createdAt, updatedAt, isShared
         FROM documents
         ORDER BY updatedAt DESC, id DESC",
        Vec::new(),
      )
      .await
  }

  async fn update(&self, id: i64, patch: DocumentPatch) -> Result<Document> {
    if let Some(title) = &patch.title {
      validate_title(title)?;
    }

    let timestamp = now();
    let DocumentPatch { title, content, is_shared } = patch;

    // Absent fields bind NULL and COALESCE keeps the stored value; every
    // column involved is NOT NULL so NULL never means "clear".
    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE documents SET
             title     = COALESCE(?1, title),
             content   = COALESCE(?2, content),
             isShared  = COALESCE(?3, isShared),
             updatedAt = MAX(?4, createdAt)
           WHERE id = ?5",
          params![title, content, is_shared, timestamp, id],
        )?;
        if changed == 0 {
          return Ok(None);
        }

        let raw = tx.query_row(
          "SELECT id, title, content, createdAt, updatedAt, isShared
           FROM documents WHERE id = ?1",
          params![id],
          RawDocument::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    let document = raw
      .map(RawDocument::into_document)
      .ok_or(minidesk_core::Error::DocumentNotFound(id))?;
    debug!(id, "updated document");
    Ok(document)
  }

  async fn delete(&self, id: i64) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?)
      })
      .await?;

    debug!(id, removed, "delete document");
    Ok(removed > 0)
  }

  async fn get_recent(&self, limit: usize) -> Result<Vec<Document>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    self
      .query_documents(
        "SELECT id, title, content, createdAt, updatedAt, isShared
         FROM documents
         ORDER BY updatedAt DESC, id DESC
         LIMIT ?1",
        vec![limit.into()],
      )
      .await
  }

  async fn get_shared(&self) -> Result<Vec<Document>> {
    self
      .query_documents(
        "SELECT id, title, content, createdAt, updatedAt, isShared
         FROM documents
         WHERE isShared = 1
         ORDER BY updatedAt DESC, id DESC",
        Vec::new(),
      )
      .await
  }

  async fn search_by_title<'a>(&'a self, query: &'a str) -> Result<Vec<Document>> {
    let pattern = like_substring(query);
    self
      .query_documents(
        r"SELECT id, title, content, createdAt, updatedAt, isShared
          FROM documents
          WHERE title LIKE ?1 ESCAPE '\'
          ORDER BY updatedAt DESC, id DESC",
        vec![pattern.into()],
      )
      .await
  }
}
