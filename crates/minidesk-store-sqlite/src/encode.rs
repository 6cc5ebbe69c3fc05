//! Conversions between `documents` rows and [`Document`] values.
//!
//! Timestamps are stored as integer Unix seconds. `isShared` is stored as
//! `0`/`1` since SQLite has no boolean type.

use chrono::Utc;
use minidesk_core::document::Document;

/// The current time in Unix seconds.
pub fn now() -> i64 { Utc::now().timestamp() }

/// Escape `%`, `_` and `\` so `query` matches literally inside
/// `LIKE ... ESCAPE '\'`, then wrap it for a substring match.
pub fn like_substring(query: &str) -> String {
  let mut pattern = String::with_capacity(query.len() + 2);
  pattern.push('%');
  for c in query.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Values read directly from a `documents` row.
pub struct RawDocument {
  pub id:         i64,
  pub title:      String,
  pub content:    String,
  pub created_at: i64,
  pub updated_at: i64,
  pub is_shared:  i64,
}

impl RawDocument {
  /// Expects `id, title, content, createdAt, updatedAt, isShared` in order.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      title:      row.get(1)?,
      content:    row.get(2)?,
      created_at: row.get(3)?,
      updated_at: row.get(4)?,
      is_shared:  row.get(5)?,
    })
  }

  pub fn into_document(self) -> Document {
    Document {
      id:         self.id,
      title:      self.title,
      content:    self.content,
      created_at: self.created_at,
      updated_at: self.updated_at,
      is_shared:  self.is_shared == 1,
    }
  }
}
