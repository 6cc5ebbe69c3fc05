//! Requests accepted across the boundary, one variant per channel.
//!
//! | Channel | Payload | Success data |
//! |---------|---------|--------------|
//! | `document:create`    | `{"title", "content"?}` | `Document` |
//! | `document:get`       | `{"id"}` | `Document` or `null` |
//! | `document:getAll`    | none | `Document[]` |
//! | `document:update`    | `{"id", "title"?, "content"?, "isShared"?}` | `Document` |
//! | `document:delete`    | `{"id"}` | `{"success": bool}` |
//! | `document:getRecent` | limit or none (20); negative is unbounded | `Document[]` |
//! | `document:getShared` | none | `Document[]` |
//! | `document:search`    | `{"query"}` | `Document[]` |

use minidesk_core::document::{DocumentPatch, NewDocument};
use serde::{Deserialize, Serialize};

/// A decoded boundary request: `{"channel": "document:…", "payload": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload")]
pub enum Request {
  #[serde(rename = "document:create")]
  Create(CreateRequest),
  #[serde(rename = "document:get")]
  Get(IdRequest),
  #[serde(rename = "document:getAll")]
  GetAll,
  #[serde(rename = "document:update")]
  Update(UpdateRequest),
  #[serde(rename = "document:delete")]
  Delete(IdRequest),
  /// `None` means the default limit; a negative limit means no limit.
  #[serde(rename = "document:getRecent")]
  GetRecent(Option<i64>),
  #[serde(rename = "document:getShared")]
  GetShared,
  #[serde(rename = "document:search")]
  Search(SearchRequest),
}

impl Request {
  /// The channel name this request travels on.
  pub fn channel(&self) -> &'static str {
    match self {
      Self::Create(_) => "document:create",
      Self::Get(_) => "document:get",
      Self::GetAll => "document:getAll",
      Self::Update(_) => "document:update",
      Self::Delete(_) => "document:delete",
      Self::GetRecent(_) => "document:getRecent",
      Self::GetShared => "document:getShared",
      Self::Search(_) => "document:search",
    }
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
  pub title:   String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
}

impl From<CreateRequest> for NewDocument {
  fn from(req: CreateRequest) -> Self {
    NewDocument { title: req.title, content: req.content.unwrap_or_default() }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRequest {
  pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
  pub id:    i64,
  #[serde(flatten)]
  pub patch: DocumentPatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
  pub query: String,
}

/// Success data of `document:delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
  pub success: bool,
}
