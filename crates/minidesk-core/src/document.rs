//! The document, the single entity persisted by Minidesk.

use serde::{Deserialize, Serialize};

/// A persisted note, as seen by application code.
///
/// Serialised in camelCase, which is also the shape the UI process receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
  /// Assigned by storage; never reused.
  pub id:         i64,
  pub title:      String,
  pub content:    String,
  /// Unix seconds. Set once at creation.
  pub created_at: i64,
  /// Unix seconds. Refreshed on every successful update; never less than
  /// `created_at`.
  pub updated_at: i64,
  pub is_shared:  bool,
}

/// Input to [`crate::store::DocumentStore::create`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDocument {
  pub title:   String,
  #[serde(default)]
  pub content: String,
}

impl NewDocument {
  /// A new document with empty content.
  pub fn new(title: impl Into<String>) -> Self {
    Self { title: title.into(), content: String::new() }
  }

  pub fn with_content(mut self, content: impl Into<String>) -> Self {
    self.content = content.into();
    self
  }
}

/// A partial update. `None` leaves the stored value untouched; `Some` replaces
/// it, so `Some(String::new())` clears the content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_shared: Option<bool>,
}

impl DocumentPatch {
  pub fn title(mut self, title: impl Into<String>) -> Self {
    self.title = Some(title.into());
    self
  }

  pub fn content(mut self, content: impl Into<String>) -> Self {
    self.content = Some(content.into());
    self
  }

  pub fn shared(mut self, is_shared: bool) -> Self {
    self.is_shared = Some(is_shared);
    self
  }

  /// True when no field is present. Applying an empty patch still refreshes
  /// `updated_at`.
  pub fn is_empty(&self) -> bool {
    self.title.is_none() && self.content.is_none() && self.is_shared.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn document_serialises_camel_case() {
    let doc = Document {
      id:         7,
      title:      "Plans".into(),
      content:    "".into(),
      created_at: 10,
      updated_at: 12,
      is_shared:  true,
    };
    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["createdAt"], 10);
    assert_eq!(json["updatedAt"], 12);
    assert_eq!(json["isShared"], true);
    assert!(json.get("created_at").is_none());
  }

  #[test]
  fn patch_distinguishes_absent_from_empty() {
    let absent: DocumentPatch = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
    assert_eq!(absent.content, None);

    let cleared: DocumentPatch = serde_json::from_str(r#"{"content":""}"#).unwrap();
    assert_eq!(cleared.content.as_deref(), Some(""));
    assert_eq!(cleared.title, None);
  }

  #[test]
  fn patch_builder_and_emptiness() {
    assert!(DocumentPatch::default().is_empty());
    let p = DocumentPatch::default().shared(false);
    assert!(!p.is_empty());
    assert_eq!(p.is_shared, Some(false));
  }

  #[test]
  fn new_document_content_defaults_to_empty() {
    let nd: NewDocument = serde_json::from_str(r#"{"title":"a"}"#).unwrap();
    assert_eq!(nd.content, "");
    assert_eq!(NewDocument::new("a").with_content("b").content, "b");
  }
}
