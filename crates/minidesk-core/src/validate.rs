//! Input validation shared by every backend.

use crate::{Error, Result};

/// Upper bound on title length, counted in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Reject empty, whitespace-only, and over-long titles.
pub fn validate_title(title: &str) -> Result<()> {
  if title.trim().is_empty() {
    return Err(Error::Validation("Document title cannot be empty".into()));
  }
  if title.chars().count() > MAX_TITLE_CHARS {
    return Err(Error::Validation(format!(
      "Document title cannot exceed {MAX_TITLE_CHARS} characters"
    )));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_ordinary_title() {
    assert!(validate_title("Groceries").is_ok());
  }

  #[test]
  fn rejects_empty_and_blank() {
    assert!(matches!(validate_title(""), Err(Error::Validation(_))));
    assert!(matches!(validate_title("   "), Err(Error::Validation(_))));
    assert!(matches!(validate_title("\t\n"), Err(Error::Validation(_))));
  }

  #[test]
  fn length_boundary() {
    assert!(validate_title(&"x".repeat(255)).is_ok());
    assert!(matches!(
      validate_title(&"x".repeat(256)),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn length_counts_characters_not_bytes() {
    // 255 two-byte characters is still within bounds.
    assert!(validate_title(&"é".repeat(255)).is_ok());
  }

  #[test]
  fn surrounding_whitespace_is_kept_not_rejected() {
    assert!(validate_title("  padded  ").is_ok());
  }
}
