//! Encode/decode boundary for list-valued columns
//!
//! `tasks.tags` and `virtual_pets.accessories` are stored as JSON array text.
//! The schema does not enforce array semantics, so reads validate the shape
//! here and nowhere else.

use crate::error::{Error, Result};

/// Serialize a list of strings for storage.
pub fn encode_list(items: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a stored list column.
///
/// `NULL` and empty text decode to an empty list. Anything that is not a JSON
/// array of strings is rejected.
pub fn decode_list(field: &'static str, raw: Option<&str>) -> Result<Vec<String>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Vec::new()),
        Some(raw) => raw,
    };

    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| Error::Codec {
        field,
        message: e.to_string(),
    })?;

    let items = value.as_array().ok_or_else(|| Error::Codec {
        field,
        message: format!("expected a JSON array, got {}", raw),
    })?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| Error::Codec {
                field,
                message: format!("expected string elements, got {}", item),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_list() {
        let tags = vec!["health".to_string(), "morning \"run\"".to_string()];
        assert_eq!(encode_list(&tags), r#"["health","morning \"run\""]"#);
        assert_eq!(encode_list(&[]), "[]");
    }

    #[test]
    fn test_decode_list_accepts_arrays_and_blank() {
        assert_eq!(
            decode_list("tags", Some(r#"["a", "b"]"#)).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(decode_list("tags", None).unwrap().is_empty());
        assert!(decode_list("tags", Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn test_decode_list_rejects_other_shapes() {
        let err = decode_list("tags", Some(r#"{"a": 1}"#)).unwrap_err();
        assert!(matches!(err, Error::Codec { field: "tags", .. }));
        assert!(decode_list("accessories", Some("[1, 2]")).is_err());
        assert!(decode_list("accessories", Some("hat,scarf")).is_err());
    }
}
