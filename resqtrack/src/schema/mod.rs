// Static schema registry: collection name -> ordered field list.

mod types;

pub use types::{Collection, CASE_FIELDS, DONATION_FIELDS, EMERGENCY_FIELDS, HOSPITAL_FIELDS};

use crate::error::{ResqError, Result};

/// Registered fields for `collection`, or `None` for ad-hoc collections,
/// which are stored schema-less.
pub fn fields_for(collection: &str) -> Option<&'static [&'static str]> {
    Collection::lookup(collection).map(|c| c.fields())
}

/// Header row for a new file. Unknown collections get no headers.
pub fn headers_for(collection: &str) -> Vec<String> {
    fields_for(collection)
        .map(|fields| fields.iter().map(|f| f.to_string()).collect())
        .unwrap_or_default()
}

/// Names of every registered collection, in declaration order.
pub fn collection_names() -> Vec<&'static str> {
    Collection::ALL.iter().map(|c| c.as_str()).collect()
}

/// Collection names double as file stems, so only ASCII letters, digits,
/// `_` and `-` are allowed.
pub fn check_name(collection: &str) -> Result<()> {
    let valid = !collection.is_empty()
        && collection
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(ResqError::Validation(format!(
            "Invalid collection name '{collection}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_collections_have_created_at_last() {
        for collection in Collection::ALL {
            assert_eq!(collection.fields().last(), Some(&"created_at"));
        }
    }

    #[test]
    fn test_case_schema_order() {
        let headers = headers_for("cases");
        assert_eq!(headers[0], "case_id");
        assert_eq!(headers[8], "status");
        assert_eq!(headers.len(), 11);
    }

    #[test]
    fn test_unknown_collection_is_schema_less() {
        assert!(fields_for("volunteers").is_none());
        assert!(headers_for("volunteers").is_empty());
    }

    #[test]
    fn test_parse_collection_name() {
        assert_eq!("hospitals".parse::<Collection>().unwrap(), Collection::Hospitals);
        assert!("Hospitals".parse::<Collection>().is_err());
        assert_eq!(collection_names(), vec!["cases", "donations", "hospitals", "emergency"]);
    }

    #[test]
    fn test_check_name() {
        assert!(check_name("cases").is_ok());
        assert!(check_name("rescue_volunteers-2024").is_ok());
        for bad in ["", "../x", "a/b", "a\\b", "..", ".hidden", "cases.csv"] {
            assert!(check_name(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
