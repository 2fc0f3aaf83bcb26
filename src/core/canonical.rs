//! Canonical JSON rendering.
//!
//! Ledger hashing and the store's idempotence check both compare serialized
//! bytes, so serialization has to be deterministic: object keys are sorted
//! recursively and the compact form carries no whitespace. The pretty form
//! shares the same key order and is what lands on disk.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::core::errors::Result;

/// Rebuilds a JSON value with all object keys sorted, recursively.
///
/// Arrays keep their element order; scalars pass through untouched.
#[must_use]
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Array(entries) => Value::Array(entries.into_iter().map(canonicalize).collect()),
        Value::Object(record) => {
            let mut sorted: Vec<(String, Value)> = record.into_iter().collect();
            sorted.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(key, entry)| (key, canonicalize(entry)))
                    .collect(),
            )
        }
        scalar => scalar,
    }
}

/// Serializes `value` into a canonicalized [`Value`] tree.
pub fn to_canonical_value<T: Serialize>(value: &T) -> Result<Value> {
    Ok(canonicalize(serde_json::to_value(value)?))
}

/// Compact canonical rendering: sorted keys, no whitespace, no trailing
/// newline. This is the byte form fed to hashing and equality checks.
pub fn canonical_compact<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(&to_canonical_value(value)?)?)
}

/// Pretty canonical rendering: sorted keys, two-space indent, trailing
/// newline. This is the byte form written to ledger files.
pub fn canonical_pretty<T: Serialize>(value: &T) -> Result<String> {
    let mut rendered = serde_json::to_string_pretty(&to_canonical_value(value)?)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::json;

    use super::*;

    #[test]
    fn sorts_keys_recursively() {
        let scrambled = json!({
            "zulu": {"beta": 2, "alpha": 1},
            "alpha": [{"delta": 4, "charlie": 3}],
        });
        let compact = canonical_compact(&scrambled).unwrap();
        assert_eq!(
            compact,
            r#"{"alpha":[{"charlie":3,"delta":4}],"zulu":{"alpha":1,"beta":2}}"#
        );
    }

    #[test]
    fn arrays_keep_element_order() {
        let value = json!({"items": [3, 1, 2]});
        assert_eq!(canonical_compact(&value).unwrap(), r#"{"items":[3,1,2]}"#);
    }

    #[test]
    fn struct_field_order_does_not_leak() {
        #[derive(Serialize)]
        struct Scrambled {
            zebra: u64,
            apple: u64,
            mango: u64,
        }

        let compact = canonical_compact(&Scrambled {
            zebra: 1,
            apple: 2,
            mango: 3,
        })
        .unwrap();
        assert_eq!(compact, r#"{"apple":2,"mango":3,"zebra":1}"#);
    }

    #[test]
    fn integers_render_without_decimals() {
        let value = json!({"green_threshold": 1300, "red_threshold": 1500});
        let compact = canonical_compact(&value).unwrap();
        assert!(!compact.contains('.'), "no decimal points: {compact}");
        assert!(compact.contains("1300"));
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let value = json!({
            "b": {"y": null, "x": [true, {"n": 1, "m": 2}]},
            "a": "text",
        });
        let once = canonicalize(value.clone());
        let twice = canonicalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn null_survives_canonicalization() {
        let value = json!({"sessions_count": null, "orders_count": 12});
        assert_eq!(
            canonical_compact(&value).unwrap(),
            r#"{"orders_count":12,"sessions_count":null}"#
        );
    }

    #[test]
    fn pretty_form_has_trailing_newline_and_same_key_order() {
        let value = json!({"b": 1, "a": 2});
        let pretty = canonical_pretty(&value).unwrap();
        assert!(pretty.ends_with('\n'));
        assert!(pretty.find("\"a\"").unwrap() < pretty.find("\"b\"").unwrap());

        let reparsed: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(reparsed, canonicalize(value));
    }

    #[test]
    fn sha256_hex_known_vectors() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn compact_and_pretty_agree_after_reparse() {
        let value = json!({
            "stages": {
                "referral": [],
                "acquisition": [{"metric": "blended_cac_eur_cents", "green_threshold": 1300}],
            }
        });
        let compact: Value = serde_json::from_str(&canonical_compact(&value).unwrap()).unwrap();
        let pretty: Value = serde_json::from_str(&canonical_pretty(&value).unwrap()).unwrap();
        assert_eq!(compact, pretty);
    }
}
