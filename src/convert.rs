//! Serde-based shape conversions between structs, slices and JSON maps.

use std::collections::HashMap;

use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};

/// Serialize a struct into a map whose top-level keys are lowercased.
pub fn struct_to_map<T: Serialize>(value: &T) -> AuthResult<Map<String, Value>> {
    Ok(object(value)?
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect())
}

/// Serialize a struct into a map without `field`.
pub fn remove_field<T: Serialize>(value: &T, field: &str) -> AuthResult<Map<String, Value>> {
    let mut map = object(value)?;
    map.remove(field);
    Ok(map)
}

pub fn in_slice<T: PartialEq>(item: &T, list: &[T]) -> bool {
    list.contains(item)
}

/// Hex MD5 of the current millisecond timestamp followed by `input`.
/// Handy for naming uploaded files; not a security primitive.
pub fn random_md5_string(input: &str) -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let digest = Md5::new_with_prefix(format!("{millis}{input}")).finalize();
    hex::encode(digest)
}

/// Pair up `[k1, v1, k2, v2, ...]`.  A trailing unpaired item is dropped.
pub fn slice_string_to_map<S: AsRef<str>>(slice: &[S]) -> HashMap<String, String> {
    slice
        .chunks_exact(2)
        .map(|pair| (pair[0].as_ref().to_owned(), pair[1].as_ref().to_owned()))
        .collect()
}

/// Pair up `[k1, v1, k2, v2, ...]` of any serializable scalar.  Keys are
/// rendered as strings; values keep their JSON type.
pub fn slice_to_map<T: Serialize>(slice: &[T]) -> AuthResult<Map<String, Value>> {
    if slice.len() % 2 != 0 {
        return Err(AuthError::Conversion(format!(
            "expected an even number of items, got {}",
            slice.len()
        )));
    }
    let mut map = Map::with_capacity(slice.len() / 2);
    for pair in slice.chunks_exact(2) {
        let key = match to_value(&pair[0])? {
            Value::String(s) => s,
            v @ (Value::Number(_) | Value::Bool(_)) => v.to_string(),
            other => {
                return Err(AuthError::Conversion(format!("unsupported key {other}")));
            }
        };
        map.insert(key, to_value(&pair[1])?);
    }
    Ok(map)
}

/// Copy every leaf of `input` into `out`, descending into nested objects.
/// Arrays are leaves.  On key collisions the last leaf visited wins.
pub fn flatten_map(input: &Map<String, Value>, out: &mut Map<String, Value>) {
    for (k, v) in input {
        match v {
            Value::Object(child) => flatten_map(child, out),
            _ => {
                out.insert(k.clone(), v.clone());
            }
        }
    }
}

fn object<T: Serialize>(value: &T) -> AuthResult<Map<String, Value>> {
    match to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AuthError::Conversion(format!("expected an object, got {other}"))),
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> AuthResult<Value> {
    serde_json::to_value(value).map_err(|e| AuthError::Conversion(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[allow(non_snake_case)]
    struct Account {
        Name: String,
        Password: String,
        age: u8,
    }

    fn account() -> Account {
        Account {
            Name: "ana".into(),
            Password: "hunter2".into(),
            age: 30,
        }
    }

    #[test]
    fn struct_keys_are_lowercased() {
        let map = struct_to_map(&account()).unwrap();
        assert_eq!(map["name"], json!("ana"));
        assert_eq!(map["password"], json!("hunter2"));
        assert_eq!(map["age"], json!(30));
    }

    #[test]
    fn remove_field_drops_only_that_field() {
        let map = remove_field(&account(), "Password").unwrap();
        assert!(!map.contains_key("Password"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn non_struct_is_conversion_error() {
        assert!(matches!(struct_to_map(&42), Err(AuthError::Conversion(_))));
    }

    #[test]
    fn membership() {
        assert!(in_slice(&"b", &["a", "b"]));
        assert!(!in_slice(&3, &[1, 2]));
    }

    #[test]
    fn md5_string_is_32_hex_and_varies() {
        let a = random_md5_string("upload.png");
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, random_md5_string("other.png"));
    }

    #[test]
    fn string_pairs() {
        let map = slice_string_to_map(&["A", "1", "B", "2", "dangling"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["A"], "1");
        assert_eq!(map["B"], "2");
    }

    #[test]
    fn typed_pairs() {
        let map = slice_to_map(&[1, 10, 2, 20]).unwrap();
        assert_eq!(map["1"], json!(10));
        assert_eq!(map["2"], json!(20));
        assert!(matches!(slice_to_map(&[true]), Err(AuthError::Conversion(_))));
    }

    #[test]
    fn flatten_nested_objects() {
        let input = json!({
            "user": { "name": "ana", "meta": { "age": 30 } },
            "tags": ["a", "b"],
            "active": true
        });
        let mut out = Map::new();
        flatten_map(input.as_object().unwrap(), &mut out);
        assert_eq!(out["name"], json!("ana"));
        assert_eq!(out["age"], json!(30));
        assert_eq!(out["tags"], json!(["a", "b"]));
        assert_eq!(out["active"], json!(true));
        assert!(!out.contains_key("user"));
    }
}
