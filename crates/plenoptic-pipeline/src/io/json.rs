//! JSON document I/O with compact integral numbers and atomic writes.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

/// Largest magnitude for which every integral `f64` is exactly an `i64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Rewrite integral finite floats as integers, recursively.
///
/// `4.0` becomes `4`. Fractional and non-finite values and integers are
/// left untouched.
/// Applying the normalization twice is the same as applying it once.
pub fn normalize_numbers(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(f) = n.as_f64() {
                if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_INT {
                    *n = Number::from(f as i64);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_numbers),
        Value::Object(map) => map.values_mut().for_each(normalize_numbers),
        _ => {}
    }
}

/// Serialize `value` into normalized, 4-space indented JSON text.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut doc = serde_json::to_value(value).context("failed to serialize document")?;
    normalize_numbers(&mut doc);

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)
        .context("failed to format document")?;
    String::from_utf8(buf).context("serialized JSON is not UTF-8")
}

/// Write a JSON document atomically.
///
/// The document is fully serialized in memory, written to a temporary file
/// next to `path` and renamed over it, so readers never observe a partial
/// file and a failed run leaves any previous file intact.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let text = to_json_string(value)?;
    write_atomic(path, text.as_bytes())
}

/// Write raw bytes to `path` through a sibling temporary file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to move temporary file to {}", path.display()))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

/// Read and deserialize a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integral_floats_lose_decimal_point() {
        let mut v = json!({"a": 4.0, "b": [1.0, 0.5, [2.0, -3.0]], "c": {"d": 1e3}, "e": 7});
        normalize_numbers(&mut v);
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"a":4,"b":[1,0.5,[2,-3]],"c":{"d":1000},"e":7}"#
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut once = json!([0.1, 2.0, 1e300, -0.0]);
        normalize_numbers(&mut once);
        let mut twice = once.clone();
        normalize_numbers(&mut twice);
        assert_eq!(once, twice);
        // Too large to be an exact integer: stays a float.
        assert!(once[2].is_f64());
    }

    #[test]
    fn pretty_output_uses_four_spaces() {
        let text = to_json_string(&json!({"w": 800.0, "fn": ["a"]})).unwrap();
        assert_eq!(text, "{\n    \"w\": 800,\n    \"fn\": [\n        \"a\"\n    ]\n}");
    }

    #[test]
    fn write_then_read_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("doc.json");
        write_json(&path, &json!({"x": [1.5, 2.0]}))?;
        let back: Value = read_json(&path)?;
        assert_eq!(back, json!({"x": [1.5, 2]}));
        Ok(())
    }

    #[test]
    fn failed_serialization_keeps_previous_file() -> Result<()> {
        use std::collections::BTreeMap;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("doc.json");
        write_json(&path, &json!({"ok": true}))?;

        // Non-string map keys cannot become JSON object keys.
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], 1);
        assert!(write_json(&path, &bad).is_err());

        let kept: Value = read_json(&path)?;
        assert_eq!(kept, json!({"ok": true}));
        Ok(())
    }
}
