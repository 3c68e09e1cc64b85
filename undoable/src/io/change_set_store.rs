//! Change set loading with schema validation.
//!
//! Payloads are validated against the embedded JSON Schema before they are
//! converted into the typed model, so a malformed entry rejects the whole
//! batch before the applier runs.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::core::types::ChangeSet;
use crate::error::EngineError;

/// Embedded change set schema (Draft 2020-12).
pub const CHANGE_SET_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/changeset/v1.schema.json"
));

/// Validate an already-parsed JSON value against the change set schema.
pub fn validate_value(source_name: &str, value: &Value) -> Result<(), EngineError> {
    let schema: Value = serde_json::from_str(CHANGE_SET_SCHEMA)
        .map_err(|err| EngineError::schema("embedded schema", vec![err.to_string()]))?;
    let compiled = jsonschema::validator_for(&schema)
        .map_err(|err| EngineError::schema("embedded schema", vec![err.to_string()]))?;
    let messages: Vec<String> = compiled
        .iter_errors(value)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(EngineError::schema(source_name, messages));
    }
    Ok(())
}

/// Parse + validate a JSON document into `T` (a change set or a ledger record).
pub(crate) fn parse_validated<T: DeserializeOwned>(
    source_name: &str,
    raw: &str,
) -> Result<T, EngineError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| EngineError::schema(source_name, vec![format!("invalid JSON: {err}")]))?;
    validate_value(source_name, &value)?;
    serde_json::from_value(value)
        .map_err(|err| EngineError::schema(source_name, vec![err.to_string()]))
}

/// Parse a change set from JSON text.
pub fn parse_change_set(source_name: &str, raw: &str) -> Result<ChangeSet, EngineError> {
    let set: ChangeSet = parse_validated(source_name, raw)?;
    debug!(source = source_name, changes = set.len(), "change set parsed");
    Ok(set)
}

/// Read and validate a change set file.
pub fn load_change_set(path: &Path) -> Result<ChangeSet, EngineError> {
    let raw = fs::read_to_string(path)
        .map_err(|err| EngineError::io(format!("read change set {}", path.display()), err))?;
    parse_change_set(&path.display().to_string(), &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FileChange;

    fn messages(err: EngineError) -> Vec<String> {
        match err {
            EngineError::SchemaViolation { messages, .. } => messages,
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn parses_valid_payload() {
        let raw = r#"{
            "summary": "Add tests",
            "changes": [
                {"filePath": "calculator.py", "action": "REPLACE", "content": "Y"},
                {"filePath": "test_calculator.py", "action": "CREATE", "content": "Z"},
                {"filePath": "old.py", "action": "DELETE", "content": ""}
            ]
        }"#;
        let set = parse_change_set("inline", raw).expect("parse");
        assert_eq!(set.summary.as_deref(), Some("Add tests"));
        assert_eq!(
            set.changes,
            vec![
                FileChange::replace("calculator.py", "Y"),
                FileChange::create("test_calculator.py", "Z"),
                FileChange::delete("old.py"),
            ]
        );
    }

    #[test]
    fn rejects_unknown_action() {
        let raw = r#"{"changes":[{"filePath":"a","action":"RENAME","content":""}]}"#;
        let msgs = messages(parse_change_set("inline", raw).expect_err("invalid"));
        assert!(msgs.iter().any(|m| m.contains("RENAME")), "{msgs:?}");
    }

    #[test]
    fn rejects_missing_content() {
        let raw = r#"{"changes":[{"filePath":"a","action":"CREATE"}]}"#;
        let msgs = messages(parse_change_set("inline", raw).expect_err("invalid"));
        assert!(msgs.iter().any(|m| m.contains("content")), "{msgs:?}");
    }

    #[test]
    fn rejects_empty_path_and_extra_fields() {
        let raw = r#"{"changes":[{"filePath":"","action":"CREATE","content":"","mode":"755"}]}"#;
        let msgs = messages(parse_change_set("inline", raw).expect_err("invalid"));
        assert!(msgs.len() >= 2, "{msgs:?}");
    }

    #[test]
    fn rejects_invalid_json() {
        let msgs = messages(parse_change_set("inline", "{not json").expect_err("invalid"));
        assert!(msgs[0].starts_with("invalid JSON"));
    }

    #[test]
    fn load_reports_missing_file_as_io() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_change_set(&temp.path().join("missing.json")).expect_err("missing");
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
