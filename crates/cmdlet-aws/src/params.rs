//! Helpers shared by the parameter surfaces of both services.

use std::collections::BTreeMap;

/// Parses a `Key=Value` command-line value.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected Key=Value, got '{s}'")),
    }
}

/// Bound `Key=Value` pairs as a map. Unbound stays unbound.
pub fn to_map(pairs: &Option<Vec<(String, String)>>) -> Option<BTreeMap<String, String>> {
    pairs.as_ref().map(|pairs| pairs.iter().cloned().collect())
}
