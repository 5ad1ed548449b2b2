//! Argument coercion and scope/entry resolution shared by the tool executors.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::catalog::{CatalogEntry, EntryKey, RetrievalToolCatalog};
use super::error::{ToolError, ToolResult};
use crate::lore::normalize_scope;

/// Clamp an optional integer argument into `[min, max]`, using `default` when absent.
pub fn clamp_arg(value: Option<i64>, default: i64, min: i64, max: i64) -> usize {
    value.unwrap_or(default).clamp(min, max) as usize
}

/// Accept integers given as JSON numbers (including whole floats like `3.0`) or numeric
/// strings. Planners are not consistent about either.
pub fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                    _ => Err(serde::de::Error::custom(format!("expected an integer, got {n}"))),
                }
            }
        }
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got \"{s}\""))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected an integer, got {other}"
        ))),
    }
}

/// Scopes a search covers: every allowed scope when `scope` is blank, otherwise exactly
/// the named scope, which must be both allowed and present in the catalog.
pub fn resolve_scopes(
    catalog: &RetrievalToolCatalog,
    allowed: &[String],
    scope: Option<&str>,
) -> ToolResult<Vec<String>> {
    match scope.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(allowed
            .iter()
            .filter(|s| catalog.has_scope(s))
            .cloned()
            .collect()),
        Some(raw) => Ok(vec![resolve_single_scope(catalog, allowed, raw)?]),
    }
}

fn resolve_single_scope(
    catalog: &RetrievalToolCatalog,
    allowed: &[String],
    raw: &str,
) -> ToolResult<String> {
    let scope = normalize_scope(raw);
    if allowed.iter().any(|s| *s == scope) && catalog.has_scope(&scope) {
        Ok(scope)
    } else {
        Err(ToolError::ScopeNotActive(raw.to_string()))
    }
}

/// Validate a required uid argument.
pub fn require_uid(uid: Option<i64>) -> ToolResult<u64> {
    match uid {
        None => Err(ToolError::InvalidArgument("uid is required".into())),
        Some(n) if n < 0 => Err(ToolError::InvalidArgument(format!(
            "uid must be a non-negative integer, got {n}"
        ))),
        Some(n) => Ok(n as u64),
    }
}

/// Find the entry for `uid`, optionally pinned to `scope`.
///
/// Without a scope the lexicographically first allowed scope holding `uid` wins.
pub fn resolve_entry<'a>(
    catalog: &'a RetrievalToolCatalog,
    allowed: &[String],
    uid: Option<i64>,
    scope: Option<&str>,
) -> ToolResult<&'a CatalogEntry> {
    let uid = require_uid(uid)?;

    if let Some(raw) = scope.map(str::trim).filter(|s| !s.is_empty()) {
        let scope = resolve_single_scope(catalog, allowed, raw)?;
        return catalog
            .get(&EntryKey::new(scope.as_str(), uid))
            .ok_or_else(|| ToolError::EntryNotFound(format!("uid {uid} in scope {scope}")));
    }

    catalog
        .keys_for_uid(uid)
        .iter()
        .find(|key| allowed.iter().any(|s| *s == key.scope))
        .and_then(|key| catalog.get(key))
        .ok_or_else(|| ToolError::EntryNotFound(format!("uid {uid} in active scopes")))
}
