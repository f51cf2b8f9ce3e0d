//! Contract models for the cluster settings registry
//!
//! These models are transport-agnostic and shared between the registry,
//! the cluster state service, and callers submitting updates. Raw values
//! at the boundary are `serde_json::Value`; typed values live in
//! [`SettingValue`].

use std::collections::BTreeMap;
use std::fmt;

use crate::contract::error::SettingsError;

/// Milliseconds per accepted duration unit suffix, largest first.
const UNITS: &[(&str, i64)] = &[
    ("w", 7 * 24 * 60 * 60 * 1000),
    ("d", 24 * 60 * 60 * 1000),
    ("h", 60 * 60 * 1000),
    ("m", 60 * 1000),
    ("s", 1000),
    ("ms", 1),
];

/// A duration setting value, counted in milliseconds.
///
/// Parsed from magnitude+unit strings (`"30m"`, `"1h"`, `"7d"`); a bare
/// integer is a millisecond count and `-1` is the "disabled" sentinel.
/// Equality is by millisecond count, so `"1h"` and `"60m"` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeValue {
    millis: i64,
}

impl TimeValue {
    /// Sentinel meaning the timed behavior is disabled.
    pub const DISABLED: TimeValue = TimeValue { millis: -1 };

    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self {
            millis: secs * 1000,
        }
    }

    pub const fn from_minutes(minutes: i64) -> Self {
        Self {
            millis: minutes * 60 * 1000,
        }
    }

    pub const fn from_hours(hours: i64) -> Self {
        Self {
            millis: hours * 60 * 60 * 1000,
        }
    }

    pub const fn millis(&self) -> i64 {
        self.millis
    }

    pub const fn is_disabled(&self) -> bool {
        self.millis == -1
    }

    /// Parse a human-readable duration.
    ///
    /// Accepted suffixes: `ms`, `s`, `m`, `h`, `d`, `w`. A bare integer is
    /// taken as milliseconds; `"-1"` is [`TimeValue::DISABLED`]. Negative
    /// magnitudes are permitted (used by expiration-style settings).
    pub fn parse(input: &str) -> Option<TimeValue> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed == "-1" {
            return Some(TimeValue::DISABLED);
        }
        for (suffix, scale) in UNITS {
            if let Some(magnitude) = trimmed.strip_suffix(suffix) {
                // A magnitude that fails to parse falls through to the next
                // suffix, so "10ms" is not misread as "10m" seconds.
                if let Ok(n) = magnitude.trim().parse::<i64>() {
                    return n.checked_mul(*scale).map(TimeValue::from_millis);
                }
            }
        }
        trimmed.parse::<i64>().ok().map(TimeValue::from_millis)
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis == -1 {
            return write!(f, "-1");
        }
        for (suffix, scale) in UNITS {
            if self.millis != 0 && self.millis % scale == 0 {
                return write!(f, "{}{}", self.millis / scale, suffix);
            }
        }
        write!(f, "{}ms", self.millis)
    }
}

/// The four supported setting value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKind {
    Duration,
    Boolean,
    String,
    StringArray,
}

impl SettingKind {
    /// Parse a raw boundary value into a typed value of this kind.
    ///
    /// Boundary encodings: durations as magnitude+unit strings (or bare
    /// millisecond integers), booleans as literal `true`/`false` tokens,
    /// string arrays as ordered JSON arrays of strings.
    pub fn parse(
        &self,
        name: &str,
        raw: &serde_json::Value,
    ) -> Result<SettingValue, SettingsError> {
        let mismatch = || SettingsError::TypeMismatch {
            name: name.to_string(),
            expected: *self,
            given: raw.to_string(),
        };
        match self {
            SettingKind::Duration => match raw {
                serde_json::Value::String(s) => TimeValue::parse(s)
                    .map(SettingValue::Duration)
                    .ok_or_else(mismatch),
                serde_json::Value::Number(n) => n
                    .as_i64()
                    .map(|millis| SettingValue::Duration(TimeValue::from_millis(millis)))
                    .ok_or_else(mismatch),
                _ => Err(mismatch()),
            },
            SettingKind::Boolean => match raw {
                serde_json::Value::Bool(b) => Ok(SettingValue::Boolean(*b)),
                serde_json::Value::String(s) => match s.trim() {
                    "true" => Ok(SettingValue::Boolean(true)),
                    "false" => Ok(SettingValue::Boolean(false)),
                    _ => Err(mismatch()),
                },
                _ => Err(mismatch()),
            },
            SettingKind::String => match raw {
                serde_json::Value::String(s) => Ok(SettingValue::String(s.clone())),
                _ => Err(mismatch()),
            },
            SettingKind::StringArray => match raw {
                serde_json::Value::Array(items) => {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            serde_json::Value::String(s) => values.push(s.clone()),
                            _ => return Err(mismatch()),
                        }
                    }
                    Ok(SettingValue::StringArray(values))
                }
                _ => Err(mismatch()),
            },
        }
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingKind::Duration => "duration",
            SettingKind::Boolean => "boolean",
            SettingKind::String => "string",
            SettingKind::StringArray => "string array",
        };
        write!(f, "{}", name)
    }
}

/// A typed setting value.
///
/// Equality is type-specific: durations compare by millisecond count and
/// string arrays element-wise in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Duration(TimeValue),
    Boolean(bool),
    String(String),
    StringArray(Vec<String>),
}

impl SettingValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Duration(_) => SettingKind::Duration,
            SettingValue::Boolean(_) => SettingKind::Boolean,
            SettingValue::String(_) => SettingKind::String,
            SettingValue::StringArray(_) => SettingKind::StringArray,
        }
    }

    pub fn as_duration(&self) -> Option<TimeValue> {
        match self {
            SettingValue::Duration(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str_array(&self) -> Option<&[String]> {
        match self {
            SettingValue::StringArray(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Duration(v) => write!(f, "{}", v),
            SettingValue::Boolean(v) => write!(f, "{}", v),
            SettingValue::String(v) => write!(f, "{}", v),
            SettingValue::StringArray(v) => write!(f, "[{}]", v.join(", ")),
        }
    }
}

/// Immutable descriptor of one configuration key.
///
/// A name ending in `.*` declares a wildcard group: any concrete key
/// sharing the prefix resolves to this definition, with per-sub-key
/// independent values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingDefinition {
    /// Dot-separated setting key, e.g. `"marvel.agent.interval"`.
    pub name: String,
    /// Declared value kind.
    pub kind: SettingKind,
    /// Default value; its kind always matches `kind`.
    pub default: SettingValue,
    /// Whether the value may change at runtime. Static settings are fixed
    /// at node start and updates to them are rejected.
    pub dynamic: bool,
}

impl SettingDefinition {
    pub fn duration(name: &str, default: TimeValue, dynamic: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: SettingKind::Duration,
            default: SettingValue::Duration(default),
            dynamic,
        }
    }

    pub fn boolean(name: &str, default: bool, dynamic: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: SettingKind::Boolean,
            default: SettingValue::Boolean(default),
            dynamic,
        }
    }

    pub fn string(name: &str, default: &str, dynamic: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: SettingKind::String,
            default: SettingValue::String(default.to_string()),
            dynamic,
        }
    }

    pub fn string_array(name: &str, default: &[&str], dynamic: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: SettingKind::StringArray,
            default: SettingValue::StringArray(
                default.iter().map(|s| s.to_string()).collect(),
            ),
            dynamic,
        }
    }

    /// Whether this definition declares a wildcard group of sub-keys.
    pub fn is_wildcard(&self) -> bool {
        self.name.ends_with(".*")
    }

    /// Whether `key` is a member of this wildcard group.
    pub fn matches_wildcard(&self, key: &str) -> bool {
        match self.name.strip_suffix('*') {
            Some(prefix) => key.starts_with(prefix) && key.len() > prefix.len(),
            None => false,
        }
    }
}

/// Scope of a cluster-wide settings update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScope {
    /// Cleared on full cluster restart.
    Transient,
    /// Survives cluster restarts.
    Persistent,
}

impl fmt::Display for UpdateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateScope::Transient => write!(f, "transient"),
            UpdateScope::Persistent => write!(f, "persistent"),
        }
    }
}

/// A key/value update submitted to the cluster state service.
///
/// Values are raw boundary encodings; a JSON `null` clears the override
/// for that key, reverting nodes to their startup baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub scope: UpdateScope,
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl SettingsUpdate {
    pub fn transient() -> Self {
        Self {
            scope: UpdateScope::Transient,
            settings: BTreeMap::new(),
        }
    }

    pub fn persistent() -> Self {
        Self {
            scope: UpdateScope::Persistent,
            settings: BTreeMap::new(),
        }
    }

    /// Set a raw value for a key.
    pub fn set(mut self, name: &str, raw: serde_json::Value) -> Self {
        self.settings.insert(name.to_string(), raw);
        self
    }

    /// Clear the override for a key.
    pub fn unset(mut self, name: &str) -> Self {
        self.settings
            .insert(name.to_string(), serde_json::Value::Null);
        self
    }
}

/// The merged cluster-wide settings document visible to a node.
///
/// `version` increases with every recorded change; listeners use it to
/// discard stale notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterStateSnapshot {
    pub version: u64,
    pub transient: BTreeMap<String, serde_json::Value>,
    pub persistent: BTreeMap<String, serde_json::Value>,
}

impl ClusterStateSnapshot {
    /// The merged settings document: transient overrides take precedence
    /// over persistent ones.
    pub fn merged(&self) -> BTreeMap<&str, &serde_json::Value> {
        let mut merged: BTreeMap<&str, &serde_json::Value> = BTreeMap::new();
        for (key, value) in &self.persistent {
            merged.insert(key.as_str(), value);
        }
        for (key, value) in &self.transient {
            merged.insert(key.as_str(), value);
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_time_value_parse_units() {
        assert_eq!(TimeValue::parse("10ms"), Some(TimeValue::from_millis(10)));
        assert_eq!(TimeValue::parse("30s"), Some(TimeValue::from_secs(30)));
        assert_eq!(TimeValue::parse("30m"), Some(TimeValue::from_minutes(30)));
        assert_eq!(TimeValue::parse("1h"), Some(TimeValue::from_hours(1)));
        assert_eq!(
            TimeValue::parse("1d"),
            Some(TimeValue::from_millis(86_400_000))
        );
        assert_eq!(
            TimeValue::parse("2w"),
            Some(TimeValue::from_millis(2 * 604_800_000))
        );
    }

    #[test]
    fn test_time_value_parse_bare_millis() {
        assert_eq!(TimeValue::parse("1500"), Some(TimeValue::from_millis(1500)));
    }

    #[test]
    fn test_time_value_parse_disabled_sentinel() {
        let parsed = TimeValue::parse("-1").unwrap();
        assert!(parsed.is_disabled());
        assert_eq!(parsed, TimeValue::DISABLED);
    }

    #[test]
    fn test_time_value_parse_negative_magnitude() {
        assert_eq!(TimeValue::parse("-240h"), Some(TimeValue::from_hours(-240)));
    }

    #[test]
    fn test_time_value_parse_rejects_garbage() {
        assert_eq!(TimeValue::parse(""), None);
        assert_eq!(TimeValue::parse("abc"), None);
        assert_eq!(TimeValue::parse("10x"), None);
        assert_eq!(TimeValue::parse("1.5h"), None);
    }

    #[test]
    fn test_time_value_unit_equivalence() {
        let hour = TimeValue::parse("1h").unwrap();
        let sixty_minutes = TimeValue::parse("60m").unwrap();
        assert_eq!(hour, sixty_minutes);
        assert_eq!(hour.millis(), 3_600_000);
    }

    #[test]
    fn test_time_value_display_round_trip() {
        for input in ["1h", "30m", "10s", "250ms", "7d", "-1"] {
            let value = TimeValue::parse(input).unwrap();
            assert_eq!(value.to_string(), input);
            assert_eq!(TimeValue::parse(&value.to_string()), Some(value));
        }
    }

    #[test]
    fn test_kind_parse_duration() {
        let kind = SettingKind::Duration;
        assert_eq!(
            kind.parse("k", &json!("1h")).unwrap(),
            SettingValue::Duration(TimeValue::from_hours(1))
        );
        assert_eq!(
            kind.parse("k", &json!(1500)).unwrap(),
            SettingValue::Duration(TimeValue::from_millis(1500))
        );
        assert!(matches!(
            kind.parse("k", &json!("oops")),
            Err(SettingsError::TypeMismatch { .. })
        ));
        assert!(kind.parse("k", &json!(true)).is_err());
    }

    #[test]
    fn test_kind_parse_boolean_tokens() {
        let kind = SettingKind::Boolean;
        assert_eq!(
            kind.parse("k", &json!(true)).unwrap(),
            SettingValue::Boolean(true)
        );
        assert_eq!(
            kind.parse("k", &json!("false")).unwrap(),
            SettingValue::Boolean(false)
        );
        assert!(kind.parse("k", &json!("yes")).is_err());
        assert!(kind.parse("k", &json!(1)).is_err());
    }

    #[test]
    fn test_kind_parse_string_array() {
        let kind = SettingKind::StringArray;
        assert_eq!(
            kind.parse("k", &json!(["a", "b"])).unwrap(),
            SettingValue::StringArray(vec!["a".to_string(), "b".to_string()])
        );
        assert!(kind.parse("k", &json!(["a", 1])).is_err());
        assert!(kind.parse("k", &json!("a")).is_err());
    }

    #[test]
    fn test_string_array_equality_is_ordered() {
        let ab = SettingValue::StringArray(vec!["a".to_string(), "b".to_string()]);
        let ba = SettingValue::StringArray(vec!["b".to_string(), "a".to_string()]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_wildcard_matching() {
        let def = SettingDefinition::string("marvel.agent.exporters.*", "", true);
        assert!(def.is_wildcard());
        assert!(def.matches_wildcard("marvel.agent.exporters.es.host"));
        assert!(def.matches_wildcard("marvel.agent.exporters.http"));
        assert!(!def.matches_wildcard("marvel.agent.exporters."));
        assert!(!def.matches_wildcard("marvel.agent.interval"));

        let plain = SettingDefinition::boolean("marvel.agent.enabled", true, false);
        assert!(!plain.is_wildcard());
        assert!(!plain.matches_wildcard("marvel.agent.enabled.x"));
    }

    #[test]
    fn test_snapshot_merge_precedence() {
        let mut snapshot = ClusterStateSnapshot::default();
        snapshot
            .persistent
            .insert("a".to_string(), json!("persistent"));
        snapshot
            .persistent
            .insert("b".to_string(), json!("persistent"));
        snapshot.transient.insert("a".to_string(), json!("transient"));

        let merged = snapshot.merged();
        assert_eq!(merged.get("a"), Some(&&json!("transient")));
        assert_eq!(merged.get("b"), Some(&&json!("persistent")));
    }

    #[test]
    fn test_update_builder() {
        let update = SettingsUpdate::transient()
            .set("marvel.agent.interval", json!("30m"))
            .unset("marvel.agent.indices");
        assert_eq!(update.scope, UpdateScope::Transient);
        assert_eq!(
            update.settings.get("marvel.agent.interval"),
            Some(&json!("30m"))
        );
        assert_eq!(
            update.settings.get("marvel.agent.indices"),
            Some(&serde_json::Value::Null)
        );
    }
}
