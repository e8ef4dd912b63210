//! Config validation: unknown-key detection with Levenshtein suggestions.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, unknown section).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `AppConfig`.
///
/// Array-of-table entries (`[[models.artifacts]]`) are addressed without an
/// index. Must be kept in step with `app_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [service]
        "service",
        "service.name",
        // [models]
        "models",
        "models.default_mode",
        "models.cache_dir",
        "models.http_timeout_secs",
        "models.artifacts",
        "models.artifacts.target",
        "models.artifacts.mode",
        "models.artifacts.path",
        "models.artifacts.url",
        // [dataset]
        "dataset",
        "dataset.ys_path",
        "dataset.uts_path",
        // [constraints]
        "constraints",
        "constraints.sum_epsilon",
        // [search]
        "search",
        "search.oversampling_factor",
        "search.min_scan_samples",
        "search.restarts_per_candidate",
        "search.min_restarts",
        "search.max_iterations",
        "search.initial_step",
        "search.min_step",
        "search.step_shrink",
        "search.stall_iterations",
        "search.improvement_epsilon",
        "search.optimizer_merge_distance",
        "search.dedup_distance",
        "search.max_training_matches",
        "search.seed",
        "search.deadline_ms",
        "search.strategies",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields
/// `["a", "a.b", "a.c"]`. Tables inside arrays contribute their keys under
/// the array's path.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for nested in walk_toml_keys(item, &path) {
                            if !keys.contains(&nested) {
                                keys.push(nested);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so output is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("seed", "seed"), 0);
        assert_eq!(levenshtein("dedup_distnce", "dedup_distance"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested_and_arrays() {
        let toml: toml::Value = r#"
            [search]
            seed = 1

            [[models.artifacts]]
            target = "YS"
            mode = "balanced"

            [[models.artifacts]]
            target = "UTS"
            mode = "balanced"
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"search.seed".to_string()));
        assert!(keys.contains(&"models.artifacts".to_string()));
        assert!(keys.contains(&"models.artifacts.target".to_string()));
        assert_eq!(keys.iter().filter(|k| *k == "models.artifacts.mode").count(), 1);
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys("[search]\nmax_iteratons = 10\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "search.max_iteratons");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("search.max_iterations"));
        assert!(warnings[0].to_string().contains("did you mean"));
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[service]
name = "alloy-api"

[models]
default_mode = "baseline"

[[models.artifacts]]
target = "YS"
mode = "balanced"
url = "https://example.org/ys.json"

[search]
strategies = ["training_data"]
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_unknown_section_without_suggestion() {
        let warnings = validate_unknown_keys("[telemetry]\nendpoint = \"x\"\n");
        assert!(warnings.iter().any(|w| w.field == "telemetry"));
        assert!(warnings.iter().all(|w| w.suggestion.is_none()));
    }
}
