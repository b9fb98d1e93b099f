//! Schema migration for plan documents.
//!
//! Plans exported by older tooling use the record layout of the original
//! plan-line table (`display_type`, `status_done`, `*_date` fields).
//! Migrations upgrade such documents step by step to the current layout.

use std::collections::HashMap;

use log::{info, warn};
use serde_json::{Map, Value};

use crate::error::{PlanError, Result};
use crate::import::parse_date_text;

/// Current schema version for plan files.
pub const CURRENT_SCHEMA_VERSION: &str = "2.0.0";

/// Version assumed when a document carries no `schema_version`.
pub const LEGACY_SCHEMA_VERSION: &str = "1.0.0";

/// Takes a JSON document and returns the migrated document or an error.
type MigrationFn = fn(Value) -> Result<Value>;

/// Maps (from_version, to_version) tuples to migration functions.
fn get_migration_registry() -> HashMap<(String, String), MigrationFn> {
    let mut registry: HashMap<(String, String), MigrationFn> = HashMap::new();

    registry.insert(
        ("1.0.0".to_string(), "1.1.0".to_string()),
        migrate_1_0_0_to_1_1_0,
    );
    registry.insert(
        ("1.1.0".to_string(), "2.0.0".to_string()),
        migrate_1_1_0_to_2_0_0,
    );

    registry
}

/// All known schema versions in order.
fn get_version_order() -> Vec<&'static str> {
    vec!["1.0.0", "1.1.0", "2.0.0"]
}

/// Migrate a plan document to [`CURRENT_SCHEMA_VERSION`].
///
/// # Errors
/// Returns `PlanError::InvalidSchemaVersion` if the version is unknown and
/// `PlanError::MigrationError` if no path exists or a step fails.
pub fn migrate_plan(mut data: Value) -> Result<Value> {
    let current_version = data
        .get("schema_version")
        .and_then(|v| v.as_str())
        .unwrap_or(LEGACY_SCHEMA_VERSION)
        .to_string();

    let target_version = CURRENT_SCHEMA_VERSION;

    if current_version == target_version {
        return Ok(data);
    }

    if !get_version_order().contains(&current_version.as_str()) {
        return Err(PlanError::InvalidSchemaVersion {
            version: current_version,
        });
    }

    let path = find_migration_path(&current_version, target_version);
    if path.is_empty() {
        return Err(PlanError::MigrationError {
            from: current_version,
            to: target_version.to_string(),
            reason: "No migration path found".to_string(),
        });
    }

    let registry = get_migration_registry();

    for (from, to) in path {
        let migration_fn = registry.get(&(from.clone(), to.clone())).ok_or_else(|| {
            PlanError::MigrationError {
                from: from.clone(),
                to: to.clone(),
                reason: "Migration function not found in registry".to_string(),
            }
        })?;

        data = migration_fn(data).map_err(|e| PlanError::MigrationError {
            from: from.clone(),
            to: to.clone(),
            reason: e.to_string(),
        })?;

        if let Some(obj) = data.as_object_mut() {
            obj.insert("schema_version".to_string(), Value::String(to.clone()));
        }
        info!("migrated plan schema {} -> {}", from, to);
    }

    Ok(data)
}

/// Sequence of migrations needed to go from one version to another.
///
/// Empty if `from == to`, if either version is unknown, or if no chain of
/// registered migrations connects them.
pub fn find_migration_path(from: &str, to: &str) -> Vec<(String, String)> {
    if from == to {
        return Vec::new();
    }

    let versions = get_version_order();
    let registry = get_migration_registry();

    let (Some(from_idx), Some(to_idx)) = (
        versions.iter().position(|&v| v == from),
        versions.iter().position(|&v| v == to),
    ) else {
        return Vec::new();
    };

    if from_idx >= to_idx {
        return Vec::new();
    }

    let mut path = Vec::new();
    let mut current_idx = from_idx;

    while current_idx < to_idx {
        let current = versions[current_idx].to_string();

        let next = ((current_idx + 1)..=to_idx).find(|&next_idx| {
            registry.contains_key(&(current.clone(), versions[next_idx].to_string()))
        });

        match next {
            Some(next_idx) => {
                path.push((current, versions[next_idx].to_string()));
                current_idx = next_idx;
            }
            None => return Vec::new(),
        }
    }

    path
}

fn lines_mut(data: &mut Value) -> Result<Option<&mut Vec<Value>>> {
    let Some(obj) = data.as_object_mut() else {
        return Err(PlanError::MigrationError {
            from: "?".to_string(),
            to: "?".to_string(),
            reason: "plan document is not a JSON object".to_string(),
        });
    };
    Ok(obj.get_mut("lines").and_then(Value::as_array_mut))
}

/// 1.0.0 -> 1.1.0: sections gained a weight and a milestone type.
fn migrate_1_0_0_to_1_1_0(mut data: Value) -> Result<Value> {
    if let Some(lines) = lines_mut(&mut data)? {
        for line in lines.iter_mut().filter_map(Value::as_object_mut) {
            line.entry("milestone_weight").or_insert(Value::from(0));
            line.entry("milestone_type_new").or_insert(Value::Null);
        }
    }
    Ok(data)
}

/// 1.1.0 -> 2.0.0: record field names replaced by the plan-line layout.
fn migrate_1_1_0_to_2_0_0(mut data: Value) -> Result<Value> {
    if let Some(lines) = lines_mut(&mut data)? {
        for (index, line) in lines.iter_mut().enumerate() {
            let converted = match line.as_object_mut() {
                Some(obj) => convert_legacy_line(obj, index)?,
                None => continue,
            };
            *line = Value::Object(converted);
        }
    }
    Ok(data)
}

fn convert_legacy_line(old: &mut Map<String, Value>, index: usize) -> Result<Map<String, Value>> {
    let mut new = Map::new();

    let sequence = old
        .remove("sequence")
        .or_else(|| old.remove("id"))
        .and_then(|v| v.as_i64())
        .unwrap_or(index as i64 + 1);
    new.insert("sequence".to_string(), Value::from(sequence));

    let kind = match old.remove("display_type") {
        Some(Value::String(display_type)) => display_type.parse::<crate::plan::LineKind>()?,
        _ => crate::plan::LineKind::Task,
    };
    new.insert("kind".to_string(), Value::from(kind.as_str()));

    let name = old
        .remove("name")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    new.insert("name".to_string(), Value::from(name));

    let weight = old
        .remove("milestone_weight")
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    new.insert("weight".to_string(), Value::from(weight));

    let done = old
        .remove("status_done")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    new.insert("done".to_string(), Value::from(done));

    for (legacy, current) in [
        ("planned_start_date", "planned_start"),
        ("planned_end_date", "planned_end"),
        ("actual_start_date", "actual_start"),
        ("actual_end_date", "actual_end"),
    ] {
        if let Some(Value::String(text)) = old.remove(legacy) {
            match parse_date_text(&text) {
                Some(parsed) => {
                    new.insert(
                        current.to_string(),
                        Value::from(parsed.format("%Y-%m-%dT%H:%M:%S").to_string()),
                    );
                }
                None => warn!("dropping unparsable {} '{}' on line {}", legacy, text, sequence),
            }
        }
    }

    for (legacy, current) in [
        ("task_owner", "owner"),
        ("comments", "comments"),
        ("milestone_type_new", "milestone_type"),
    ] {
        if let Some(Value::String(text)) = old.remove(legacy) {
            if !text.trim().is_empty() {
                new.insert(current.to_string(), Value::from(text.trim()));
            }
        }
    }

    Ok(new)
}
