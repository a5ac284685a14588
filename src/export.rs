use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Separator for list values flattened into a single CSV cell.
const LIST_SEPARATOR: &str = "; ";

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(())
}

/// Pretty-printed JSON array. Field order follows the record type.
pub fn write_json<T: Serialize>(rows: &[T], path: &Path) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let body = serde_json::to_string_pretty(rows)?;
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {} records to {}", rows.len(), path.display());
    Ok(())
}

/// CSV with one column per key seen in any row, sorted by name. Lists are
/// joined with `; `, missing and null values are empty cells. No rows means
/// an empty file.
pub fn write_csv<T: Serialize>(rows: &[T], path: &Path) -> anyhow::Result<()> {
    ensure_parent(path)?;

    let objects = rows
        .iter()
        .map(|row| match serde_json::to_value(row)? {
            Value::Object(map) => Ok(map),
            other => anyhow::bail!("CSV rows must serialize to objects, got {}", other),
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if objects.is_empty() {
        fs::write(path, "").with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote 0 records to {}", path.display());
        return Ok(());
    }

    let header: BTreeSet<&str> = objects
        .iter()
        .flat_map(|obj| obj.keys().map(String::as_str))
        .collect();

    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    writer.write_record(&header)?;
    for obj in &objects {
        writer.write_record(header.iter().map(|key| cell(obj.get(*key))))?;
    }
    writer.flush()?;

    info!("Wrote {} records to {}", objects.len(), path.display());
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| cell(Some(v)))
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        Some(other) => other.to_string(),
    }
}
