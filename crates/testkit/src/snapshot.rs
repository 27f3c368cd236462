//! Golden JSON snapshots.
//!
//! Values are serialized to pretty JSON with object keys sorted, so snapshot
//! files are stable regardless of map ordering. Set
//! `VOXELHOOKS_UPDATE_SNAPSHOTS=1` to rewrite goldens instead of comparing.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Environment variable that switches snapshot assertions into update mode.
pub const UPDATE_SNAPSHOTS_ENV: &str = "VOXELHOOKS_UPDATE_SNAPSHOTS";

/// Compare `value` against the golden file at `path`.
///
/// On mismatch the error names the first differing line.
pub fn assert_json_snapshot<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let actual = to_snapshot_json(value)?;

    if update_requested() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create snapshot directory {}", parent.display())
            })?;
        }
        fs::write(path, &actual)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        info!(path = %path.display(), "Snapshot updated");
        return Ok(());
    }

    let expected = fs::read_to_string(path).with_context(|| {
        format!(
            "Snapshot missing at {} (set {UPDATE_SNAPSHOTS_ENV}=1 to create it)",
            path.display()
        )
    })?;
    // Goldens checked out on Windows may carry CRLF endings.
    let expected = expected.replace("\r\n", "\n");

    if let Some((line, want, got)) = first_difference(&expected, &actual) {
        bail!(
            "Snapshot mismatch at {} line {line}: expected `{want}`, got `{got}` (set {UPDATE_SNAPSHOTS_ENV}=1 to update)",
            path.display()
        );
    }
    Ok(())
}

/// Render `value` the way snapshot files store it.
pub fn to_snapshot_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    let mut out =
        serde_json::to_string_pretty(&sort_keys(value)).context("Failed to format snapshot")?;
    out.push('\n');
    Ok(out)
}

fn update_requested() -> bool {
    std::env::var(UPDATE_SNAPSHOTS_ENV)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn first_difference<'a>(expected: &'a str, actual: &'a str) -> Option<(usize, &'a str, &'a str)> {
    let mut want = expected.lines();
    let mut got = actual.lines();
    let mut line = 1;
    loop {
        match (want.next(), got.next()) {
            (None, None) => return None,
            (w, g) if w != g => return Some((line, w.unwrap_or("<eof>"), g.unwrap_or("<eof>"))),
            _ => line += 1,
        }
    }
}
