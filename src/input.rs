use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{error, warn};

use crate::record::RawBag;

/// One URL per line. Blank lines and `#` comments are skipped. A missing
/// file is not an error: it just means there is nothing to fetch.
pub fn read_urls(path: &Path) -> Vec<String> {
    let body = match fs::read_to_string(path) {
        Ok(body) => body,
        Err(e) => {
            warn!("Input file {} not readable ({}); no URLs to process", path.display(), e);
            return Vec::new();
        }
    };

    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Sample records used when no URL produced anything. Must be a JSON array
/// of objects; anything else is logged and yields nothing.
pub fn read_sample(path: &Path) -> Vec<RawBag> {
    match load_sample(path) {
        Ok(bags) => bags,
        Err(e) => {
            error!("Could not load sample data from {}: {:#}", path.display(), e);
            Vec::new()
        }
    }
}

fn load_sample(path: &Path) -> anyhow::Result<Vec<RawBag>> {
    let body = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&body)?;
    let Value::Array(items) = value else {
        anyhow::bail!("expected a JSON array of records");
    };

    let bags: Vec<RawBag> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            other => {
                warn!("Skipping non-object sample entry: {}", other);
                None
            }
        })
        .collect();
    Ok(bags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_skip_blanks_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        fs::write(
            &path,
            "# search pages\n\nhttps://a.example/jobs\n   https://b.example/jobs  \n  # indented comment\n",
        )
        .unwrap();
        assert_eq!(
            read_urls(&path),
            vec!["https://a.example/jobs", "https://b.example/jobs"]
        );
    }

    #[test]
    fn missing_url_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_urls(&dir.path().join("absent.txt")).is_empty());
    }

    #[test]
    fn sample_array_of_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        fs::write(&path, r#"[{"id": "1", "salaryInfo": "$10"}, 3, {"id": "2"}]"#).unwrap();
        let bags = read_sample(&path);
        assert_eq!(bags.len(), 2);
        assert_eq!(bags[0]["salaryInfo"], "$10");
        assert_eq!(bags[1]["id"], "2");
    }

    #[test]
    fn bad_sample_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        fs::write(&path, r#"{"id": "1"}"#).unwrap();
        assert!(read_sample(&path).is_empty());
        fs::write(&path, "not json").unwrap();
        assert!(read_sample(&path).is_empty());
        assert!(read_sample(&dir.path().join("absent.json")).is_empty());
    }

    #[test]
    fn bundled_sample_loads() {
        let bags = read_sample(Path::new("data/sample_jobs.json"));
        assert!(!bags.is_empty());
    }
}
