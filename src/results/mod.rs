//! Writes a completed crawl's levels to `RESULTS/`: one pretty-printed JSON
//! file matching the §6 field contract, and a plaintext list of every
//! crawled URL.
//!
//! Grounded in the teacher's `StorageClient`: same "serialize, then hand the
//! bytes to a named sink" shape, re-targeted from S3 upload to a local file.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::LevelRecord;

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("failed to create results directory: {0}")]
    CreateDir(std::io::Error),
    #[error("failed to serialize levels: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Paths of the two files a completed crawl writes under `RESULTS/`.
#[derive(Debug, Clone)]
pub struct ResultFiles {
    pub json_path: PathBuf,
    pub links_path: PathBuf,
}

/// Write `levels` as the flat sibling files `results_dir/<domain>-<dd-MM-YYYY-HH-mm-ss>.json`
/// (tab-indented) and `results_dir/<domain>-<dd-MM-YYYY-HH-mm-ss>-links-only.txt`
/// (one crawled URL per line) that §6's external-interface contract binds.
pub fn write_results(
    results_dir: &Path,
    domain: &str,
    levels: &[LevelRecord],
    timestamp: chrono::DateTime<chrono::Utc>,
) -> Result<ResultFiles, ResultsError> {
    std::fs::create_dir_all(results_dir).map_err(ResultsError::CreateDir)?;

    let stamp = timestamp.format("%d-%m-%Y-%H-%M-%S");
    let json_path = results_dir.join(format!("{domain}-{stamp}.json"));
    let links_path = results_dir.join(format!("{domain}-{stamp}-links-only.txt"));

    write_json(&json_path, levels)?;
    write_link_list(&links_path, levels)?;

    Ok(ResultFiles {
        json_path,
        links_path,
    })
}

fn write_json(path: &Path, levels: &[LevelRecord]) -> Result<(), ResultsError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(levels, &mut ser)?;

    std::fs::write(path, buf).map_err(|source| ResultsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_link_list(path: &Path, levels: &[LevelRecord]) -> Result<(), ResultsError> {
    let file = std::fs::File::create(path).map_err(|source| ResultsError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = std::io::BufWriter::new(file);
    for level in levels {
        for page in &level.pages {
            writeln!(writer, "{}", page.url).map_err(|source| ResultsError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    writer.flush().map_err(|source| ResultsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageRecordJson;
    use std::collections::HashMap;

    fn sample_levels() -> Vec<LevelRecord> {
        vec![LevelRecord {
            level_num: 0,
            pages: vec![PageRecordJson {
                url: "https://example.com/".to_string(),
                h1: "Home".to_string(),
                title: "Example".to_string(),
                links: vec!["https://example.com/about/".to_string()],
                hreflang_url_map: HashMap::new(),
                imgs: vec![],
                canonical_url: "https://example.com/".to_string(),
                no_index: false,
            }],
        }]
    }

    #[test]
    fn writes_json_and_link_list() {
        let tmp = tempfile::tempdir().unwrap();
        let ts = chrono::DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let files = write_results(tmp.path(), "example.com", &sample_levels(), ts).unwrap();

        assert!(files
            .json_path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("example.com-"));
        assert_eq!(files.json_path.parent().unwrap(), tmp.path());
        assert_eq!(files.links_path.parent().unwrap(), tmp.path());

        let json = std::fs::read_to_string(&files.json_path).unwrap();
        assert!(json.contains("\"levelNum\""));
        assert!(json.contains("\"crawledPages\""));
        assert!(json.contains("\t"));

        let links = std::fs::read_to_string(&files.links_path).unwrap();
        assert_eq!(links.trim(), "https://example.com/");
    }

    #[test]
    fn filenames_use_expected_timestamp_format() {
        let tmp = tempfile::tempdir().unwrap();
        let ts = chrono::DateTime::parse_from_rfc3339("2026-07-31T14:09:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let files = write_results(tmp.path(), "site.org", &sample_levels(), ts).unwrap();
        assert_eq!(
            files.json_path.file_name().unwrap().to_str().unwrap(),
            "site.org-31-07-2026-14-09-00.json"
        );
        assert_eq!(
            files.links_path.file_name().unwrap().to_str().unwrap(),
            "site.org-31-07-2026-14-09-00-links-only.txt"
        );
    }
}
