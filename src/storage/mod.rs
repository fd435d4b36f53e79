use std::fs;
use std::path::Path;

use tracing::debug;

use crate::collections::SuiteDocument;
use crate::error::SuiteError;

pub fn load_suite(path: &Path) -> Result<SuiteDocument, SuiteError> {
    let raw = fs::read_to_string(path).map_err(|source| SuiteError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = raw.len(), "loaded suite document");
    SuiteDocument::from_json(&raw)
}

/// Create (or truncate) a report file, creating parent directories first.
pub fn create_report_file(path: &Path) -> std::io::Result<fs::File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::File::create(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_suite_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = load_suite(&path).unwrap_err();
        assert!(matches!(err, SuiteError::Read { .. }));
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn load_suite_parses_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.json");
        fs::write(
            &path,
            r#"{ "name": "smoke", "scenarios": [ { "name": "root", "request": { "url": "https://a.test/" } } ] }"#,
        )
        .unwrap();

        let document = load_suite(&path).unwrap();
        assert_eq!(document.name, "smoke");
        assert_eq!(document.scenarios.len(), 1);
    }

    #[test]
    fn load_suite_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_suite(&path), Err(SuiteError::Parse(_))));
    }

    #[test]
    fn create_report_file_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/ci/result.json");

        create_report_file(&path).unwrap();
        assert!(path.exists());
    }
}
