use std::path::Path;

use crate::error::{ClassifyError, Result};

/// Class names index-aligned with a model's output vector.
///
/// Loaded once at startup and shared read-only (usually behind an `Arc`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabelTable {
    labels: Vec<String>,
}

impl ClassLabelTable {
    /// Fails with `Config` for an empty list.
    pub fn from_labels<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Result<Self> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(ClassifyError::config("label table is empty"));
        }
        Ok(ClassLabelTable { labels })
    }

    /// Parses either a JSON array of strings or plain text with one label per
    /// line. Blank lines are skipped and surrounding whitespace is trimmed.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') {
            let labels: Vec<String> = serde_json::from_str(trimmed)?;
            return ClassLabelTable::from_labels(labels);
        }
        ClassLabelTable::from_labels(
            text.lines().map(str::trim).filter(|l| !l.is_empty()),
        )
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        ClassLabelTable::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_json_array() {
        let table = ClassLabelTable::parse(r#"["falldown", "none"]"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0), Some("falldown"));
        assert_eq!(table.get(2), None);
    }

    #[test]
    fn test_parse_lines() {
        let table = ClassLabelTable::parse("cat\n  dog \n\nbird\n").unwrap();
        assert_eq!(table.as_slice(), &["cat", "dog", "bird"]);
    }

    #[test]
    fn test_empty_table_is_rejected() {
        assert!(matches!(
            ClassLabelTable::parse("\n \n").unwrap_err(),
            ClassifyError::Config { .. }
        ));
        assert!(matches!(
            ClassLabelTable::parse("[]").unwrap_err(),
            ClassifyError::Config { .. }
        ));
    }

    #[test]
    fn test_bad_json_is_reported() {
        assert!(matches!(
            ClassLabelTable::parse("[\"cat\", 3]").unwrap_err(),
            ClassifyError::Json(_)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "wired_table").unwrap();
        writeln!(file, "wireless_table").unwrap();
        let table = ClassLabelTable::load(file.path()).unwrap();
        assert_eq!(table.as_slice(), &["wired_table", "wireless_table"]);
    }
}
