use super::ModelLoadError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TaxonomyRecord {
    id: String,
    group: String,
}

/// Read-only mapping from structure id to taxonomic or structural group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonomyIndex {
    groups: HashMap<String, String>,
}

impl TaxonomyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an `id,group` CSV file. Later rows for the same id replace earlier ones.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let path_str = path.to_string_lossy().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| ModelLoadError::Csv {
                path: path_str.clone(),
                source: e,
            })?;

        let mut groups = HashMap::new();
        for result in reader.deserialize::<TaxonomyRecord>() {
            let record = result.map_err(|e| ModelLoadError::Csv {
                path: path_str.clone(),
                source: e,
            })?;
            groups.insert(record.id, record.group);
        }
        Ok(Self { groups })
    }

    pub fn insert(&mut self, id: impl Into<String>, group: impl Into<String>) {
        self.groups.insert(id.into(), group.into());
    }

    pub fn group_of(&self, id: &str) -> Option<&str> {
        self.groups.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_reads_id_group_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("taxonomy.csv");
        fs::write(&path, "id,group\n1abc, b.69.8\n2xyz,c.1.2\n").unwrap();

        let index = TaxonomyIndex::load(&path).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.group_of("1abc"), Some("b.69.8"));
        assert_eq!(index.group_of("9zzz"), None);
    }

    #[test]
    fn load_fails_for_missing_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("taxonomy.csv");
        fs::write(&path, "id\n1abc\n").unwrap();
        assert!(matches!(
            TaxonomyIndex::load(&path),
            Err(ModelLoadError::Csv { .. })
        ));
    }

    #[test]
    fn insert_overrides_existing_group() {
        let mut index = TaxonomyIndex::new();
        index.insert("1abc", "a");
        index.insert("1abc", "b");
        assert_eq!(index.group_of("1abc"), Some("b"));
        assert!(!index.is_empty());
    }
}
