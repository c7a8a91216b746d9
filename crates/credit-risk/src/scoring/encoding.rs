use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("employment status '{0}' is not in the encoding table")]
    UnknownCategory(String),
    #[error("encoding table drift: model expects {expected}, serving table is {found}")]
    Drift { expected: String, found: String },
    #[error("invalid encoding table: {0}")]
    Invalid(String),
    #[error("failed to access encoding table: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed encoding table: {0}")]
    Json(#[from] serde_json::Error),
}

/// Versioned mapping from category label to integer code. Codes are the
/// positions of the categories in sorted order, so a table fitted on the same
/// category set always yields the same codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredEncodingTable")]
pub struct EncodingTable {
    version: u32,
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct StoredEncodingTable {
    version: u32,
    categories: Vec<String>,
}

impl TryFrom<StoredEncodingTable> for EncodingTable {
    type Error = EncodingError;

    fn try_from(stored: StoredEncodingTable) -> Result<Self, Self::Error> {
        Self::from_categories(stored.version, stored.categories)
    }
}

impl EncodingTable {
    pub fn fit<I, S>(version: u32, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let categories: BTreeSet<String> = values
            .into_iter()
            .map(|value| value.as_ref().trim().to_string())
            .filter(|value| !value.is_empty())
            .collect();

        Self {
            version,
            categories: categories.into_iter().collect(),
        }
    }

    /// Accepts an explicit category list, which must already be sorted and
    /// free of duplicates.
    pub fn from_categories(version: u32, categories: Vec<String>) -> Result<Self, EncodingError> {
        if categories.is_empty() {
            return Err(EncodingError::Invalid("no categories".to_string()));
        }
        if categories.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(EncodingError::Invalid(
                "categories must be sorted and unique".to_string(),
            ));
        }

        Ok(Self {
            version,
            categories,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn encode(&self, value: &str) -> Result<u32, EncodingError> {
        let value = value.trim();
        self.categories
            .binary_search_by(|category| category.as_str().cmp(value))
            .map(|position| position as u32)
            .map_err(|_| EncodingError::UnknownCategory(value.to_string()))
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.categories.get(code as usize).map(String::as_str)
    }

    pub fn fingerprint(&self) -> String {
        format!("v{}[{}]", self.version, self.categories.join("|"))
    }

    pub fn ensure_compatible(&self, serving: &EncodingTable) -> Result<(), EncodingError> {
        if self == serving {
            Ok(())
        } else {
            Err(EncodingError::Drift {
                expected: self.fingerprint(),
                found: serving.fingerprint(),
            })
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EncodingError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), EncodingError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EncodingTable {
        EncodingTable::fit(1, ["Unemployed", "Employed", "Self-Employed", "Employed"])
    }

    #[test]
    fn fit_assigns_codes_in_sorted_order() {
        let table = table();
        assert_eq!(
            table.categories(),
            ["Employed", "Self-Employed", "Unemployed"]
        );
        assert_eq!(table.encode("Employed").expect("known"), 0);
        assert_eq!(table.encode("Self-Employed").expect("known"), 1);
        assert_eq!(table.encode(" Unemployed ").expect("known"), 2);
        assert_eq!(table.decode(1), Some("Self-Employed"));
        assert_eq!(table.decode(3), None);
    }

    #[test]
    fn unknown_category_is_an_error() {
        match table().encode("Retired") {
            Err(EncodingError::UnknownCategory(value)) => assert_eq!(value, "Retired"),
            other => panic!("expected unknown category, got {other:?}"),
        }
    }

    #[test]
    fn fit_is_independent_of_input_order() {
        let reordered = EncodingTable::fit(1, ["Self-Employed", "Unemployed", "Employed"]);
        assert_eq!(reordered, table());
        assert!(table().ensure_compatible(&reordered).is_ok());
    }

    #[test]
    fn drift_is_detected_on_category_or_version_change() {
        let narrower = EncodingTable::fit(1, ["Employed", "Unemployed"]);
        match table().ensure_compatible(&narrower) {
            Err(EncodingError::Drift { expected, found }) => {
                assert_eq!(expected, "v1[Employed|Self-Employed|Unemployed]");
                assert_eq!(found, "v1[Employed|Unemployed]");
            }
            other => panic!("expected drift, got {other:?}"),
        }

        let bumped = EncodingTable::fit(2, ["Employed", "Self-Employed", "Unemployed"]);
        assert!(table().ensure_compatible(&bumped).is_err());
    }

    #[test]
    fn unsorted_stored_tables_are_rejected() {
        let json = r#"{"version":1,"categories":["Unemployed","Employed"]}"#;
        let result: Result<EncodingTable, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn save_and_load_preserve_the_table() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("encoding").join("employment.json");
        table().save(&path).expect("table saved");
        let loaded = EncodingTable::load(&path).expect("table loads");
        assert_eq!(loaded, table());
    }
}
