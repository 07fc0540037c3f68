use std::{collections::BTreeMap, io::Read, path::Path};

use anyhow::Context as _;

use crate::dataset::card_id::CardId;
use crate::foundation::error::{MosaicError, MosaicResult};

/// Placeholder used for class ids that no manifest row claims.
pub const UNUSED_CLASS_NAME: &str = "unused";

#[derive(Debug, serde::Deserialize)]
struct ManifestRow {
    #[serde(rename = "Set #")]
    set_number: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ClassEntry {
    class_id: u32,
    name: String,
}

/// Card identifier -> (YOLO class id, display name).
///
/// The class id is the numeric value of the identifier itself (`"050"` -> 50); ids
/// are never compacted, so gaps in numbering become unused classes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassMap {
    entries: BTreeMap<CardId, ClassEntry>,
}

impl ClassMap {
    /// Reads a CSV manifest with `Set #` and `Name` columns.
    pub fn from_csv_path(path: &Path) -> MosaicResult<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open card manifest '{}'", path.display()))?;
        Self::from_csv_reader(file).map_err(|e| match e {
            MosaicError::Manifest(msg) => {
                MosaicError::manifest(format!("'{}': {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Same as [`ClassMap::from_csv_path`] over any reader.
    pub fn from_csv_reader<R: Read>(reader: R) -> MosaicResult<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let mut map = Self::default();
        for (idx, row) in csv.deserialize::<ManifestRow>().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            let row = row.map_err(|e| MosaicError::manifest(format!("line {line}: {e}")))?;
            map.insert_row(&row.set_number, &row.name)
                .map_err(|e| MosaicError::manifest(format!("line {line}: {e}")))?;
        }

        if map.is_empty() {
            return Err(MosaicError::manifest("manifest contains no cards"));
        }
        Ok(map)
    }

    /// Builds a map from in-memory `(set number, name)` pairs.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str)>) -> MosaicResult<Self> {
        let mut map = Self::default();
        for (set_number, name) in rows {
            map.insert_row(set_number, name)
                .map_err(MosaicError::manifest)?;
        }
        Ok(map)
    }

    /// Adds one manifest row. The first row seen for an identifier wins.
    fn insert_row(&mut self, set_number: &str, name: &str) -> Result<(), String> {
        let token = set_number.split('/').next().unwrap_or_default().trim();
        if token.is_empty() {
            return Err(format!("empty set number in '{set_number}'"));
        }
        let class_id: u32 = token
            .parse()
            .map_err(|_| format!("set number '{set_number}' does not start with a number"))?;

        let id = CardId::from_token(token);
        self.entries.entry(id).or_insert_with(|| ClassEntry {
            class_id,
            name: name.trim().replace(' ', "_"),
        });
        Ok(())
    }

    /// Number of mapped card ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the manifest had no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Class id of `id`, if mapped.
    pub fn class_id(&self, id: &CardId) -> Option<u32> {
        self.entries.get(id).map(|e| e.class_id)
    }

    /// Display name of `id`, if mapped.
    pub fn name(&self, id: &CardId) -> Option<&str> {
        self.entries.get(id).map(|e| e.name.as_str())
    }

    /// Highest class id in use.
    pub fn max_class_id(&self) -> Option<u32> {
        self.entries.values().map(|e| e.class_id).max()
    }

    /// `nc` for the dataset manifest: highest class id + 1.
    pub fn class_count(&self) -> u32 {
        self.max_class_id().map_or(0, |m| m + 1)
    }

    /// Names indexed by class id; ids without a card get [`UNUSED_CLASS_NAME`].
    pub fn names_by_class_id(&self) -> Vec<String> {
        let mut names = vec![UNUSED_CLASS_NAME.to_string(); self.class_count() as usize];
        for entry in self.entries.values() {
            names[entry.class_id as usize] = entry.name.clone();
        }
        names
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/class_map.rs"]
mod tests;
