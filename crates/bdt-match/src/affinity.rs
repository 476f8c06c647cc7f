//! Sector-to-sector relationship table.
//!
//! Relations are directional: a lookup always starts from the need's target
//! sector, and `A related-to B` says nothing about `B related-to A`.

use std::collections::BTreeMap;
use std::path::Path;

use bdt_core::Sector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Exact,
    Related,
    Complementary,
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRelations {
    #[serde(default)]
    pub related: Vec<Sector>,
    #[serde(default)]
    pub complementary: Vec<Sector>,
}

#[derive(Debug, Error)]
pub enum AffinityError {
    #[error("reading sector table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing sector table: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Extra top-level keys such as `version` are ignored.
#[derive(Debug, Clone, Deserialize)]
struct SectorTableFile {
    #[serde(default)]
    sectors: Vec<SectorRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct SectorRow {
    sector: Sector,
    #[serde(flatten)]
    relations: SectorRelations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorAffinityTable {
    relations: BTreeMap<Sector, SectorRelations>,
}

impl Default for SectorAffinityTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SectorAffinityTable {
    pub fn empty() -> Self {
        Self {
            relations: BTreeMap::new(),
        }
    }

    /// The seven-sector table the tool ships with.
    pub fn builtin() -> Self {
        use Sector::*;

        let mut table = Self::empty();
        table.declare(Technology, [Finance, Healthcare], [Manufacturing, Education]);
        table.declare(Finance, [Technology, RealEstate], [Healthcare, Retail]);
        table.declare(Healthcare, [Technology, Education], [Finance, Manufacturing]);
        table.declare(Manufacturing, [Technology, Retail], [Finance, Healthcare]);
        table.declare(Retail, [Technology, Manufacturing], [Finance, Education]);
        table.declare(Education, [Technology, Healthcare], [Finance, Retail]);
        table.declare(RealEstate, [Finance, Technology], [Retail, Manufacturing]);
        table
    }

    /// Sets the relations declared *from* `sector`. Replaces any earlier
    /// declaration for the same sector.
    pub fn declare(
        &mut self,
        sector: Sector,
        related: impl IntoIterator<Item = Sector>,
        complementary: impl IntoIterator<Item = Sector>,
    ) {
        self.relations.insert(
            sector,
            SectorRelations {
                related: related.into_iter().collect(),
                complementary: complementary.into_iter().collect(),
            },
        );
    }

    pub fn relations(&self, sector: &Sector) -> Option<&SectorRelations> {
        self.relations.get(sector)
    }

    pub fn is_related(&self, from: &Sector, to: &Sector) -> bool {
        self.relations(from)
            .is_some_and(|r| r.related.contains(to))
    }

    pub fn is_complementary(&self, from: &Sector, to: &Sector) -> bool {
        self.relations(from)
            .is_some_and(|r| r.complementary.contains(to))
    }

    /// Classifies `to` as seen from `from`.
    pub fn affinity(&self, from: &Sector, to: &Sector) -> Affinity {
        if from == to {
            Affinity::Exact
        } else if self.is_related(from, to) {
            Affinity::Related
        } else if self.is_complementary(from, to) {
            Affinity::Complementary
        } else {
            Affinity::None
        }
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, AffinityError> {
        let file: SectorTableFile = serde_yaml::from_str(text)?;
        let mut table = Self::empty();
        for row in file.sectors {
            table.relations.insert(row.sector, row.relations);
        }
        Ok(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AffinityError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AffinityError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Sector::*;

    #[test]
    fn builtin_table_covers_seven_sectors() {
        let table = SectorAffinityTable::builtin();
        assert_eq!(table.len(), 7);
        assert!(table.relations(&Other("Other".into())).is_none());
    }

    #[test]
    fn lookups_follow_declared_direction() {
        let table = SectorAffinityTable::builtin();
        // Education -> Finance is declared, Finance -> Education is not.
        assert_eq!(table.affinity(&Education, &Finance), Affinity::Complementary);
        assert_eq!(table.affinity(&Finance, &Education), Affinity::None);
        assert_eq!(table.affinity(&Technology, &Finance), Affinity::Related);
        assert_eq!(table.affinity(&Retail, &Retail), Affinity::Exact);
    }

    #[test]
    fn yaml_table_replaces_builtin() {
        let yaml = r#"
version: 1
sectors:
  - sector: Technology
    related: [Retail]
  - sector: Aerospace
    complementary: [Manufacturing]
"#;
        let table = SectorAffinityTable::from_yaml_str(yaml).expect("parse");
        assert_eq!(table.len(), 2);
        assert!(table.is_related(&Technology, &Retail));
        assert!(!table.is_related(&Technology, &Finance));
        assert!(table.is_complementary(&Other("Aerospace".into()), &Manufacturing));
    }

    #[test]
    fn yaml_table_needs_no_version_key() {
        let yaml = "sectors:\n  - sector: Retail\n    related: [Finance]\n";
        let table = SectorAffinityTable::from_yaml_str(yaml).expect("parse");
        assert_eq!(table.len(), 1);
        assert!(table.is_related(&Retail, &Finance));
        assert_eq!(table.affinity(&Retail, &Healthcare), Affinity::None);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = SectorAffinityTable::load(dir.path().join("sectors.yaml")).unwrap_err();
        assert!(matches!(err, AffinityError::Io { .. }));
    }
}
