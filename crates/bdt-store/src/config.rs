use std::path::{Path, PathBuf};

use bdt_match::{AffinityError, SectorAffinityTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_file: PathBuf,
    pub audit_log: PathBuf,
    /// Optional YAML file replacing the built-in sector affinity table.
    pub sectors_file: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("business_data.json"),
            audit_log: PathBuf::from("business_operations.log"),
            sectors_file: None,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_file: std::env::var("BDT_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            audit_log: std::env::var("BDT_AUDIT_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.audit_log),
            sectors_file: std::env::var("BDT_SECTORS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Both files under `dir`, keeping the default file names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let defaults = Self::default();
        Self {
            data_file: dir.join(defaults.data_file),
            audit_log: dir.join(defaults.audit_log),
            sectors_file: None,
        }
    }

    pub fn sector_table(&self) -> Result<SectorAffinityTable, AffinityError> {
        match &self.sectors_file {
            Some(path) => SectorAffinityTable::load(path),
            None => Ok(SectorAffinityTable::builtin()),
        }
    }
}
