use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{DsnLinksError, Result};
use crate::types::CommandFamily;

/// Name of the configuration file stored inside the `.dsnlinks` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory used to store dsnlinks metadata.
pub const DSNLINKS_DIR: &str = ".dsnlinks";

/// How one command family is located in the host graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyConfig {
    /// Landmark names, compared case-insensitively.
    pub landmark_names: Vec<String>,
    /// Host types a landmark object may have.
    pub landmark_types: Vec<String>,
}

impl FamilyConfig {
    /// Returns `true` if `name` matches one of the landmark names.
    pub fn is_landmark(&self, name: &str) -> bool {
        self.landmark_names
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Syntax of the CDSEND parameter idiom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationSyntax {
    /// Keyword that introduces a dataset name, e.g. `&&DSN`.
    pub marker: String,
    /// Width in characters of the prefix stripped from a marker line before
    /// the name starts, e.g. 7 for `&&DSN1=`. Defaults to the marker length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_offset: Option<usize>,
    /// Prefix of comment lines, matched against the raw line.
    pub comment_prefix: String,
    /// Trailing character that continues a name on the next line.
    pub continuation: char,
}

impl ContinuationSyntax {
    /// Returns the name part of a trimmed marker line, or `None` if the line
    /// does not start with the marker.
    pub fn marker_name<'l>(&self, trimmed: &'l str) -> Option<&'l str> {
        if !trimmed.starts_with(self.marker.as_str()) {
            return None;
        }
        let width = self.name_offset.unwrap_or(self.marker.chars().count());
        let start = trimmed
            .char_indices()
            .nth(width)
            .map_or(trimmed.len(), |(idx, _)| idx);
        Some(&trimmed[start..])
    }
}

impl Default for ContinuationSyntax {
    fn default() -> Self {
        Self {
            marker: "&&DSN".to_string(),
            name_offset: None,
            comment_prefix: "//*".to_string(),
            continuation: '-',
        }
    }
}

/// Configuration for a dsnlinks extraction run.
///
/// Names the host types and landmarks the extractor looks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkerConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Host type of job steps (callers of the landmarks).
    pub step_type: String,
    /// Host type of datasets that already exist in the host.
    pub resolved_dataset_type: String,
    /// Host type given to datasets created by the extractor.
    pub placeholder_type: String,
    /// Host type of the folder that owns created datasets.
    pub container_type: String,
    /// Exact name of the folder that owns created datasets.
    pub container_name: String,
    /// FTP command blocks.
    pub transfer: FamilyConfig,
    /// CDSEND parameter blocks.
    pub parameter_send: FamilyConfig,
    pub continuation: ContinuationSyntax,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            step_type: "CAST_JCL_Step".to_string(),
            resolved_dataset_type: "CAST_JCL_ResolvedDataset".to_string(),
            placeholder_type: "FTP_Unknown_JCL_Dataset".to_string(),
            container_type: "CAST_JCL_RootDirectory".to_string(),
            container_name: "DataSets".to_string(),
            transfer: FamilyConfig {
                landmark_names: vec!["FTP".to_string()],
                landmark_types: vec![
                    "JCL_PROGRAM".to_string(),
                    "CAST_COBOL_UtilityProgram".to_string(),
                    "CAST_COBOL_ProgramPrototype".to_string(),
                    "CAST_JCL_CatalogedProcedure".to_string(),
                    "CAST_JCL_ProcedurePrototype".to_string(),
                ],
            },
            parameter_send: FamilyConfig {
                landmark_names: vec!["CDSEND".to_string()],
                landmark_types: vec![
                    "CAST_JCL_ProcedurePrototype".to_string(),
                    "CAST_JCL_CatalogedProcedure".to_string(),
                ],
            },
            continuation: ContinuationSyntax::default(),
        }
    }
}

impl LinkerConfig {
    /// Returns the landmark settings for a command family.
    pub fn family(&self, family: CommandFamily) -> &FamilyConfig {
        match family {
            CommandFamily::Transfer => &self.transfer,
            CommandFamily::ParameterSend => &self.parameter_send,
        }
    }
}

/// Returns the path to the `.dsnlinks` directory within the given project root.
pub fn get_dsnlinks_dir(project_root: &Path) -> PathBuf {
    project_root.join(DSNLINKS_DIR)
}

/// Returns the path to the configuration file within the `.dsnlinks` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_dsnlinks_dir(project_root).join(CONFIG_FILENAME)
}

/// Loads the configuration from disk, falling back to defaults when the
/// file does not exist.
pub fn load_config(project_root: &Path) -> Result<LinkerConfig> {
    let config_path = get_config_path(project_root);

    if !config_path.exists() {
        return Ok(LinkerConfig::default());
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| DsnLinksError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    serde_json::from_str(&contents).map_err(|e| DsnLinksError::Config {
        message: format!(
            "failed to parse config file '{}': {}",
            config_path.display(),
            e
        ),
    })
}

/// Saves the configuration to disk using an atomic write.
///
/// Writes to a temporary file first and then renames it to the final location.
pub fn save_config(project_root: &Path, config: &LinkerConfig) -> Result<()> {
    let dir = get_dsnlinks_dir(project_root);
    fs::create_dir_all(&dir).map_err(|e| DsnLinksError::Config {
        message: format!("failed to create directory '{}': {}", dir.display(), e),
    })?;

    let config_path = get_config_path(project_root);
    let tmp_path = config_path.with_extension("tmp");

    let json = serde_json::to_string_pretty(config).map_err(|e| DsnLinksError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    fs::write(&tmp_path, &json).map_err(|e| DsnLinksError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, &config_path).map_err(|e| DsnLinksError::Config {
        message: format!(
            "failed to rename '{}' to '{}': {}",
            tmp_path.display(),
            config_path.display(),
            e
        ),
    })?;

    Ok(())
}
