//! `fleet.yaml`: declarative fleet configuration.
//!
//! # Lookup order
//!
//! 1. An explicit `--config <path>` (must exist).
//! 2. `<workspace>/fleet.yaml`
//! 3. `<home>/.fleet/fleet.yaml`
//! 4. Built-in defaults.
//!
//! As with the rest of the crate, every function that touches the home
//! directory has an `_at(home, …)` form used by tests and a no-arg wrapper
//! that derives `home` from `dirs::home_dir()`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{ChangeBranch, MergeMethod, Owner, RepoName, Visibility};
use crate::workspace::RepoFilter;

pub const CONFIG_FILE_NAME: &str = "fleet.yaml";

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Root of `fleet.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Organization used when a checkout's owner cannot be detected, and for
    /// newly bootstrapped repositories.
    #[serde(default = "default_org")]
    pub org: Owner,
    /// Directory holding one checkout per fleet repository.
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
    #[serde(default)]
    pub change_branch: ChangeBranch,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    #[serde(default)]
    pub merge_method: MergeMethod,
    #[serde(default)]
    pub repos: RepoFilter,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// Directory of `.tera` files overriding the embedded PR templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            org: default_org(),
            workspace: default_workspace(),
            change_branch: ChangeBranch::default(),
            base_branch: default_base_branch(),
            merge_method: MergeMethod::default(),
            repos: RepoFilter::default(),
            template: TemplateConfig::default(),
            bootstrap: BootstrapConfig::default(),
            templates_dir: None,
        }
    }
}

/// Canonical template repository and the paths mirrored from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Checkout name of the template inside the workspace.
    #[serde(default = "default_template_repo")]
    pub repo: RepoName,
    /// Paths (relative to the repository root) mirrored into each target.
    /// `"."` mirrors the whole tree, minus `.git`.
    #[serde(default = "default_template_paths")]
    pub paths: Vec<PathBuf>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            repo: default_template_repo(),
            paths: default_template_paths(),
        }
    }
}

/// Post-creation configuration applied by `fleet bootstrap`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// `owner/name` of the GitHub template repository.
    #[serde(default = "default_template_ref")]
    pub template_ref: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub protection: Option<ProtectionConfig>,
    #[serde(default)]
    pub rewrite: Option<RewriteConfig>,
    /// Workflow file (or name) dispatched once the repository is ready.
    #[serde(default)]
    pub workflow: Option<String>,
    /// Fixed pause between consecutive workflow dispatches.
    #[serde(default = "default_dispatch_delay_secs")]
    pub dispatch_delay_secs: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            template_ref: default_template_ref(),
            visibility: Visibility::default(),
            protection: None,
            rewrite: None,
            workflow: None,
            dispatch_delay_secs: default_dispatch_delay_secs(),
        }
    }
}

/// Branch protection for the default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionConfig {
    /// Exact status-check names that must pass before merging.
    #[serde(default)]
    pub required_checks: Vec<String>,
    #[serde(default = "default_true")]
    pub block_creations: bool,
}

/// A configuration file in the new repository whose placeholder tokens are
/// replaced with values derived from the repository name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteConfig {
    pub path: PathBuf,
    pub placeholders: Vec<Placeholder>,
    #[serde(default = "default_rewrite_message")]
    pub commit_message: String,
}

/// One `token → value` entry of a [`RewriteConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub token: String,
    pub value: NameForm,
}

/// A value derived from a repository name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameForm {
    /// The name verbatim.
    Name,
    /// Whitespace runs replaced by `-` (`"Ford F 150"` → `"Ford-F-150"`).
    DashedName,
    /// Uppercased with spaces removed (`"Ford F-150"` → `"FORDF-150"`).
    UpperName,
}

impl NameForm {
    pub fn apply(&self, name: &str) -> String {
        match self {
            NameForm::Name => name.to_string(),
            NameForm::DashedName => name.split_whitespace().collect::<Vec<_>>().join("-"),
            NameForm::UpperName => name.replace(' ', "").to_uppercase(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_org() -> Owner {
    Owner::from("OBDb")
}

fn default_workspace() -> PathBuf {
    PathBuf::from("workspace")
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_template_repo() -> RepoName {
    RepoName::from(".vehicle-template")
}

fn default_template_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from(".github/workflows"),
        PathBuf::from("schemas"),
        PathBuf::from("tests"),
    ]
}

fn default_template_ref() -> String {
    "OBDb/.vehicle-template".to_string()
}

fn default_dispatch_delay_secs() -> u64 {
    2
}

fn default_rewrite_message() -> String {
    "Configure repository from template".to_string()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl FleetConfig {
    /// Reject configurations that would make the propagator unsafe.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.change_branch.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid("change_branch must not be empty".into()));
        }
        if self.change_branch.as_str() == self.base_branch {
            return Err(ConfigError::Invalid(format!(
                "change_branch '{}' must differ from base_branch",
                self.change_branch
            )));
        }
        if let Some(rewrite) = &self.bootstrap.rewrite {
            if rewrite.placeholders.iter().any(|p| p.token.is_empty()) {
                return Err(ConfigError::Invalid(
                    "bootstrap.rewrite placeholder tokens must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// The workspace directory, resolved against `base` when relative.
    pub fn workspace_dir(&self, base: &Path) -> PathBuf {
        if self.workspace.is_absolute() {
            self.workspace.clone()
        } else {
            base.join(&self.workspace)
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load and validate the config file at `path`.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<FleetConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let config: FleetConfig = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    Ok(config)
}

/// `<home>/.fleet/fleet.yaml`: pure, no I/O.
pub fn user_config_path_at(home: &Path) -> PathBuf {
    home.join(".fleet").join(CONFIG_FILE_NAME)
}

/// Resolve the effective config following the lookup order above.
///
/// `home` is only consulted when neither `explicit` nor the workspace file
/// applies; `None` skips the user-level file. Returns the config and the
/// path it came from (`None` for defaults).
pub fn resolve_at(
    home: Option<&Path>,
    explicit: Option<&Path>,
    workspace_hint: &Path,
) -> Result<(FleetConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = explicit {
        return Ok((load_at(path)?, Some(path.to_path_buf())));
    }
    let candidates = std::iter::once(workspace_hint.join(CONFIG_FILE_NAME))
        .chain(home.map(user_config_path_at));
    for candidate in candidates {
        if candidate.exists() {
            return Ok((load_at(&candidate)?, Some(candidate)));
        }
    }
    Ok((FleetConfig::default(), None))
}

/// `resolve_at` with the current user's home directory.
pub fn resolve(
    explicit: Option<&Path>,
    workspace_hint: &Path,
) -> Result<(FleetConfig, Option<PathBuf>), ConfigError> {
    resolve_at(dirs::home_dir().as_deref(), explicit, workspace_hint)
}

/// Atomically save `config` to `path`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `rename`.
pub fn save_at(path: &Path, config: &FleetConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
