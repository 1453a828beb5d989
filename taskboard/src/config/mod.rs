//! Configuration system for the `taskboard` binary.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};

use taskboard_proto::filters::{SortDirection, SortField};
use taskboard_proto::params::{self, QueryParams, ViewState};
use taskboard_proto::task::{MAX_TASK_TITLE_LENGTH, TaskPriority, TaskStatus};

use crate::storage::DEFAULT_STORAGE_KEY;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    storage: StorageFileConfig,
    tasks: TasksFileConfig,
    view: ViewFileConfig,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    data_dir: Option<PathBuf>,
    key: Option<String>,
    in_memory: Option<bool>,
}

/// `[tasks]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TasksFileConfig {
    max_title_len: Option<usize>,
}

/// `[view]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ViewFileConfig {
    default_query: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    // -- Storage --
    /// Directory holding the task document.
    pub data_dir: PathBuf,
    /// Record key the document is stored under.
    pub storage_key: String,
    /// Keep everything in memory; nothing is written to disk.
    pub in_memory: bool,

    // -- Tasks --
    /// Maximum task title length in characters.
    pub max_title_len: usize,

    // -- View --
    /// Query string applied when a command gives no view criteria.
    pub default_query: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            in_memory: false,
            max_title_len: MAX_TASK_TITLE_LENGTH,
            default_query: String::new(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path
    /// (`~/.config/taskboard/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            data_dir: cli
                .data_dir
                .clone()
                .or_else(|| file.storage.data_dir.clone())
                .unwrap_or(defaults.data_dir),
            storage_key: file
                .storage
                .key
                .clone()
                .unwrap_or(defaults.storage_key),
            in_memory: cli.in_memory || file.storage.in_memory.unwrap_or(defaults.in_memory),
            max_title_len: file
                .tasks
                .max_title_len
                .unwrap_or(defaults.max_title_len),
            default_query: file
                .view
                .default_query
                .clone()
                .unwrap_or(defaults.default_query),
        }
    }
}

/// `<data dir>/taskboard`, or a temp-dir fallback when the platform has no
/// data directory.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("taskboard")
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Kanban task board backed by a local JSON store")]
pub struct CliArgs {
    /// Command to run (default: `list`).
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to config file (default: `~/.config/taskboard/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the task document.
    #[arg(long, global = true, env = "TASKBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep tasks in memory only; nothing is saved.
    #[arg(long, global = true)]
    pub in_memory: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info", env = "TASKBOARD_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskboard.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

/// Board subcommands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the visible tasks and the shareable query string.
    List(ViewArgs),

    /// Print the board columns.
    Board(ViewArgs),

    /// Create a task.
    Add {
        /// Task title.
        #[arg(long)]
        title: String,
        /// Task description.
        #[arg(long)]
        description: String,
        /// Initial column.
        #[arg(long, default_value = "Backlog")]
        status: TaskStatus,
        /// Priority.
        #[arg(long, default_value = "Medium")]
        priority: TaskPriority,
        /// Assignee.
        #[arg(long, default_value = "")]
        assignee: String,
        /// Tag; repeat for several.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Edit fields of a task.
    Edit {
        /// Task id.
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New priority.
        #[arg(long)]
        priority: Option<TaskPriority>,
        /// New assignee; an empty value unassigns.
        #[arg(long)]
        assignee: Option<String>,
        /// Replacement tag; repeat for several.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Remove every tag.
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
    },

    /// Drag a task onto another column.
    Move {
        /// Task id.
        id: String,
        /// Target column.
        status: TaskStatus,
    },

    /// Delete a task.
    Delete {
        /// Task id.
        id: String,
    },
}

/// View criteria shared by `list` and `board`.
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewArgs {
    /// Query string, e.g. `status=Done&sortField=priority`.
    #[arg(long)]
    pub query: Option<String>,

    /// Show only this status; repeat for several.
    #[arg(long)]
    pub status: Vec<TaskStatus>,

    /// Show only this priority.
    #[arg(long)]
    pub priority: Option<TaskPriority>,

    /// Case-insensitive text in title or description.
    #[arg(long)]
    pub search: Option<String>,

    /// Sort field (`createdAt`, `updatedAt`, `priority`).
    #[arg(long)]
    pub sort_field: Option<SortField>,

    /// Sort direction (`asc`, `desc`).
    #[arg(long, value_parser = parse_direction)]
    pub sort_direction: Option<SortDirection>,
}

impl ViewArgs {
    /// Decodes `--query` (or `default_query` when absent), then applies the
    /// individual flags on top.
    #[must_use]
    pub fn view_state(&self, default_query: &str) -> ViewState {
        let query = self.query.as_deref().unwrap_or(default_query);
        let mut view = params::decode(&QueryParams::parse(query));

        if !self.status.is_empty() {
            view.filters.statuses = self.status.iter().copied().collect();
        }
        if self.priority.is_some() {
            view.filters.priority = self.priority;
        }
        if let Some(search) = &self.search {
            view.filters.search.clone_from(search);
        }
        if let Some(field) = self.sort_field {
            view.sort.field = field;
        }
        if let Some(direction) = self.sort_direction {
            view.sort.direction = direction;
        }
        view
    }
}

fn parse_direction(s: &str) -> Result<SortDirection, String> {
    SortDirection::parse(s).ok_or_else(|| format!("unknown sort direction: {s:?}"))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskboard").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
