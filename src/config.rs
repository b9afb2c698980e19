//! Configuration for the editor.
//!
//! Settings are read from a TOML file, then overridden from the environment
//! and finally from CLI flags:
//!
//! ```toml
//! doc_root = "/srv/docs"
//! doc_src = "source"
//! regen_script = "./regen.sh"
//! regen_pdf_script = "./regen-pdf.sh"
//! allow_push = false
//! modules = false
//! secret_key = "change-me"
//! vcs = "hg"
//! default_view = "index.html"
//! preview_command = "pandoc -f rst -t html5"
//! source_extension = ".rst"
//! archive_suffix = ".txt"
//! link_strategy = "unique-link"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//! ```
//!
//! The settings file is located in this order: explicit `--config` path,
//! `SETTINGS_FILE`, `./weditor.toml`, `<config dir>/weditor/weditor.toml`.
//! When none exists the defaults are used.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::editor::locate::LinkStrategy;
use crate::editor::vcs::VcsKind;

pub const CONFIG_FILE_NAME: &str = "weditor.toml";
pub const DEFAULT_SECRET_KEY: &str = "change-me";

/// Listening address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Effective editor configuration, passed by `Arc` into every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Content root: the version-controlled working copy with generated output.
    #[serde(default = "default_doc_root")]
    pub doc_root: PathBuf,
    /// Source-tree subdirectory searched first for editable sources.
    #[serde(default = "default_doc_src")]
    pub doc_src: String,
    /// HTML regeneration command line.
    #[serde(default)]
    pub regen_script: Option<String>,
    /// Derived-format (PDF) regeneration command line.
    #[serde(default)]
    pub regen_pdf_script: Option<String>,
    #[serde(default)]
    pub allow_push: bool,
    /// Scope regeneration to the module of the referring page.
    #[serde(default)]
    pub modules: bool,
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    #[serde(default)]
    pub vcs: VcsKind,
    #[serde(default = "default_view")]
    pub default_view: String,
    /// Converter reading source markup on stdin and writing HTML to stdout.
    #[serde(default = "default_preview_command")]
    pub preview_command: String,
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    /// Suffix the site generator appends to archived sources.
    #[serde(default = "default_archive_suffix")]
    pub archive_suffix: String,
    #[serde(default)]
    pub link_strategy: LinkStrategy,
    #[serde(default)]
    pub server: ServerSection,
    /// File the settings were read from, if any.
    #[serde(skip)]
    pub settings_path: Option<PathBuf>,
}

fn default_doc_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_doc_src() -> String {
    "source".to_string()
}

fn default_secret_key() -> String {
    DEFAULT_SECRET_KEY.to_string()
}

fn default_view() -> String {
    "index.html".to_string()
}

fn default_preview_command() -> String {
    "pandoc -f rst -t html5".to_string()
}

fn default_source_extension() -> String {
    ".rst".to_string()
}

fn default_archive_suffix() -> String {
    ".txt".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            doc_root: default_doc_root(),
            doc_src: default_doc_src(),
            regen_script: None,
            regen_pdf_script: None,
            allow_push: false,
            modules: false,
            secret_key: default_secret_key(),
            vcs: VcsKind::default(),
            default_view: default_view(),
            preview_command: default_preview_command(),
            source_extension: default_source_extension(),
            archive_suffix: default_archive_suffix(),
            link_strategy: LinkStrategy::default(),
            server: ServerSection::default(),
            settings_path: None,
        }
    }
}

/// CLI-level overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub doc_root: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl EditorConfig {
    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse weditor.toml")
    }

    /// Load configuration from a TOML file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.settings_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Find the settings file to use, if any.
    pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var("SETTINGS_FILE")
            && !path.is_empty()
        {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("weditor").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Load file → environment → CLI overrides.
    pub fn load(explicit: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = match Self::discover(explicit) {
            Some(path) => Self::load_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.apply_overrides(overrides);
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(root) = std::env::var("WEDITOR_DOC_ROOT")
            && !root.is_empty()
        {
            self.doc_root = PathBuf::from(root);
        }
        if let Ok(push) = std::env::var("WEDITOR_ALLOW_PUSH") {
            self.allow_push = matches!(push.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(secret) = std::env::var("WEDITOR_SECRET_KEY")
            && !secret.is_empty()
        {
            self.secret_key = secret;
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(root) = &overrides.doc_root {
            self.doc_root = root.clone();
        }
        if let Some(host) = &overrides.host {
            self.server.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize weditor.toml")
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.doc_root.is_dir() {
            warnings.push(format!(
                "doc_root '{}' is not a directory",
                self.doc_root.display()
            ));
        } else if !self.doc_root.join(&self.doc_src).is_dir() {
            warnings.push(format!(
                "doc_src '{}' does not exist under doc_root",
                self.doc_src
            ));
        }
        if self.regen_script.as_deref().is_none_or(str::is_empty) {
            warnings.push("regen_script is not set; saves and updates will fail".to_string());
        }
        if self.regen_pdf_script.as_deref().is_none_or(str::is_empty) {
            warnings.push("regen_pdf_script is not set; PDF links will fail".to_string());
        }
        if self.secret_key == DEFAULT_SECRET_KEY {
            warnings.push("secret_key is the built-in default; set a private value".to_string());
        }
        if self.archive_suffix.is_empty() {
            warnings.push("archive_suffix is empty; source links cannot be recognised".to_string());
        }

        warnings
    }
}
