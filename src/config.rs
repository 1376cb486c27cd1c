use std::fs;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

/// File looked up in the workspace root when `--file` is not given.
pub const SETTINGS_FILENAME: &str = "tspatch.toml";

/// Where the upstream lives and where its files land after cloning.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub repository: String,
    pub releases_api: String,
    pub clone_dir: String,
    pub checker_file: String,
    pub descriptor_file: String,
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repository: "https://github.com/microsoft/TypeScript.git".to_string(),
            releases_api: "https://api.github.com/repos/microsoft/TypeScript/releases".to_string(),
            clone_dir: "TypeScript".to_string(),
            checker_file: "src/compiler/checker.ts".to_string(),
            descriptor_file: "package.json".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Load settings from disk.
pub fn load_from_path(path: &Utf8Path) -> Result<Settings> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path))
}

/// The directory all operations are anchored to, plus the settings that locate the clone.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: Utf8PathBuf,
    settings: Settings,
}

impl Workspace {
    pub fn new(root: Utf8PathBuf, settings: Settings) -> Self {
        Self { root, settings }
    }

    /// Resolve the root (explicit or current directory) and the settings file
    /// (explicit, discovered in the root, or built-in defaults).
    pub fn discover(
        chdir: Option<&std::path::Path>,
        file: Option<&std::path::Path>,
    ) -> Result<Self> {
        let root = match chdir {
            Some(path) => utf8(path.to_path_buf())?,
            None => utf8(std::env::current_dir().context("reading current directory")?)?,
        };
        if !root.is_dir() {
            bail!("workspace root {} is not a directory", root);
        }

        let settings = match file {
            Some(path) => {
                let path = utf8(path.to_path_buf())?;
                debug!("loading settings from {} (explicit)", path);
                load_from_path(&path)?
            }
            None => {
                let discovered = root.join(SETTINGS_FILENAME);
                if discovered.is_file() {
                    debug!("loading settings from {} (discovered)", discovered);
                    load_from_path(&discovered)?
                } else {
                    debug!("no {} in {}; using defaults", SETTINGS_FILENAME, root);
                    Settings::default()
                }
            }
        };

        Ok(Self::new(root, settings))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The Cloned Tree.
    pub fn clone_dir(&self) -> Utf8PathBuf {
        self.root.join(&self.settings.clone_dir)
    }

    pub fn checker_path(&self) -> Utf8PathBuf {
        self.clone_dir().join(&self.settings.checker_file)
    }

    pub fn descriptor_path(&self) -> Utf8PathBuf {
        self.clone_dir().join(&self.settings.descriptor_file)
    }
}

fn utf8(path: std::path::PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|_| anyhow!("path must be valid UTF-8"))
}
