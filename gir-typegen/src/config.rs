//! Configuration types for `gir-typegen.toml`.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Root configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub output: OutputConfig,
    /// Additional directories to search when resolving GIR file paths.
    /// Each entry is tried in order after `base_dir` (the TOML file's
    /// parent directory).
    #[serde(default)]
    pub gir_paths: Vec<PathBuf>,
    #[serde(default)]
    pub gir: Vec<GirConfig>,
    /// Qualified type names (`Gtk.PrintContext`) excluded from generation.
    /// References to them degrade to an opaque object mapping.
    #[serde(default)]
    pub skip: Vec<String>,
    /// Qualified callback name → trampoline identifier. Extends (and can
    /// override) the built-in trampoline table.
    #[serde(default)]
    pub trampolines: BTreeMap<String, String>,
    /// Per-namespace shared-library overrides, for GIR files whose
    /// `shared-library` attribute is missing or wrong.
    #[serde(default)]
    pub shared_library_overrides: HashMap<String, String>,
    /// Library holding the `GError` boxed type used by throwing callables.
    #[serde(default = "default_error_library")]
    pub error_library: String,
}

fn default_error_library() -> String {
    "libglib-2.0.so.0".to_string()
}

/// Output settings.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Directory the generated `.ts` modules are written to.
    pub dir: PathBuf,
}

/// One GIR input file.
#[derive(Debug, Deserialize)]
pub struct GirConfig {
    /// Path to the `.gir` file, resolved against `base_dir` and `gir_paths`.
    pub file: PathBuf,
    /// Whether to emit a module for this namespace. Dependencies that are
    /// only loaded for cross-namespace resolution set this to false.
    #[serde(default = "default_true")]
    pub generate: bool,
}

fn default_true() -> bool {
    true
}

/// Resolve a GIR path by searching `base_dir` first, then each `gir_paths`
/// entry. Absolute paths are returned as-is. If the file is not found
/// anywhere, falls back to `base_dir.join(path)` so the caller gets a
/// meaningful error from the loader.
pub fn resolve_gir(path: &Path, base_dir: &Path, gir_paths: &[PathBuf]) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let candidate = base_dir.join(path);
    if candidate.exists() {
        return candidate;
    }
    for dir in gir_paths {
        let candidate = dir.join(path);
        if candidate.exists() {
            return candidate;
        }
    }
    base_dir.join(path)
}

/// Load and parse a `gir-typegen.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))?;
    Ok(config)
}
