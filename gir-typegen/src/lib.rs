//! gir-typegen — GObject-introspection metadata → TypeScript FFI bindings.
//!
//! Loads `.gir` files through `gir-repository`, maps every type occurrence
//! to a TypeScript type plus a marshalling descriptor for the runtime call
//! bridge, and writes one `.ts` module per namespace.
//!
//! # Quick start
//!
//! Generate modules from a config (suitable for a build script):
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads config TOML, loads the GIR files, writes the .ts modules.
//! gir_typegen::run(Path::new("gir-typegen.toml"), None).unwrap();
//! ```
//!
//! Or generate in memory without writing to disk:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let modules = gir_typegen::generate(Path::new("gir-typegen.toml")).unwrap();
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gir_repository::{Metadata, Repository};
use tracing::{info, warn};

pub mod body;
pub mod config;
pub mod descriptor;
pub mod diagnostics;
pub mod generate;
pub mod mapper;
pub mod params;
pub mod primitives;
pub mod writer;

pub use generate::GeneratedModule;

/// Run the full pipeline: load config, load GIR files, generate modules,
/// and write them to the output directory.
///
/// `config_path` is the path to a `gir-typegen.toml` configuration file.
/// `output` optionally overrides the output directory from the config.
///
/// Returns the paths of the written modules.
pub fn run(config_path: &Path, output: Option<&Path>) -> Result<Vec<PathBuf>> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let modules = generate_from_config(&cfg, base_dir)?;

    let out_dir = match output {
        Some(p) => p.to_path_buf(),
        None => base_dir.join(&cfg.output.dir),
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut paths = Vec::new();
    for module in &modules {
        let path = out_dir.join(&module.file_name);
        std::fs::write(&path, &module.source)
            .with_context(|| format!("writing module to {}", path.display()))?;
        info!(
            path = %path.display(),
            size = module.source.len(),
            "wrote module"
        );
        paths.push(path);
    }

    Ok(paths)
}

/// Parse a config file, load the referenced GIR files, and return the
/// generated modules without writing to disk.
pub fn generate(config_path: &Path) -> Result<Vec<GeneratedModule>> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    generate_from_config(&cfg, base_dir)
}

/// Generate modules from an already-loaded [`config::Config`].
///
/// `base_dir` is the directory relative to which GIR paths in the config
/// are resolved (typically the parent directory of the TOML file).
pub fn generate_from_config(cfg: &config::Config, base_dir: &Path) -> Result<Vec<GeneratedModule>> {
    info!(
        girs = cfg.gir.len(),
        skip = cfg.skip.len(),
        "loaded configuration"
    );

    // Load every GIR file — including generate = false dependencies, which
    // only feed cross-namespace resolution — and record which namespaces
    // each one contributed.
    let mut repo = Repository::new();
    let mut to_generate: Vec<String> = Vec::new();
    for gir in &cfg.gir {
        let path = config::resolve_gir(&gir.file, base_dir, &cfg.gir_paths);
        let before: Vec<String> = namespace_names(&repo);
        gir_repository::load_gir_file(&mut repo, &path)?;
        if gir.generate {
            for name in namespace_names(&repo) {
                if !before.contains(&name) {
                    to_generate.push(name);
                }
            }
        }
    }

    let mut modules = Vec::new();
    for ns_name in &to_generate {
        let ns = repo
            .namespace(ns_name)
            .with_context(|| format!("namespace {ns_name} disappeared after load"))?;
        let module = generate::generate_namespace(&repo, ns, cfg);

        // Degradations are not errors (codegen proceeds on weaker types),
        // but they must be visible.
        if !module.diagnostics.is_empty() {
            warn!(
                namespace = %ns_name,
                degraded = module.diagnostics.len(),
                "some types degraded to opaque mappings"
            );
            for d in &module.diagnostics {
                tracing::debug!(namespace = %ns_name, "{d}");
            }
        }
        modules.push(module);
    }

    Ok(modules)
}

fn namespace_names(repo: &Repository) -> Vec<String> {
    repo.namespace_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}
