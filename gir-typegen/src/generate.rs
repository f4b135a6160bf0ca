//! Per-namespace generation — drives the mapper, body builder, and writer
//! to produce one TypeScript module per namespace.
//!
//! Deliberately slim: the type-mapping core does the real work, this pass
//! only arranges declarations and import headers around it.

use std::collections::BTreeMap;

use gir_repository::model::{Namespace, Repository};
use tracing::{debug, info, warn};

use crate::body::{self, CallableSpec};
use crate::config::Config;
use crate::diagnostics::Diagnostic;
use crate::mapper::{Mapper, MapperOptions, TypeImport};
use crate::writer::WriterContext;

/// One generated TypeScript module.
#[derive(Debug)]
pub struct GeneratedModule {
    pub namespace: String,
    pub file_name: String,
    pub source: String,
    /// Degraded mappings recorded while generating this module.
    pub diagnostics: Vec<Diagnostic>,
    /// Callables skipped because of unsupported callback parameters.
    pub skipped_callables: usize,
}

/// Build the per-pass mapper options from config: built-in trampolines,
/// extended by config entries, plus the skip list.
pub fn mapper_options(cfg: &Config) -> MapperOptions {
    let mut options = MapperOptions::with_default_trampolines();
    for (name, trampoline) in &cfg.trampolines {
        options
            .trampolines
            .insert(name.clone(), trampoline.clone());
    }
    options.skipped_types = cfg.skip.iter().cloned().collect();
    options
}

/// Generate the module for one namespace.
pub fn generate_namespace(repo: &Repository, ns: &Namespace, cfg: &Config) -> GeneratedModule {
    let options = mapper_options(cfg);
    let mut mapper = Mapper::new(repo, &ns.name, &options);

    let shared_library = cfg
        .shared_library_overrides
        .get(&ns.name)
        .cloned()
        .or_else(|| ns.shared_library.clone())
        .unwrap_or_else(|| {
            warn!(namespace = %ns.name, "no shared library known; descriptors will be incomplete");
            "unknown".to_string()
        });
    let ctx = WriterContext::new(&shared_library, &cfg.error_library);

    let mut imports: Vec<TypeImport> = Vec::new();
    let mut skipped_callables = 0usize;

    let mut enums_src = String::new();
    for en in ns.enums.values() {
        enums_src.push_str(&format!("export enum {} {{\n", en.name));
        for member in &en.members {
            enums_src.push_str(&format!(
                "    {} = {},\n",
                member_name(&member.name),
                member.value
            ));
        }
        enums_src.push_str("}\n\n");
    }

    let mut classes_src = String::new();
    for class in ns.classes.values() {
        let qualified = format!("{}.{}", ns.name, class.name);
        if options.skipped_types.contains(&qualified) {
            debug!(class = %qualified, "skipping class");
            continue;
        }
        classes_src.push_str(&format!("export class {} {{\n", class.name));
        for ctor in &class.constructors {
            match body::build_callable(&mut mapper, &ctx, &CallableSpec::from_function(ctor)) {
                Some(generated) => {
                    imports.extend(generated.imports.iter().cloned());
                    classes_src.push_str(&generated.render_static_method());
                }
                None => {
                    skipped_callables += 1;
                    debug!(callable = %ctor.name, class = %class.name, "skipping constructor with unsupported callback");
                }
            }
        }
        for method in &class.methods {
            match body::build_callable(&mut mapper, &ctx, &CallableSpec::from_function(method)) {
                Some(generated) => {
                    imports.extend(generated.imports.iter().cloned());
                    // Class-level functions have no receiver to marshal;
                    // they surface as statics like constructors do.
                    if method.is_method {
                        classes_src.push_str(&generated.render_method());
                    } else {
                        classes_src.push_str(&generated.render_static_method());
                    }
                }
                None => {
                    skipped_callables += 1;
                    debug!(callable = %method.name, class = %class.name, "skipping method with unsupported callback");
                }
            }
        }
        classes_src.push_str("}\n\n");
    }

    let mut functions_src = String::new();
    for f in &ns.functions {
        match body::build_callable(&mut mapper, &ctx, &CallableSpec::from_function(f)) {
            Some(generated) => {
                imports.extend(generated.imports.iter().cloned());
                functions_src.push_str(&generated.render_function());
                functions_src.push('\n');
            }
            None => {
                skipped_callables += 1;
                debug!(callable = %f.name, "skipping function with unsupported callback");
            }
        }
    }

    let mut source = String::new();
    source.push_str(&format!(
        "// Generated from {}-{}.gir — do not edit.\n",
        ns.name, ns.version
    ));
    source.push_str("import { call, createRef, registry, wrapError, Ref } from \"../runtime\";\n");
    source.push_str(&import_header(&imports, &ns.name));
    source.push('\n');
    source.push_str(&enums_src);
    source.push_str(&classes_src);
    source.push_str(&functions_src);

    let diagnostics = mapper.take_diagnostics();
    info!(
        namespace = %ns.name,
        enums = ns.enums.len(),
        classes = ns.classes.len(),
        functions = ns.functions.len(),
        skipped_callables,
        degraded = diagnostics.len(),
        "generated module"
    );

    GeneratedModule {
        namespace: ns.name.clone(),
        file_name: format!("{}.ts", ns.name),
        source,
        diagnostics,
        skipped_callables,
    }
}

/// Deduplicated import statements for every external type the module
/// references, grouped by source namespace.
fn import_header(imports: &[TypeImport], current_namespace: &str) -> String {
    let mut by_namespace: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for import in imports {
        if !import.is_external || import.namespace == current_namespace {
            continue;
        }
        let names = by_namespace.entry(&import.namespace).or_default();
        if !names.contains(&import.transformed_name.as_str()) {
            names.push(&import.transformed_name);
        }
    }

    let mut out = String::new();
    for (namespace, mut names) in by_namespace {
        names.sort_unstable();
        out.push_str(&format!(
            "import {{ {} }} from \"./{}\";\n",
            names.join(", "),
            namespace
        ));
    }
    out
}

/// Enum member names: GIR uses lower-dash-case; the emitted members are
/// SCREAMING_SNAKE_CASE with a guard for leading digits (`2big` in
/// GLib.ConvertError).
fn member_name(name: &str) -> String {
    let upper = name.replace('-', "_").to_uppercase();
    if upper.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{upper}")
    } else {
        upper
    }
}
