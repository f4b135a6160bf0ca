//! gir-repository — normalized GObject-introspection metadata.
//!
//! Loads `.gir` XML documents into an in-memory, read-only graph of
//! namespaces and their declarations, normalized into the model types the
//! codegen core consumes.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! let mut repo = gir_repository::Repository::new();
//! gir_repository::load_gir_file(&mut repo, Path::new("Gtk-4.0.gir")).unwrap();
//! ```

pub mod gir;
pub mod model;

pub use gir::{load_gir_file, load_gir_str};
pub use model::{
    CallbackDef, ClassDef, Direction, EnumDef, EnumMember, FunctionDef, Metadata, Namespace,
    Param, RecordDef, Repository, Transfer, TypeNode,
};
