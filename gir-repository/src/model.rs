//! Normalized introspection model — the bridge between GIR XML and codegen.
//!
//! These types are XML-independent and output-independent, making both the
//! loader and the type mapper easier to test in isolation. Nodes are built
//! once per declaration by the loader and never mutated afterwards.

use std::collections::BTreeMap;
use std::collections::HashMap;

/// Ownership-transfer annotation (`transfer-ownership` in GIR).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// The receiver does not own the value.
    None,
    /// The receiver owns the container but not its elements.
    Container,
    /// The receiver owns the value.
    Full,
}

impl Transfer {
    /// Parse a GIR `transfer-ownership` attribute value. Unknown strings
    /// map to `None` (no annotation) rather than failing the load.
    pub fn parse(s: &str) -> Option<Transfer> {
        match s {
            "none" => Some(Transfer::None),
            "container" => Some(Transfer::Container),
            "full" => Some(Transfer::Full),
            _ => None,
        }
    }
}

/// Parameter direction (`direction` in GIR; absent means `in`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    In,
    Out,
    InOut,
}

/// One occurrence of a type — a `<type>` or `<array>` element plus the
/// transfer annotation of its enclosing parameter or return value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeNode {
    /// Possibly namespace-qualified name (`Gtk.Widget`, `gint`, `utf8`).
    /// `None` for arrays with no element name and for `<varargs/>`.
    pub name: Option<String>,
    /// Raw C type (`GList*`, `char**`). Used to disambiguate singly vs
    /// doubly linked list containers.
    pub c_type: Option<String>,
    pub is_array: bool,
    pub is_list: bool,
    pub is_g_array: bool,
    pub is_ptr_array: bool,
    pub is_hash_table: bool,
    pub element: Option<Box<TypeNode>>,
    pub key: Option<Box<TypeNode>>,
    pub value: Option<Box<TypeNode>>,
    pub transfer: Option<Transfer>,
    pub nullable: bool,
    /// Index of the sibling parameter holding the array length.
    pub length_param: Option<usize>,
    pub fixed_size: Option<usize>,
    pub zero_terminated: bool,
}

impl TypeNode {
    /// A plain named type occurrence.
    pub fn named(name: &str) -> TypeNode {
        TypeNode {
            name: Some(name.to_string()),
            ..TypeNode::default()
        }
    }

    pub fn with_transfer(mut self, transfer: Transfer) -> TypeNode {
        self.transfer = Some(transfer);
        self
    }

    /// A generic array (`T[]`) of `element`.
    pub fn array(element: TypeNode) -> TypeNode {
        TypeNode {
            is_array: true,
            element: Some(Box::new(element)),
            ..TypeNode::default()
        }
    }

    /// A `GList`/`GSList` container. `name` is the container name
    /// (`GLib.List` or `GLib.SList`).
    pub fn list(name: &str, element: TypeNode) -> TypeNode {
        TypeNode {
            name: Some(name.to_string()),
            is_array: true,
            is_list: true,
            element: Some(Box::new(element)),
            ..TypeNode::default()
        }
    }

    /// A `GHashTable` occurrence with known key/value types.
    pub fn hash_table(key: TypeNode, value: TypeNode) -> TypeNode {
        TypeNode {
            name: Some("GLib.HashTable".to_string()),
            is_hash_table: true,
            key: Some(Box::new(key)),
            value: Some(Box::new(value)),
            ..TypeNode::default()
        }
    }
}

/// A named type occurrence in a callable's parameter list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeNode,
    pub direction: Direction,
    /// Merged `nullable`/`allow-none` from GIR.
    pub nullable: bool,
    pub optional: bool,
    pub caller_allocates: bool,
    /// Index of the user-data parameter associated with this callback
    /// parameter, relative to the unfiltered parameter list.
    pub closure: Option<usize>,
    /// Index of the destroy-notify parameter associated with this callback
    /// parameter, relative to the unfiltered parameter list.
    pub destroy: Option<usize>,
    pub transfer: Option<Transfer>,
    pub is_varargs: bool,
}

impl Param {
    pub fn new(name: &str, ty: TypeNode) -> Param {
        Param {
            name: name.to_string(),
            ty,
            ..Param::default()
        }
    }
}

/// A free function, method, or constructor.
#[derive(Debug, Clone, Default)]
pub struct FunctionDef {
    pub name: String,
    /// Native symbol (`c:identifier`).
    pub c_identifier: String,
    pub params: Vec<Param>,
    pub return_type: TypeNode,
    pub return_nullable: bool,
    /// `throws="1"` — the native call takes a trailing `GError**`.
    pub throws: bool,
    /// True for methods (instance parameter prepended at call time).
    pub is_method: bool,
}

/// A class or interface declaration.
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    pub name: String,
    pub parent: Option<String>,
    pub glib_type_name: Option<String>,
    pub glib_get_type: Option<String>,
    /// Set for fundamental (custom-refcounted, non-GObject) types.
    pub ref_func: Option<String>,
    pub unref_func: Option<String>,
    pub methods: Vec<FunctionDef>,
    pub constructors: Vec<FunctionDef>,
}

impl ClassDef {
    /// Fundamental types carry their own ref/unref symbols instead of
    /// going through the GObject type system.
    pub fn is_fundamental(&self) -> bool {
        self.ref_func.is_some() && self.unref_func.is_some()
    }
}

/// A record: boxed type, plain C struct, or fundamental refcounted type.
#[derive(Debug, Clone, Default)]
pub struct RecordDef {
    pub name: String,
    pub glib_type_name: Option<String>,
    pub glib_get_type: Option<String>,
    pub copy_function: Option<String>,
    pub free_function: Option<String>,
    pub ref_func: Option<String>,
    pub unref_func: Option<String>,
}

impl RecordDef {
    pub fn is_fundamental(&self) -> bool {
        self.ref_func.is_some() && self.unref_func.is_some()
    }

    /// Boxed types have runtime type-system hooks; everything else that is
    /// not fundamental is a plain struct (raw memory layout).
    pub fn is_boxed(&self) -> bool {
        self.glib_type_name.is_some() && self.glib_get_type.is_some()
    }
}

/// An enumeration or bitfield member.
#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

/// An enumeration (`bitfield = false`) or flags type (`bitfield = true`).
#[derive(Debug, Clone, Default)]
pub struct EnumDef {
    pub name: String,
    pub bitfield: bool,
    pub members: Vec<EnumMember>,
}

/// A named callback type (`<callback>`).
#[derive(Debug, Clone, Default)]
pub struct CallbackDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeNode,
    pub return_nullable: bool,
}

/// One loaded namespace and all of its declarations.
///
/// Member maps are `BTreeMap` so iteration (and therefore generated
/// output) is deterministic.
#[derive(Debug, Default)]
pub struct Namespace {
    pub name: String,
    pub version: String,
    pub shared_library: Option<String>,
    pub classes: BTreeMap<String, ClassDef>,
    pub interfaces: BTreeMap<String, ClassDef>,
    pub records: BTreeMap<String, RecordDef>,
    pub enums: BTreeMap<String, EnumDef>,
    pub callbacks: BTreeMap<String, CallbackDef>,
    pub functions: Vec<FunctionDef>,
}

impl Namespace {
    pub fn new(name: &str) -> Namespace {
        Namespace {
            name: name.to_string(),
            ..Namespace::default()
        }
    }
}

/// Minimal lookup capability the type mapper is written against.
///
/// The in-memory [`Repository`] is the production adapter; tests build the
/// same model by hand. Namespace iteration order is load order — the first
/// loaded namespace wins cross-namespace name searches after the current
/// one.
pub trait Metadata {
    fn namespace(&self, name: &str) -> Option<&Namespace>;
    /// All loaded namespace names, in load order.
    fn namespace_names(&self) -> Vec<&str>;
    /// Resolve a namespace-qualified callback name (`Gtk.TickCallback`).
    fn find_callback(&self, qualified_name: &str) -> Option<&CallbackDef>;

    /// Shared library for a namespace, if known.
    fn shared_library(&self, namespace: &str) -> Option<&str> {
        self.namespace(namespace)
            .and_then(|ns| ns.shared_library.as_deref())
    }
}

/// In-memory graph of all loaded namespaces.
#[derive(Debug, Default)]
pub struct Repository {
    namespaces: Vec<Namespace>,
    index: HashMap<String, usize>,
}

impl Repository {
    pub fn new() -> Repository {
        Repository::default()
    }

    /// Add a namespace. On a name collision the earlier load wins, matching
    /// first-writer-wins resolution elsewhere in the pipeline.
    pub fn add_namespace(&mut self, ns: Namespace) {
        if self.index.contains_key(&ns.name) {
            return;
        }
        self.index.insert(ns.name.clone(), self.namespaces.len());
        self.namespaces.push(ns);
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }
}

impl Metadata for Repository {
    fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.index.get(name).map(|&i| &self.namespaces[i])
    }

    fn namespace_names(&self) -> Vec<&str> {
        self.namespaces.iter().map(|ns| ns.name.as_str()).collect()
    }

    fn find_callback(&self, qualified_name: &str) -> Option<&CallbackDef> {
        let (ns_name, local) = qualified_name.split_once('.')?;
        self.namespace(ns_name)?.callbacks.get(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_namespace_wins_on_collision() {
        let mut repo = Repository::new();
        let mut a = Namespace::new("Gtk");
        a.version = "4.0".to_string();
        repo.add_namespace(a);
        let mut b = Namespace::new("Gtk");
        b.version = "3.0".to_string();
        repo.add_namespace(b);

        assert_eq!(repo.namespaces().len(), 1);
        assert_eq!(repo.namespace("Gtk").unwrap().version, "4.0");
    }

    #[test]
    fn callback_lookup_requires_qualified_name() {
        let mut repo = Repository::new();
        let mut ns = Namespace::new("Gtk");
        ns.callbacks.insert(
            "TickCallback".to_string(),
            CallbackDef {
                name: "TickCallback".to_string(),
                ..CallbackDef::default()
            },
        );
        repo.add_namespace(ns);

        assert!(repo.find_callback("Gtk.TickCallback").is_some());
        assert!(repo.find_callback("TickCallback").is_none());
        assert!(repo.find_callback("Gdk.TickCallback").is_none());
    }
}
