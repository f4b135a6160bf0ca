//! Type mapper — normalized type occurrences → TypeScript types plus
//! marshalling descriptors.
//!
//! One mapper instance is built per generation pass (one namespace); its
//! namespace and skip/trampoline configuration are immutable constructor
//! inputs. Mapping never fails — names that cannot be resolved degrade to
//! an opaque pointer mapping and are recorded as diagnostics.

use std::collections::BTreeMap;
use std::collections::HashSet;

use gir_repository::model::{Metadata, Transfer, TypeNode};

use crate::descriptor::{FfiType, ListKind, Ownership};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::primitives;

/// What a name resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Record,
    Enum,
    Flags,
    Callback,
}

/// An import the consuming generator must emit for a resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeImport {
    pub kind: TypeKind,
    pub name: String,
    pub namespace: String,
    pub transformed_name: String,
    pub is_external: bool,
}

/// Result of namespace resolution for one named type.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub kind: TypeKind,
    pub name: String,
    pub namespace: String,
    pub transformed_name: String,
    pub is_external: bool,
    pub glib_type_name: Option<String>,
    pub glib_get_type: Option<String>,
    pub ref_func: Option<String>,
    pub unref_func: Option<String>,
    pub copy_function: Option<String>,
    pub free_function: Option<String>,
    pub shared_library: Option<String>,
}

impl ResolvedType {
    fn is_fundamental(&self) -> bool {
        self.ref_func.is_some() && self.unref_func.is_some() && self.shared_library.is_some()
    }

    fn import(&self) -> TypeImport {
        TypeImport {
            kind: self.kind,
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            transformed_name: self.transformed_name.clone(),
            is_external: self.is_external,
        }
    }
}

/// A mapped type: TypeScript surface, marshalling descriptor, and the
/// imports reached while building them.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedType {
    pub ts: String,
    pub ffi: FfiType,
    pub imports: Vec<TypeImport>,
    pub kind: Option<TypeKind>,
    /// Element type of a container mapping (`string` for `string[]`).
    pub inner_ts: Option<String>,
}

impl MappedType {
    fn new(ts: &str, ffi: FfiType) -> MappedType {
        MappedType {
            ts: ts.to_string(),
            ffi,
            imports: Vec::new(),
            kind: None,
            inner_ts: None,
        }
    }
}

/// Per-pass mapper configuration.
#[derive(Debug, Default)]
pub struct MapperOptions {
    /// Qualified names (`Gtk.Widget`) excluded from generation. References
    /// to them degrade to an opaque object mapping.
    pub skipped_types: HashSet<String>,
    /// Qualified callback name → trampoline identifier. Finite, built once
    /// from config; a callback type absent from this map is unsupported.
    pub trampolines: BTreeMap<String, String>,
}

impl MapperOptions {
    /// Options pre-seeded with the trampolines the runtime ships.
    pub fn with_default_trampolines() -> MapperOptions {
        let mut options = MapperOptions::default();
        for (name, trampoline) in [
            ("GLib.SourceFunc", "sourceFuncTrampoline"),
            ("Gio.AsyncReadyCallback", "asyncReadyTrampoline"),
            ("Gtk.Callback", "widgetCallbackTrampoline"),
            ("Gtk.TickCallback", "tickCallbackTrampoline"),
        ] {
            options
                .trampolines
                .insert(name.to_string(), trampoline.to_string());
        }
        options
    }
}

/// Resolve an ownership annotation into the flag the bridge acts on.
///
/// This is the single shared full-vs-borrowed decision: explicit `full` or
/// `container` means the receiver owns the value, explicit `none` means it
/// is borrowed, and an absent annotation is decided by direction — a
/// produced return value is borrowed unless stated, a consumed input is
/// owned by the callee unless stated. Getting this backwards is a
/// use-after-free or a leak at the bridge, so every call site goes through
/// here.
pub fn resolve_transfer(transfer: Option<Transfer>, is_return: bool) -> Ownership {
    match transfer {
        Some(Transfer::Full) | Some(Transfer::Container) => Ownership::Full,
        Some(Transfer::None) => Ownership::Borrowed,
        None => {
            if is_return {
                Ownership::Borrowed
            } else {
                Ownership::Full
            }
        }
    }
}

/// Type mapper for one generation pass.
pub struct Mapper<'a, M: Metadata> {
    pub(crate) meta: &'a M,
    pub(crate) namespace: String,
    pub(crate) options: &'a MapperOptions,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, M: Metadata> Mapper<'a, M> {
    pub fn new(meta: &'a M, namespace: &str, options: &'a MapperOptions) -> Mapper<'a, M> {
        Mapper {
            meta,
            namespace: namespace.to_string(),
            options,
            diagnostics: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn push_diagnostic(&mut self, kind: DiagnosticKind, name: &str) {
        self.diagnostics.push(Diagnostic::new(kind, name));
    }

    /// Qualify an unqualified name into the current namespace.
    pub(crate) fn qualify(&self, name: &str) -> String {
        if name.contains('.') {
            name.to_string()
        } else {
            format!("{}.{}", self.namespace, name)
        }
    }

    /// Map one type occurrence.
    ///
    /// `is_return` selects the direction used by ownership defaults.
    /// `parent_transfer` is the enclosing annotation a container threads
    /// down to its elements. `length_offset` shifts `length_param` indices
    /// in emitted array descriptors (1 for methods, where the receiver is
    /// prepended to the native argument list).
    pub fn map_type(
        &mut self,
        ty: &TypeNode,
        is_return: bool,
        parent_transfer: Option<Transfer>,
        length_offset: usize,
    ) -> MappedType {
        let transfer = ty.transfer.or(parent_transfer);

        // Containers first: hash tables, GLib array types, generic arrays.
        if ty.is_hash_table || (ty.key.is_some() && ty.value.is_some()) {
            return self.map_hash_table(ty, is_return, transfer, length_offset);
        }
        if ty.is_g_array || ty.is_ptr_array {
            return self.map_glib_array(ty, is_return, transfer, length_offset);
        }
        if ty.is_array || ty.is_list {
            return self.map_array(ty, is_return, transfer, length_offset);
        }

        let Some(name) = ty.name.as_deref() else {
            return self.opaque("<unnamed>");
        };

        if primitives::is_string(name) {
            // Strings are copied out by the bridge unless explicitly
            // borrowed; the directional default does not apply.
            let ownership = match transfer {
                Some(Transfer::None) => Ownership::Borrowed,
                _ => Ownership::Full,
            };
            return MappedType::new("string", FfiType::String { ownership });
        }

        if let Some(p) = primitives::lookup(name) {
            return MappedType::new(p.ts, p.descriptor());
        }

        // Two GLib types have dedicated bridge representations.
        let qualified = self.qualify(name);
        if qualified == "GLib.Variant" {
            let mut mapped = MappedType::new(
                "Variant",
                FfiType::GVariant {
                    ownership: resolve_transfer(transfer, is_return),
                },
            );
            mapped.imports.push(TypeImport {
                kind: TypeKind::Record,
                name: "Variant".to_string(),
                namespace: "GLib".to_string(),
                transformed_name: "Variant".to_string(),
                is_external: self.namespace != "GLib",
            });
            return mapped;
        }
        if qualified == "GObject.ParamSpec" {
            let mut mapped = MappedType::new(
                "ParamSpec",
                FfiType::GParam {
                    ownership: resolve_transfer(transfer, is_return),
                },
            );
            mapped.imports.push(TypeImport {
                kind: TypeKind::Class,
                name: "ParamSpec".to_string(),
                namespace: "GObject".to_string(),
                transformed_name: "ParamSpec".to_string(),
                is_external: self.namespace != "GObject",
            });
            return mapped;
        }

        match self.resolve(name) {
            Some(resolved) => self.map_resolved(&resolved, transfer, is_return),
            None => self.opaque(name),
        }
    }

    // -----------------------------------------------------------------------
    // Containers
    // -----------------------------------------------------------------------

    fn map_hash_table(
        &mut self,
        ty: &TypeNode,
        is_return: bool,
        transfer: Option<Transfer>,
        length_offset: usize,
    ) -> MappedType {
        // Ownership is computed once for the whole container. Key/value
        // recursion re-derives its own from its own annotations (or
        // inherits this one as the parent).
        let ownership = resolve_transfer(transfer, is_return);

        let (Some(key), Some(value)) = (&ty.key, &ty.value) else {
            // Unknown key/value types: opaque pointer pair.
            return MappedType::new(
                "Map<number, number>",
                FfiType::HashTable {
                    key: Box::new(FfiType::pointer()),
                    value: Box::new(FfiType::pointer()),
                    ownership,
                },
            );
        };

        let key = self.map_type(key, is_return, transfer, length_offset);
        let value = self.map_type(value, is_return, transfer, length_offset);

        let mut mapped = MappedType::new(
            &format!("Map<{}, {}>", key.ts, value.ts),
            FfiType::HashTable {
                key: Box::new(key.ffi),
                value: Box::new(value.ffi),
                ownership,
            },
        );
        mapped.imports.extend(key.imports);
        mapped.imports.extend(value.imports);
        mapped
    }

    /// `GArray`/`GByteArray`/`GPtrArray` containers. `GArray` holds values
    /// inline, so its descriptor carries the element byte size; `GPtrArray`
    /// elements are pointer-sized.
    fn map_glib_array(
        &mut self,
        ty: &TypeNode,
        is_return: bool,
        transfer: Option<Transfer>,
        length_offset: usize,
    ) -> MappedType {
        let ownership = resolve_transfer(transfer, is_return);

        let Some(element) = ty.element.as_deref() else {
            return MappedType::new(
                "number[]",
                FfiType::Array {
                    item: Box::new(FfiType::pointer()),
                    list: ListKind::PtrArray,
                    length_param: None,
                    fixed_size: None,
                    elem_size: None,
                    ownership,
                },
            );
        };

        let (list, elem_size) = if ty.is_g_array {
            let size = element
                .name
                .as_deref()
                .map(primitives::element_size)
                .unwrap_or(8);
            (ListKind::GArray, Some(size))
        } else {
            (ListKind::PtrArray, None)
        };

        let item = self.map_type(element, is_return, transfer, length_offset);
        let mut mapped = MappedType::new(
            &array_ts(&item.ts),
            FfiType::Array {
                item: Box::new(item.ffi),
                list,
                length_param: None,
                fixed_size: None,
                elem_size,
                ownership,
            },
        );
        mapped.inner_ts = Some(item.ts);
        mapped.imports.extend(item.imports);
        mapped
    }

    /// Generic arrays: linked lists, fixed-size buffers, explicitly sized
    /// buffers, and zero-terminated C arrays.
    fn map_array(
        &mut self,
        ty: &TypeNode,
        is_return: bool,
        transfer: Option<Transfer>,
        length_offset: usize,
    ) -> MappedType {
        let list = classify_array(ty);
        let ownership = resolve_transfer(transfer, is_return);

        let Some(element) = ty.element.as_deref() else {
            return MappedType::new(
                "number[]",
                FfiType::Array {
                    item: Box::new(FfiType::pointer()),
                    list,
                    length_param: ty.length_param.map(|i| i + length_offset),
                    fixed_size: ty.fixed_size,
                    elem_size: None,
                    ownership,
                },
            );
        };

        // The element inherits the container's annotation when it has none
        // of its own, and the same length offset.
        let item = self.map_type(element, is_return, transfer, length_offset);

        let mut mapped = MappedType::new(
            &array_ts(&item.ts),
            FfiType::Array {
                item: Box::new(item.ffi),
                list,
                length_param: ty.length_param.map(|i| i + length_offset),
                fixed_size: ty.fixed_size,
                elem_size: None,
                ownership,
            },
        );
        mapped.inner_ts = Some(item.ts);
        mapped.imports.extend(item.imports);
        mapped
    }

    // -----------------------------------------------------------------------
    // Named-type resolution
    // -----------------------------------------------------------------------

    /// Resolve a possibly-qualified name. Unqualified names search the
    /// current namespace first, then every other loaded namespace in load
    /// order, so the current namespace wins collisions.
    pub fn resolve(&self, name: &str) -> Option<ResolvedType> {
        if let Some((ns, local)) = name.split_once('.') {
            return self.resolve_in(ns, local);
        }
        if let Some(resolved) = self.resolve_in(&self.namespace, name) {
            return Some(resolved);
        }
        for ns in self.meta.namespace_names() {
            if ns == self.namespace {
                continue;
            }
            if let Some(resolved) = self.resolve_in(ns, name) {
                return Some(resolved);
            }
        }
        None
    }

    fn resolve_in(&self, ns_name: &str, local: &str) -> Option<ResolvedType> {
        let ns = self.meta.namespace(ns_name)?;
        let is_external = ns_name != self.namespace;
        let base = ResolvedType {
            kind: TypeKind::Class,
            name: local.to_string(),
            namespace: ns_name.to_string(),
            transformed_name: local.to_string(),
            is_external,
            glib_type_name: None,
            glib_get_type: None,
            ref_func: None,
            unref_func: None,
            copy_function: None,
            free_function: None,
            shared_library: ns.shared_library.clone(),
        };

        if let Some(class) = ns.classes.get(local) {
            return Some(ResolvedType {
                kind: TypeKind::Class,
                glib_type_name: class.glib_type_name.clone(),
                glib_get_type: class.glib_get_type.clone(),
                ref_func: class.ref_func.clone(),
                unref_func: class.unref_func.clone(),
                ..base
            });
        }
        if let Some(iface) = ns.interfaces.get(local) {
            return Some(ResolvedType {
                kind: TypeKind::Interface,
                glib_type_name: iface.glib_type_name.clone(),
                glib_get_type: iface.glib_get_type.clone(),
                ref_func: iface.ref_func.clone(),
                unref_func: iface.unref_func.clone(),
                ..base
            });
        }
        if let Some(record) = ns.records.get(local) {
            return Some(ResolvedType {
                kind: TypeKind::Record,
                glib_type_name: record.glib_type_name.clone(),
                glib_get_type: record.glib_get_type.clone(),
                ref_func: record.ref_func.clone(),
                unref_func: record.unref_func.clone(),
                copy_function: record.copy_function.clone(),
                free_function: record.free_function.clone(),
                ..base
            });
        }
        if let Some(en) = ns.enums.get(local) {
            return Some(ResolvedType {
                kind: if en.bitfield {
                    TypeKind::Flags
                } else {
                    TypeKind::Enum
                },
                ..base
            });
        }
        if ns.callbacks.contains_key(local) {
            return Some(ResolvedType {
                kind: TypeKind::Callback,
                ..base
            });
        }
        None
    }

    fn map_resolved(
        &mut self,
        resolved: &ResolvedType,
        transfer: Option<Transfer>,
        is_return: bool,
    ) -> MappedType {
        let qualified = format!("{}.{}", resolved.namespace, resolved.name);
        let ownership = resolve_transfer(transfer, is_return);

        if self.options.skipped_types.contains(&qualified) {
            // Still ownership-tagged so call sites marshal correctly, but
            // typed opaquely — the wrapper class does not exist.
            self.push_diagnostic(DiagnosticKind::SkippedType, &qualified);
            return MappedType::new("any", FfiType::GObject { ownership });
        }

        let mut mapped = match resolved.kind {
            TypeKind::Enum => MappedType::new(
                &resolved.transformed_name,
                FfiType::Int {
                    bits: 32,
                    signed: true,
                },
            ),
            TypeKind::Flags => MappedType::new(
                &resolved.transformed_name,
                FfiType::Int {
                    bits: 32,
                    signed: false,
                },
            ),
            TypeKind::Record => self.map_record(resolved, ownership),
            // A bare callback type reference (not a parameter) is an
            // opaque pointer; real callback parameters get their signature
            // synthesized separately.
            TypeKind::Callback => {
                let mut mapped = MappedType::new("number", FfiType::pointer());
                mapped.kind = Some(TypeKind::Callback);
                return mapped;
            }
            TypeKind::Class | TypeKind::Interface => {
                if resolved.is_fundamental() {
                    self.fundamental(resolved, ownership)
                } else {
                    MappedType::new(&resolved.transformed_name, FfiType::GObject { ownership })
                }
            }
        };

        mapped.kind = Some(resolved.kind);
        mapped.imports.push(resolved.import());
        mapped
    }

    fn map_record(&self, resolved: &ResolvedType, ownership: Ownership) -> MappedType {
        if resolved.is_fundamental() {
            return self.fundamental(resolved, ownership);
        }
        if resolved.glib_type_name.is_some() && resolved.glib_get_type.is_some() {
            return MappedType::new(
                &resolved.transformed_name,
                FfiType::Boxed {
                    inner_type: resolved.glib_type_name.clone().unwrap(),
                    library: resolved.shared_library.clone(),
                    get_type_func: resolved.glib_get_type.clone(),
                    copy_func: resolved.copy_function.clone(),
                    free_func: resolved.free_function.clone(),
                    ownership,
                },
            );
        }
        // No runtime type hooks: plain struct, raw memory layout.
        MappedType::new(
            &resolved.transformed_name,
            FfiType::Struct {
                inner_type: resolved.name.clone(),
                library: resolved.shared_library.clone(),
            },
        )
    }

    fn fundamental(&self, resolved: &ResolvedType, ownership: Ownership) -> MappedType {
        MappedType::new(
            &resolved.transformed_name,
            FfiType::Fundamental {
                inner_type: resolved
                    .glib_type_name
                    .clone()
                    .unwrap_or_else(|| resolved.name.clone()),
                ref_func: resolved.ref_func.clone().unwrap(),
                unref_func: resolved.unref_func.clone().unwrap(),
                library: resolved.shared_library.clone().unwrap(),
                ownership,
            },
        )
    }

    fn opaque(&mut self, name: &str) -> MappedType {
        self.push_diagnostic(DiagnosticKind::UnresolvedType, name);
        MappedType::new("number", FfiType::pointer())
    }
}

/// Container shape for a generic array, in resolution-priority order:
/// explicit list flag (container name, then C-type hint), C-type hints for
/// bare names, fixed size, sibling length parameter, zero-terminated.
fn classify_array(ty: &TypeNode) -> ListKind {
    let c_type = ty.c_type.as_deref().unwrap_or("");
    if ty.is_list {
        let name = ty.name.as_deref().unwrap_or("");
        if name.contains("SList") || c_type.contains("GSList") {
            return ListKind::GSList;
        }
        return ListKind::GList;
    }
    if c_type.contains("GSList") {
        return ListKind::GSList;
    }
    if c_type.contains("GList") {
        return ListKind::GList;
    }
    if ty.fixed_size.is_some() {
        return ListKind::Fixed;
    }
    if ty.length_param.is_some() && !ty.zero_terminated {
        return ListKind::Sized;
    }
    ListKind::ZeroTerminated
}

/// `T[]`, parenthesized when the element type is itself compound.
fn array_ts(elem: &str) -> String {
    if elem.contains('|') || elem.contains("=>") {
        format!("({elem})[]")
    } else {
        format!("{elem}[]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_defaults_are_directional() {
        // Unspecified: returns are borrowed, inputs are owned.
        assert_eq!(resolve_transfer(None, true), Ownership::Borrowed);
        assert_eq!(resolve_transfer(None, false), Ownership::Full);
        // Explicit annotations win in both directions.
        assert_eq!(
            resolve_transfer(Some(Transfer::Full), true),
            Ownership::Full
        );
        assert_eq!(
            resolve_transfer(Some(Transfer::Container), true),
            Ownership::Full
        );
        assert_eq!(
            resolve_transfer(Some(Transfer::None), false),
            Ownership::Borrowed
        );
    }

    #[test]
    fn classify_list_by_container_name() {
        let glist = TypeNode::list("GLib.List", TypeNode::named("utf8"));
        assert_eq!(classify_array(&glist), ListKind::GList);
        let gslist = TypeNode::list("GLib.SList", TypeNode::named("utf8"));
        assert_eq!(classify_array(&gslist), ListKind::GSList);
    }

    #[test]
    fn classify_list_by_c_type_hint() {
        let mut ty = TypeNode::array(TypeNode::named("utf8"));
        ty.c_type = Some("GSList*".to_string());
        assert_eq!(classify_array(&ty), ListKind::GSList);
        ty.c_type = Some("GList*".to_string());
        assert_eq!(classify_array(&ty), ListKind::GList);
    }

    #[test]
    fn classify_buffer_shapes() {
        let mut fixed = TypeNode::array(TypeNode::named("gint"));
        fixed.fixed_size = Some(4);
        assert_eq!(classify_array(&fixed), ListKind::Fixed);

        let mut sized = TypeNode::array(TypeNode::named("gint"));
        sized.length_param = Some(1);
        assert_eq!(classify_array(&sized), ListKind::Sized);

        // A length param on a zero-terminated array does not make it sized.
        sized.zero_terminated = true;
        assert_eq!(classify_array(&sized), ListKind::ZeroTerminated);

        let plain = TypeNode::array(TypeNode::named("utf8"));
        assert_eq!(classify_array(&plain), ListKind::ZeroTerminated);
    }

    #[test]
    fn compound_element_types_are_parenthesized() {
        assert_eq!(array_ts("string"), "string[]");
        assert_eq!(array_ts("string | null"), "(string | null)[]");
    }
}
