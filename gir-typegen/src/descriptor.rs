//! FFI marshalling descriptors — the wire contract between generated code
//! and the runtime call bridge.
//!
//! [`FfiType`] is a closed tagged union: the variant tags and per-variant
//! fields rendered by the writer must match what the bridge's native call
//! primitive expects, field for field. The two sides are versioned
//! together.

/// Who releases a value after it crosses the native boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The receiving side owns the value and must free/unref it.
    Full,
    /// The value is borrowed; the receiving side must not release it.
    Borrowed,
    /// The callee does not take ownership of an input value.
    None,
}

impl Ownership {
    pub fn as_str(self) -> &'static str {
        match self {
            Ownership::Full => "full",
            Ownership::Borrowed => "borrowed",
            Ownership::None => "none",
        }
    }
}

/// Container shape of an `array` descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Doubly linked `GList`.
    GList,
    /// Singly linked `GSList`.
    GSList,
    /// `GArray` — contiguous value buffer, element size matters.
    GArray,
    /// `GPtrArray` — contiguous pointer buffer.
    PtrArray,
    /// C array with a compile-time fixed size.
    Fixed,
    /// C array whose length is read from a sibling parameter.
    Sized,
    /// Zero-terminated C array.
    ZeroTerminated,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::GList => "glist",
            ListKind::GSList => "gslist",
            ListKind::GArray => "garray",
            ListKind::PtrArray => "ptrarray",
            ListKind::Fixed => "fixed",
            ListKind::Sized => "sized",
            ListKind::ZeroTerminated => "zeroTerminated",
        }
    }
}

/// One marshalling descriptor. Each variant carries only the fields
/// meaningful to it; `ownership` is present on every variant that denotes
/// a reference-counted or copyable value.
#[derive(Debug, Clone, PartialEq)]
pub enum FfiType {
    Int {
        bits: u32,
        signed: bool,
    },
    Float {
        bits: u32,
    },
    Boolean,
    /// `void` returns.
    Undefined,
    Null,
    String {
        ownership: Ownership,
    },
    /// Reference-counted through the GObject type system; tracked by the
    /// runtime's object registry.
    GObject {
        ownership: Ownership,
    },
    /// Reference-counted through custom ref/unref symbols.
    Fundamental {
        inner_type: String,
        ref_func: String,
        unref_func: String,
        library: String,
        ownership: Ownership,
    },
    /// Value-semantics boxed type with runtime type hooks.
    Boxed {
        inner_type: String,
        /// Falls back to the writer context's current library when absent.
        library: Option<String>,
        get_type_func: Option<String>,
        copy_func: Option<String>,
        free_func: Option<String>,
        ownership: Ownership,
    },
    /// Raw memory layout, no runtime type hooks.
    Struct {
        inner_type: String,
        library: Option<String>,
    },
    /// Mutable reference cell for out/inout parameters.
    Ref {
        inner: Box<FfiType>,
    },
    Array {
        item: Box<FfiType>,
        list: ListKind,
        length_param: Option<usize>,
        fixed_size: Option<usize>,
        /// Element size in bytes, for `garray` buffers.
        elem_size: Option<usize>,
        ownership: Ownership,
    },
    HashTable {
        key: Box<FfiType>,
        value: Box<FfiType>,
        ownership: Ownership,
    },
    Callback {
        /// Trampoline identifier; absent for unsupported callback shapes.
        trampoline: Option<String>,
        /// `None` means "unknown arguments", `Some(vec![])` means "no
        /// arguments" — the distinction is kept at the descriptor level.
        args: Option<Vec<FfiType>>,
        /// `None` for void returns.
        ret: Option<Box<FfiType>>,
    },
    GVariant {
        ownership: Ownership,
    },
    GParam {
        ownership: Ownership,
    },
}

impl FfiType {
    /// The opaque pointer fallback used when a type cannot be resolved.
    pub fn pointer() -> FfiType {
        FfiType::Int {
            bits: 64,
            signed: false,
        }
    }

    /// Types the runtime wraps through the object registry after a call.
    pub fn is_wrapped(&self) -> bool {
        matches!(
            self,
            FfiType::GObject { .. }
                | FfiType::Boxed { .. }
                | FfiType::Fundamental { .. }
                | FfiType::GVariant { .. }
        )
    }

    /// Force the ownership flag on an already-built descriptor. No-op for
    /// variants without ownership semantics.
    pub fn set_ownership(&mut self, o: Ownership) {
        match self {
            FfiType::String { ownership }
            | FfiType::GObject { ownership }
            | FfiType::Fundamental { ownership, .. }
            | FfiType::Boxed { ownership, .. }
            | FfiType::Array { ownership, .. }
            | FfiType::HashTable { ownership, .. }
            | FfiType::GVariant { ownership }
            | FfiType::GParam { ownership } => *ownership = o,
            _ => {}
        }
    }

    pub fn ownership(&self) -> Option<Ownership> {
        match self {
            FfiType::String { ownership }
            | FfiType::GObject { ownership }
            | FfiType::Fundamental { ownership, .. }
            | FfiType::Boxed { ownership, .. }
            | FfiType::Array { ownership, .. }
            | FfiType::HashTable { ownership, .. }
            | FfiType::GVariant { ownership }
            | FfiType::GParam { ownership } => Some(*ownership),
            _ => None,
        }
    }
}
