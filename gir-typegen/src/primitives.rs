//! Intrinsic type table — fixed mapping from GIR primitive names to
//! TypeScript types and marshalling descriptors.
//!
//! This is the one canonical primitive map; every consumer (mapper, array
//! element sizing) goes through it.

use crate::descriptor::FfiType;

/// A primitive table entry.
#[derive(Debug, Clone, Copy)]
pub struct Primitive {
    pub ts: &'static str,
    /// Storage width in bits, where meaningful (integers and floats).
    pub bits: Option<u32>,
    kind: Kind,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Int { signed: bool },
    Float,
    Boolean,
    Void,
}

impl Primitive {
    pub fn descriptor(&self) -> FfiType {
        match self.kind {
            Kind::Int { signed } => FfiType::Int {
                bits: self.bits.unwrap_or(32),
                signed,
            },
            Kind::Float => FfiType::Float {
                bits: self.bits.unwrap_or(64),
            },
            Kind::Boolean => FfiType::Boolean,
            Kind::Void => FfiType::Undefined,
        }
    }
}

const fn int(bits: u32, signed: bool) -> Primitive {
    Primitive {
        ts: "number",
        bits: Some(bits),
        kind: Kind::Int { signed },
    }
}

const fn float(bits: u32) -> Primitive {
    Primitive {
        ts: "number",
        bits: Some(bits),
        kind: Kind::Float,
    }
}

/// Look up an intrinsic primitive by its GIR name. Pointer-width integers
/// (`glong`, `gsize`, `gpointer`) are mapped as 64-bit.
pub fn lookup(name: &str) -> Option<Primitive> {
    let p = match name {
        "gboolean" => Primitive {
            ts: "boolean",
            bits: Some(32),
            kind: Kind::Boolean,
        },
        "none" | "void" => Primitive {
            ts: "void",
            bits: None,
            kind: Kind::Void,
        },
        "gint8" | "gchar" => int(8, true),
        "guint8" | "guchar" => int(8, false),
        "gint16" | "gshort" => int(16, true),
        "guint16" | "gushort" => int(16, false),
        "gint" | "gint32" | "int" => int(32, true),
        "guint" | "guint32" | "gunichar" => int(32, false),
        "gint64" | "glong" | "gssize" | "gintptr" | "goffset" => int(64, true),
        "guint64" | "gulong" | "gsize" | "guintptr" => int(64, false),
        "gpointer" | "gconstpointer" => int(64, false),
        "gfloat" | "float" => float(32),
        "gdouble" | "double" | "glongdouble" => float(64),
        "GType" => int(64, false),
        _ => return None,
    };
    Some(p)
}

/// String-kind primitive names; these carry ownership semantics and are
/// handled before the intrinsic table.
pub fn is_string(name: &str) -> bool {
    matches!(name, "utf8" | "filename")
}

/// Byte size of an array element, for `garray` descriptors: `bits / 8` for
/// known numeric primitives, pointer width (8) for everything else.
pub fn element_size(name: &str) -> usize {
    match lookup(name).and_then(|p| p.bits) {
        Some(bits) => (bits / 8) as usize,
        None => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gint_is_signed_32() {
        let p = lookup("gint").unwrap();
        assert_eq!(p.ts, "number");
        assert_eq!(
            p.descriptor(),
            FfiType::Int {
                bits: 32,
                signed: true
            }
        );
    }

    #[test]
    fn void_maps_to_undefined() {
        assert_eq!(lookup("none").unwrap().descriptor(), FfiType::Undefined);
        assert_eq!(lookup("none").unwrap().ts, "void");
    }

    #[test]
    fn strings_are_not_intrinsics() {
        assert!(is_string("utf8"));
        assert!(is_string("filename"));
        assert!(lookup("utf8").is_none());
    }

    #[test]
    fn element_sizes() {
        assert_eq!(element_size("guint8"), 1);
        assert_eq!(element_size("gint"), 4);
        assert_eq!(element_size("gdouble"), 8);
        // Non-numeric elements fall back to pointer width.
        assert_eq!(element_size("Gtk.Widget"), 8);
    }
}
