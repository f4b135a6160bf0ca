//! Descriptor writer — [`FfiType`] values → the object-literal form the
//! runtime call primitive consumes.
//!
//! Pure rendering: every variant has a canonical field list and nested
//! descriptors are rendered recursively. The only default applied here is
//! the shared-library fallback for boxed/struct descriptors that carry no
//! explicit library.

use crate::descriptor::FfiType;

/// Generator-level context threaded into rendering.
#[derive(Debug, Clone)]
pub struct WriterContext {
    /// Shared library of the namespace being generated; the fallback for
    /// boxed/struct descriptors without an explicit one.
    pub shared_library: String,
    /// Library holding the error-channel's `GError` boxed type.
    pub error_library: String,
}

impl WriterContext {
    pub fn new(shared_library: &str, error_library: &str) -> WriterContext {
        WriterContext {
            shared_library: shared_library.to_string(),
            error_library: error_library.to_string(),
        }
    }

    /// Descriptor for the synthetic error-output argument of throwing
    /// callables: a ref cell holding an owned `GError` box.
    pub fn error_descriptor(&self) -> FfiType {
        FfiType::Ref {
            inner: Box::new(FfiType::Boxed {
                inner_type: "GError".to_string(),
                library: Some(self.error_library.clone()),
                get_type_func: Some("g_error_get_type".to_string()),
                copy_func: Some("g_error_copy".to_string()),
                free_func: Some("g_error_free".to_string()),
                ownership: crate::descriptor::Ownership::Full,
            }),
        }
    }
}

/// Render one descriptor as a single-line object literal.
pub fn render(ffi: &FfiType, ctx: &WriterContext) -> String {
    match ffi {
        FfiType::Int { bits, signed } => {
            format!("{{ type: \"int\", bits: {bits}, signed: {signed} }}")
        }
        FfiType::Float { bits } => format!("{{ type: \"float\", bits: {bits} }}"),
        FfiType::Boolean => "{ type: \"boolean\" }".to_string(),
        FfiType::Undefined => "{ type: \"undefined\" }".to_string(),
        FfiType::Null => "{ type: \"null\" }".to_string(),
        FfiType::String { ownership } => {
            format!("{{ type: \"string\", ownership: \"{}\" }}", ownership.as_str())
        }
        FfiType::GObject { ownership } => {
            format!("{{ type: \"gobject\", ownership: \"{}\" }}", ownership.as_str())
        }
        FfiType::Fundamental {
            inner_type,
            ref_func,
            unref_func,
            library,
            ownership,
        } => format!(
            "{{ type: \"fundamental\", innerType: \"{inner_type}\", refFunc: \"{ref_func}\", \
             unrefFunc: \"{unref_func}\", library: \"{library}\", ownership: \"{}\" }}",
            ownership.as_str()
        ),
        FfiType::Boxed {
            inner_type,
            library,
            get_type_func,
            copy_func,
            free_func,
            ownership,
        } => {
            let mut fields = vec![
                "type: \"boxed\"".to_string(),
                format!("innerType: \"{inner_type}\""),
                format!(
                    "library: \"{}\"",
                    library.as_deref().unwrap_or(&ctx.shared_library)
                ),
            ];
            if let Some(get_type) = get_type_func {
                fields.push(format!("getTypeFn: \"{get_type}\""));
            }
            if let Some(copy) = copy_func {
                fields.push(format!("copyFunc: \"{copy}\""));
            }
            if let Some(free) = free_func {
                fields.push(format!("freeFunc: \"{free}\""));
            }
            fields.push(format!("ownership: \"{}\"", ownership.as_str()));
            format!("{{ {} }}", fields.join(", "))
        }
        FfiType::Struct { inner_type, library } => format!(
            "{{ type: \"struct\", innerType: \"{inner_type}\", library: \"{}\" }}",
            library.as_deref().unwrap_or(&ctx.shared_library)
        ),
        FfiType::Ref { inner } => {
            format!("{{ type: \"ref\", innerType: {} }}", render(inner, ctx))
        }
        FfiType::Array {
            item,
            list,
            length_param,
            fixed_size,
            elem_size,
            ownership,
        } => {
            let mut fields = vec![
                "type: \"array\"".to_string(),
                format!("listType: \"{}\"", list.as_str()),
                format!("itemType: {}", render(item, ctx)),
            ];
            if let Some(index) = length_param {
                fields.push(format!("lengthParamIndex: {index}"));
            }
            if let Some(size) = fixed_size {
                fields.push(format!("fixedSize: {size}"));
            }
            if let Some(size) = elem_size {
                fields.push(format!("elemSize: {size}"));
            }
            fields.push(format!("ownership: \"{}\"", ownership.as_str()));
            format!("{{ {} }}", fields.join(", "))
        }
        FfiType::HashTable {
            key,
            value,
            ownership,
        } => format!(
            "{{ type: \"hashtable\", keyType: {}, valueType: {}, ownership: \"{}\" }}",
            render(key, ctx),
            render(value, ctx),
            ownership.as_str()
        ),
        FfiType::Callback {
            trampoline,
            args,
            ret,
        } => {
            let mut fields = vec!["type: \"callback\"".to_string()];
            if let Some(trampoline) = trampoline {
                fields.push(format!("trampoline: \"{trampoline}\""));
            }
            // argTypes is omitted entirely when the arguments are unknown;
            // a supported zero-argument callback renders `argTypes: []`.
            if let Some(args) = args {
                let rendered: Vec<String> = args.iter().map(|a| render(a, ctx)).collect();
                fields.push(format!("argTypes: [{}]", rendered.join(", ")));
            }
            if let Some(ret) = ret {
                fields.push(format!("returnType: {}", render(ret, ctx)));
            }
            format!("{{ {} }}", fields.join(", "))
        }
        FfiType::GVariant { ownership } => {
            format!("{{ type: \"gvariant\", ownership: \"{}\" }}", ownership.as_str())
        }
        FfiType::GParam { ownership } => {
            format!("{{ type: \"gparam\", ownership: \"{}\" }}", ownership.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ListKind, Ownership};

    fn ctx() -> WriterContext {
        WriterContext::new("libdemo-1.so.0", "libglib-2.0.so.0")
    }

    #[test]
    fn primitive_rendering() {
        assert_eq!(
            render(&FfiType::Int { bits: 32, signed: true }, &ctx()),
            "{ type: \"int\", bits: 32, signed: true }"
        );
        assert_eq!(render(&FfiType::Boolean, &ctx()), "{ type: \"boolean\" }");
    }

    #[test]
    fn boxed_library_falls_back_to_context() {
        let boxed = FfiType::Boxed {
            inner_type: "DemoRect".to_string(),
            library: None,
            get_type_func: Some("demo_rect_get_type".to_string()),
            copy_func: None,
            free_func: None,
            ownership: Ownership::Full,
        };
        let out = render(&boxed, &ctx());
        assert!(out.contains("library: \"libdemo-1.so.0\""), "{out}");
        assert!(out.contains("getTypeFn: \"demo_rect_get_type\""), "{out}");
        assert!(!out.contains("copyFunc"), "{out}");
    }

    #[test]
    fn nested_array_rendering() {
        let arr = FfiType::Array {
            item: Box::new(FfiType::String {
                ownership: Ownership::Full,
            }),
            list: ListKind::GList,
            length_param: None,
            fixed_size: None,
            elem_size: None,
            ownership: Ownership::Full,
        };
        assert_eq!(
            render(&arr, &ctx()),
            "{ type: \"array\", listType: \"glist\", itemType: { type: \"string\", \
             ownership: \"full\" }, ownership: \"full\" }"
        );
    }

    #[test]
    fn callback_omits_unknown_args() {
        let unknown = FfiType::Callback {
            trampoline: None,
            args: None,
            ret: None,
        };
        assert_eq!(render(&unknown, &ctx()), "{ type: \"callback\" }");

        let empty = FfiType::Callback {
            trampoline: Some("sourceFuncTrampoline".to_string()),
            args: Some(Vec::new()),
            ret: None,
        };
        assert_eq!(
            render(&empty, &ctx()),
            "{ type: \"callback\", trampoline: \"sourceFuncTrampoline\", argTypes: [] }"
        );
    }

    #[test]
    fn error_descriptor_is_owned_gerror_ref() {
        let out = render(&ctx().error_descriptor(), &ctx());
        assert!(out.starts_with("{ type: \"ref\""), "{out}");
        assert!(out.contains("innerType: { type: \"boxed\", innerType: \"GError\""), "{out}");
        assert!(out.contains("library: \"libglib-2.0.so.0\""), "{out}");
        assert!(out.contains("ownership: \"full\""), "{out}");
    }
}
