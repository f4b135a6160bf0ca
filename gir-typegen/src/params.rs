//! Parameter and callback mapping — specializes [`Mapper::map_type`] for
//! callable parameters: direction wrapping, caller-allocated out values,
//! trampoline-backed callback synthesis, and closure-target elision.

use gir_repository::model::{Direction, Metadata, Param, Transfer, TypeNode};

use crate::descriptor::{FfiType, Ownership};
use crate::diagnostics::DiagnosticKind;
use crate::mapper::{MappedType, Mapper, TypeKind};

impl<M: Metadata> Mapper<'_, M> {
    /// Map one callable parameter.
    ///
    /// `length_offset` shifts array length-parameter indices, exactly as in
    /// [`Mapper::map_type`].
    pub fn map_parameter(&mut self, param: &Param, length_offset: usize) -> MappedType {
        // Out/inout parameters cross the boundary in a mutable reference
        // cell — except when the caller pre-allocates object-shaped
        // storage, where a plain borrowed value is passed instead because
        // no new allocation crosses the boundary.
        if param.direction != Direction::In {
            let mut inner = self.map_type(&param.ty, false, param.transfer, length_offset);
            if param.caller_allocates
                && matches!(
                    inner.ffi,
                    FfiType::Boxed { .. } | FfiType::GObject { .. } | FfiType::Struct { .. }
                )
            {
                inner.ffi.set_ownership(Ownership::Borrowed);
                return inner;
            }
            let inner_ts = inner.ts.clone();
            return MappedType {
                ts: format!("Ref<{}>", inner.ts),
                ffi: FfiType::Ref {
                    inner: Box::new(inner.ffi),
                },
                imports: inner.imports,
                kind: inner.kind,
                inner_ts: Some(inner_ts),
            };
        }

        if let Some(name) = param.ty.name.as_deref() {
            let qualified = self.qualify(name);
            if self.is_supported_callback(&param.ty) {
                if let Some(mapped) = self.map_callback(&qualified) {
                    return mapped;
                }
            }
            if self.is_callback_shaped(&param.ty) {
                // Callback without a trampoline: opaque function type. The
                // generator is expected to skip the whole callable (see
                // `has_unsupported_callback`), never emit it partially.
                self.push_diagnostic(DiagnosticKind::UnsupportedCallback, &qualified);
                return MappedType {
                    ts: "(...args: any[]) => any".to_string(),
                    ffi: FfiType::Callback {
                        trampoline: None,
                        args: None,
                        ret: None,
                    },
                    imports: Vec::new(),
                    kind: Some(TypeKind::Callback),
                    inner_ts: None,
                };
            }
        }

        let mut mapped = self.map_type(&param.ty, false, param.transfer, length_offset);

        // Input parameters that resolved to object types take their
        // ownership from the parameter's own annotation only: explicit
        // full transfers ownership to the callee, anything else is a
        // non-owning borrow at the call site. The directional default
        // from map_type never applies here.
        if matches!(mapped.ffi, FfiType::GObject { .. } | FfiType::Boxed { .. }) {
            let ownership = match param.transfer {
                Some(Transfer::Full) => Ownership::Full,
                _ => Ownership::None,
            };
            mapped.ffi.set_ownership(ownership);
        }

        mapped
    }

    /// Synthesize the signature and descriptor for a trampoline-backed
    /// callback type. Returns `None` when the name is not a known callback
    /// or has no registered trampoline.
    pub fn map_callback(&mut self, qualified_name: &str) -> Option<MappedType> {
        let trampoline = self.options.trampolines.get(qualified_name)?.clone();
        let def = self.meta.find_callback(qualified_name)?.clone();

        let mut sig_parts = Vec::new();
        let mut arg_descs = Vec::new();
        let mut imports = Vec::new();

        // The trampoline adapter supplies the user-data argument itself;
        // it never appears in the managed signature.
        for p in def
            .params
            .iter()
            .filter(|p| p.name != "user_data" && p.name != "data")
        {
            let mapped = self.map_type(&p.ty, false, p.transfer, 0);
            let ts = if p.nullable {
                format!("{} | null", mapped.ts)
            } else {
                mapped.ts.clone()
            };
            sig_parts.push(format!("{}: {}", p.name, ts));
            arg_descs.push(mapped.ffi);
            imports.extend(mapped.imports);
        }

        let (ret_ts, ret_desc) = match def.return_type.name.as_deref() {
            None | Some("none") | Some("void") => ("void".to_string(), None),
            _ => {
                let mapped = self.map_type(&def.return_type, true, None, 0);
                let ts = if def.return_nullable {
                    format!("{} | null", mapped.ts)
                } else {
                    mapped.ts.clone()
                };
                imports.extend(mapped.imports);
                (ts, Some(Box::new(mapped.ffi)))
            }
        };

        Some(MappedType {
            ts: format!("({}) => {}", sig_parts.join(", "), ret_ts),
            ffi: FfiType::Callback {
                trampoline: Some(trampoline),
                args: Some(arg_descs),
                ret: ret_desc,
            },
            imports,
            kind: Some(TypeKind::Callback),
            inner_ts: None,
        })
    }

    /// A parameter is a closure target — and must be excluded from emitted
    /// signatures — iff some sibling is a supported callback whose declared
    /// closure or destroy index equals this parameter's position. Indices
    /// are authored against the unfiltered parameter list, so this must be
    /// called with the original list.
    pub fn is_closure_target(&self, params: &[Param], index: usize) -> bool {
        params.iter().any(|p| {
            self.is_supported_callback(&p.ty)
                && (p.closure == Some(index) || p.destroy == Some(index))
        })
    }

    /// True when the nullability annotations allow a missing value.
    pub fn is_nullable(param: &Param) -> bool {
        param.nullable
    }

    /// True when any parameter is callback-shaped without a registered
    /// trampoline. Such callables must not be generated at all.
    pub fn has_unsupported_callback(&self, params: &[Param]) -> bool {
        params
            .iter()
            .any(|p| self.is_callback_shaped(&p.ty) && !self.is_supported_callback(&p.ty))
    }

    fn is_supported_callback(&self, ty: &TypeNode) -> bool {
        let Some(name) = ty.name.as_deref() else {
            return false;
        };
        let qualified = self.qualify(name);
        self.options.trampolines.contains_key(&qualified)
            && self.meta.find_callback(&qualified).is_some()
    }

    /// Callback-shaped: a declared callback kind, or the generic
    /// `GObject.Closure` box.
    fn is_callback_shaped(&self, ty: &TypeNode) -> bool {
        let Some(name) = ty.name.as_deref() else {
            return false;
        };
        if self.qualify(name) == "GObject.Closure" {
            return true;
        }
        matches!(
            self.resolve(name).map(|r| r.kind),
            Some(TypeKind::Callback)
        )
    }
}
