//! Callable body builder — composes mapped parameters, the native call,
//! error-channel checking, and object-registry rewrapping into a full
//! function or method body.

use gir_repository::model::{Direction, FunctionDef, Metadata, Param, TypeNode};

use crate::descriptor::FfiType;
use crate::diagnostics::DiagnosticKind;
use crate::mapper::{MappedType, Mapper, TypeImport, TypeKind};
use crate::writer::{self, WriterContext};

/// The callable being generated, borrowed from the model.
#[derive(Debug, Clone, Copy)]
pub struct CallableSpec<'a> {
    pub name: &'a str,
    pub c_identifier: &'a str,
    pub params: &'a [Param],
    pub return_type: &'a TypeNode,
    pub return_nullable: bool,
    pub throws: bool,
    pub is_method: bool,
}

impl<'a> CallableSpec<'a> {
    pub fn from_function(f: &'a FunctionDef) -> CallableSpec<'a> {
        CallableSpec {
            name: &f.name,
            c_identifier: &f.c_identifier,
            params: &f.params,
            return_type: &f.return_type,
            return_nullable: f.return_nullable,
            throws: f.throws,
            is_method: f.is_method,
        }
    }
}

/// A fully composed callable, ready to splice into a declaration.
#[derive(Debug)]
pub struct GeneratedCallable {
    pub name: String,
    /// Rendered parameter list (`title: string, count?: number`).
    pub params_ts: String,
    pub return_ts: String,
    /// Body statements, unindented.
    pub lines: Vec<String>,
    pub imports: Vec<TypeImport>,
}

impl GeneratedCallable {
    /// Render as a free function declaration.
    pub fn render_function(&self) -> String {
        let mut out = format!(
            "export function {}({}): {} {{\n",
            self.name, self.params_ts, self.return_ts
        );
        for line in &self.lines {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }

    /// Render as a class method declaration at one indent level.
    pub fn render_method(&self) -> String {
        self.render_in_class("")
    }

    /// Render as a static class method (used for constructors).
    pub fn render_static_method(&self) -> String {
        self.render_in_class("static ")
    }

    fn render_in_class(&self, prefix: &str) -> String {
        let mut out = format!(
            "    {}{}({}): {} {{\n",
            prefix, self.name, self.params_ts, self.return_ts
        );
        for line in &self.lines {
            out.push_str("        ");
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("    }\n");
        out
    }
}

/// Compose one callable. Returns `None` when a parameter is an unsupported
/// callback — such callables are skipped entirely, never partially emitted.
pub fn build_callable<M: Metadata>(
    mapper: &mut Mapper<'_, M>,
    ctx: &WriterContext,
    callable: &CallableSpec<'_>,
) -> Option<GeneratedCallable> {
    // The receiver is prepended to the native argument list, shifting every
    // length-parameter index by one.
    let length_offset = if callable.is_method { 1 } else { 0 };

    // Visible parameters: varargs markers and closure targets (user-data /
    // destroy-notify cells claimed by a callback sibling) are elided.
    // Closure/destroy indices are authored against the unfiltered list.
    let visible: Vec<(usize, &Param)> = callable
        .params
        .iter()
        .enumerate()
        .filter(|(i, p)| !p.is_varargs && !mapper.is_closure_target(callable.params, *i))
        .collect();

    // An unsupported callback among the surviving parameters poisons the
    // whole callable; emitting it partially would produce an uncallable
    // wrapper. Elided destroy-notify cells don't count — their trampoline
    // handles them.
    let surviving: Vec<Param> = visible.iter().map(|&(_, p)| p.clone()).collect();
    if mapper.has_unsupported_callback(&surviving) {
        mapper.push_diagnostic(DiagnosticKind::UnsupportedCallback, callable.c_identifier);
        return None;
    }

    let mut imports = Vec::new();
    let mut sig_parts = Vec::new();
    let mut call_args = Vec::new();
    let mut mapped_params: Vec<(&Param, MappedType)> = Vec::new();

    // Once one parameter is optional, every following parameter must be —
    // the target language has no required parameters after optional ones.
    let mut optional_seen = false;

    for &(_, param) in &visible {
        let mapped = mapper.map_parameter(param, length_offset);
        let optional = param.optional || optional_seen;
        optional_seen = optional;

        let mut ts = mapped.ts.clone();
        if param.nullable {
            ts = format!("{ts} | null");
        }
        sig_parts.push(format!(
            "{}{}: {}",
            param.name,
            if optional { "?" } else { "" },
            ts
        ));
        call_args.push(format!(
            "{{ value: {}, type: {}, optional: {} }}",
            param.name,
            writer::render(&mapped.ffi, ctx),
            optional
        ));
        imports.extend(mapped.imports.iter().cloned());
        mapped_params.push((param, mapped));
    }

    if callable.is_method {
        call_args.insert(
            0,
            "{ value: this, type: { type: \"gobject\", ownership: \"none\" } }".to_string(),
        );
    }

    let ret = mapper.map_type(callable.return_type, true, None, length_offset);
    imports.extend(ret.imports.iter().cloned());
    let is_void = ret.ffi == FfiType::Undefined;

    let result_var = result_variable(&visible);

    let mut lines = Vec::new();

    if callable.throws {
        lines.push("const error = createRef(null);".to_string());
        call_args.push(format!(
            "{{ value: error, type: {} }}",
            writer::render(&ctx.error_descriptor(), ctx)
        ));
    }

    let call_expr = format!(
        "call(\"{}\", \"{}\", [{}], {})",
        ctx.shared_library,
        callable.c_identifier,
        call_args.join(", "),
        writer::render(&ret.ffi, ctx)
    );
    if is_void {
        lines.push(format!("{call_expr};"));
    } else {
        lines.push(format!("const {result_var} = {call_expr};"));
    }

    // The error cell is checked before the result is touched; a throwing
    // call may leave an invalid return value behind.
    if callable.throws {
        lines.push("if (error.value !== null) { throw wrapError(error.value); }".to_string());
    }

    // Out/inout cells the native side filled in hold raw ids; rewrap them
    // through the object registry in place.
    for (param, mapped) in &mapped_params {
        if param.direction == Direction::In {
            continue;
        }
        let FfiType::Ref { inner } = &mapped.ffi else {
            continue;
        };
        if !inner.is_wrapped() {
            continue;
        }
        let name = &param.name;
        if param.nullable {
            lines.push(format!(
                "if ({name}.value !== null) {{ {name}.value = registry.wrap({name}.value); }}"
            ));
        } else {
            lines.push(format!("{name}.value = registry.wrap({name}.value);"));
        }
    }

    let mut return_ts = ret.ts.clone();
    if !is_void {
        if callable.return_nullable {
            return_ts = format!("{return_ts} | null");
            if wrapped_return(&ret) {
                lines.push(format!(
                    "if ({result_var} === null) {{ return null; }}"
                ));
            }
        }
        lines.push(return_line(&ret, &result_var));
    }

    Some(GeneratedCallable {
        name: callable.name.to_string(),
        params_ts: sig_parts.join(", "),
        return_ts,
        lines,
        imports,
    })
}

/// The temporary holding the raw call result must not collide with a
/// parameter name.
fn result_variable(visible: &[(usize, &Param)]) -> String {
    if visible.iter().any(|(_, p)| p.name == "result") {
        "_result".to_string()
    } else {
        "result".to_string()
    }
}

/// Wrapped returns go through the object registry; interfaces and boxed
/// types carry no reliable runtime type tag, so the expected class is
/// passed explicitly.
fn wrapped_return(ret: &MappedType) -> bool {
    if ret.ffi.is_wrapped() {
        return true;
    }
    matches!(&ret.ffi, FfiType::Array { item, .. } if item.is_wrapped())
}

fn return_line(ret: &MappedType, result_var: &str) -> String {
    if let FfiType::Array { item, .. } = &ret.ffi {
        if item.is_wrapped() {
            let elem = ret.inner_ts.as_deref().unwrap_or("unknown");
            return format!(
                "return {result_var}.map((item) => registry.wrap(item) as {elem});"
            );
        }
        return format!("return {result_var};");
    }
    if ret.ffi.is_wrapped() {
        let needs_class_hint =
            matches!(ret.kind, Some(TypeKind::Interface)) || matches!(ret.ffi, FfiType::Boxed { .. });
        if needs_class_hint {
            return format!(
                "return registry.wrap({result_var}, {ts}) as {ts};",
                ts = ret.ts
            );
        }
        return format!("return registry.wrap({result_var}) as {ts};", ts = ret.ts);
    }
    format!("return {result_var};")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::MapperOptions;
    use gir_repository::model::{ClassDef, Namespace, Repository, Transfer};

    fn repo() -> Repository {
        let mut ns = Namespace::new("Demo");
        ns.shared_library = Some("libdemo-1.so.0".to_string());
        ns.classes.insert(
            "Widget".to_string(),
            ClassDef {
                name: "Widget".to_string(),
                glib_type_name: Some("DemoWidget".to_string()),
                glib_get_type: Some("demo_widget_get_type".to_string()),
                ..ClassDef::default()
            },
        );
        let mut repo = Repository::new();
        repo.add_namespace(ns);
        repo
    }

    fn ctx() -> WriterContext {
        WriterContext::new("libdemo-1.so.0", "libglib-2.0.so.0")
    }

    #[test]
    fn result_variable_avoids_parameter_collision() {
        let repo = repo();
        let options = MapperOptions::default();
        let mut mapper = Mapper::new(&repo, "Demo", &options);

        let f = FunctionDef {
            name: "compute".to_string(),
            c_identifier: "demo_compute".to_string(),
            params: vec![Param::new("result", TypeNode::named("gint"))],
            return_type: TypeNode::named("gint"),
            ..FunctionDef::default()
        };
        let generated =
            build_callable(&mut mapper, &ctx(), &CallableSpec::from_function(&f)).unwrap();
        assert!(generated.lines[0].starts_with("const _result = call("));
        assert_eq!(generated.lines[1], "return _result;");
    }

    #[test]
    fn optional_cascades_to_trailing_parameters() {
        let repo = repo();
        let options = MapperOptions::default();
        let mut mapper = Mapper::new(&repo, "Demo", &options);

        let mut first = Param::new("a", TypeNode::named("gint"));
        first.optional = true;
        let second = Param::new("b", TypeNode::named("gint"));
        let f = FunctionDef {
            name: "configure".to_string(),
            c_identifier: "demo_configure".to_string(),
            params: vec![first, second],
            return_type: TypeNode::named("none"),
            ..FunctionDef::default()
        };
        let generated =
            build_callable(&mut mapper, &ctx(), &CallableSpec::from_function(&f)).unwrap();
        assert_eq!(generated.params_ts, "a?: number, b?: number");
    }

    #[test]
    fn throwing_call_checks_error_before_wrapping() {
        let repo = repo();
        let options = MapperOptions::default();
        let mut mapper = Mapper::new(&repo, "Demo", &options);

        let f = FunctionDef {
            name: "load".to_string(),
            c_identifier: "demo_load".to_string(),
            params: vec![],
            return_type: TypeNode::named("Widget").with_transfer(Transfer::Full),
            throws: true,
            ..FunctionDef::default()
        };
        let generated =
            build_callable(&mut mapper, &ctx(), &CallableSpec::from_function(&f)).unwrap();

        let error_check = generated
            .lines
            .iter()
            .position(|l| l.contains("throw wrapError"))
            .expect("error check present");
        let wrap = generated
            .lines
            .iter()
            .position(|l| l.contains("registry.wrap"))
            .expect("rewrap present");
        assert!(error_check < wrap, "error must be checked before the result is wrapped");
        assert_eq!(generated.lines[0], "const error = createRef(null);");
    }

    #[test]
    fn method_prepends_receiver_argument() {
        let repo = repo();
        let options = MapperOptions::default();
        let mut mapper = Mapper::new(&repo, "Demo", &options);

        let f = FunctionDef {
            name: "refresh".to_string(),
            c_identifier: "demo_widget_refresh".to_string(),
            params: vec![],
            return_type: TypeNode::named("none"),
            is_method: true,
            ..FunctionDef::default()
        };
        let generated =
            build_callable(&mut mapper, &ctx(), &CallableSpec::from_function(&f)).unwrap();
        assert!(
            generated.lines[0].contains("[{ value: this, type: { type: \"gobject\", ownership: \"none\" } }]"),
            "{}",
            generated.lines[0]
        );
    }
}
