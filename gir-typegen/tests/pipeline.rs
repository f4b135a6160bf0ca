//! Full-pipeline integration test: config TOML → GIR load → generated
//! TypeScript module, verified against the on-disk Demo fixture.

use std::path::Path;
use std::sync::LazyLock;

use gir_typegen::GeneratedModule;
use gir_typegen::diagnostics::DiagnosticKind;

static MODULES: LazyLock<Vec<GeneratedModule>> = LazyLock::new(|| {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/demo.toml");
    gir_typegen::generate(&path).expect("generate Demo modules")
});

fn demo() -> &'static GeneratedModule {
    MODULES
        .iter()
        .find(|m| m.namespace == "Demo")
        .expect("Demo module generated")
}

#[test]
fn one_module_per_generated_namespace() {
    assert_eq!(MODULES.len(), 1, "only Demo is marked for generation");
    let module = demo();
    assert_eq!(module.file_name, "Demo.ts");
    assert!(
        module
            .source
            .starts_with("// Generated from Demo-1.0.gir — do not edit.\n"),
        "missing header: {:?}",
        module.source.lines().next()
    );
    assert!(
        module
            .source
            .contains("import { call, createRef, registry, wrapError, Ref } from \"../runtime\";"),
        "missing runtime import"
    );
}

#[test]
fn enums_and_bitfields_use_screaming_snake_members() {
    let src = &demo().source;
    assert!(src.contains("export enum Align {"), "Align enum missing");
    assert!(src.contains("    START = 0,"));
    assert!(src.contains("    CENTER = 1,"));
    assert!(src.contains("    END = 2,"));
    assert!(src.contains("export enum StateFlags {"), "StateFlags missing");
    assert!(src.contains("    PRELIGHT = 2,"));
}

#[test]
fn constructor_is_a_static_method_returning_wrapped_object() {
    let src = &demo().source;
    assert!(src.contains("export class Widget {"), "Widget class missing");
    assert!(src.contains("    static new(): Widget {"), "constructor missing");
    assert!(
        src.contains("return registry.wrap(result) as Widget;"),
        "constructor result must go through the registry"
    );
}

#[test]
fn methods_carry_shared_library_and_c_identifier() {
    let src = &demo().source;
    assert!(src.contains("    set_title(title: string): void {"));
    assert!(
        src.contains("call(\"libdemo-1.so.0\", \"demo_widget_set_title\","),
        "native call must name the shared library and symbol"
    );
    // Explicit transfer-ownership="none" on the string input.
    let set_title = section(src, "set_title(");
    assert!(
        set_title.contains("{ type: \"string\", ownership: \"borrowed\" }"),
        "borrowed input string expected: {set_title}"
    );
}

#[test]
fn nullable_return_widens_the_signature() {
    let src = &demo().source;
    assert!(
        src.contains("    get_title(): string | null {"),
        "nullable string return"
    );
}

#[test]
fn caller_allocated_out_param_stays_a_plain_borrowed_value() {
    let src = &demo().source;
    assert!(
        src.contains("    measure(bounds: Rect): void {"),
        "caller-allocates out param must not become a Ref cell"
    );
    let measure = section(src, "measure(");
    assert!(!measure.contains("Ref<Rect>"), "no ref cell: {measure}");
    assert!(
        measure.contains("type: \"boxed\", innerType: \"DemoRect\""),
        "boxed descriptor for Rect: {measure}"
    );
    assert!(
        measure.contains("getTypeFn: \"demo_rect_get_type\""),
        "boxed type hook: {measure}"
    );
    assert!(
        measure.contains("ownership: \"borrowed\""),
        "caller-allocated storage is borrowed: {measure}"
    );
}

#[test]
fn supported_callback_synthesizes_signature_and_elides_closure_targets() {
    let src = &demo().source;
    // user_data (closure=1) and notify (destroy=2) vanish from the signature;
    // the callback's own user_data parameter vanishes from the function type.
    assert!(
        src.contains("    add_tick_callback(callback: (value: number) => void): number {"),
        "callback signature: {src}"
    );
    let add = section(src, "add_tick_callback(");
    assert!(
        add.contains("trampoline: \"tickTrampoline\""),
        "config-registered trampoline: {add}"
    );
    assert!(
        add.contains("argTypes: [{ type: \"int\", bits: 32, signed: true }]"),
        "callback arg descriptors: {add}"
    );
}

#[test]
fn class_level_functions_render_as_statics() {
    let src = &demo().source;
    assert!(
        src.contains("    static version(): number {"),
        "class-level function must not become an instance method: {src}"
    );
    // No receiver is marshalled for a static.
    let version = section(src, "static version(");
    assert!(
        version.contains("\"demo_widget_version\", [],"),
        "static call takes no arguments: {version}"
    );
    assert!(!version.contains("value: this"), "{version}");
}

#[test]
fn unsupported_callback_skips_the_whole_callable() {
    let module = demo();
    assert!(
        !module.source.contains("inspect("),
        "inspect takes an un-trampolined callback and must not be emitted"
    );
    assert_eq!(module.skipped_callables, 1);
    assert!(
        module.diagnostics.iter().any(|d| {
            d.kind == DiagnosticKind::UnsupportedCallback && d.name == "demo_widget_inspect"
        }),
        "skip must be observable: {:?}",
        module.diagnostics
    );
}

#[test]
fn throwing_function_checks_the_error_cell_before_returning() {
    let src = &demo().source;
    assert!(src.contains("export function init(): boolean {"));
    let init = section(src, "export function init(");
    assert!(init.contains("const error = createRef(null);"));
    assert!(
        init.contains("getTypeFn: \"g_error_get_type\""),
        "error argument is an owned GError box: {init}"
    );
    let check = init
        .find("throw wrapError(error.value);")
        .expect("error check present");
    let ret = init.find("return result;").expect("return present");
    assert!(check < ret, "error must be checked before the result is used");
}

#[test]
fn container_list_return_rewraps_each_element() {
    let src = &demo().source;
    assert!(src.contains("export function list_widgets(): Widget[] {"));
    let list = section(src, "export function list_widgets(");
    assert!(
        list.contains("type: \"array\", listType: \"glist\""),
        "GList descriptor: {list}"
    );
    assert!(
        list.contains("itemType: { type: \"gobject\", ownership: \"full\" }"),
        "container transfer owns the elements: {list}"
    );
    assert!(
        list.contains("return result.map((item) => registry.wrap(item) as Widget);"),
        "each element goes through the registry: {list}"
    );
}

#[test]
fn run_writes_modules_to_the_output_directory() {
    let config = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/demo.toml");
    let out = tempfile::tempdir().expect("tempdir");

    let paths = gir_typegen::run(&config, Some(out.path())).expect("run pipeline");
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0], out.path().join("Demo.ts"));

    let written = std::fs::read_to_string(&paths[0]).expect("read generated module");
    assert_eq!(written, demo().source);
}

/// The source slice from the first occurrence of `marker` to the next
/// closing brace at column zero — roughly one declaration.
fn section<'a>(src: &'a str, marker: &str) -> &'a str {
    let start = src.find(marker).unwrap_or_else(|| panic!("{marker} not found"));
    let rest = &src[start..];
    match rest.find("\n}") {
        Some(end) => &rest[..end],
        None => rest,
    }
}
