//! GIR XML loader — `.gir` documents → normalized model types.
//!
//! Parses the introspection XML into a small element tree first, then runs
//! one collection pass per declaration kind. Malformed declarations are
//! skipped with a warning instead of failing the whole load.

use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};

use crate::model::*;

/// A parsed XML element. Attribute keys keep their namespace prefix
/// (`glib:get-type`); tag names are stored without one (`glib:boxed` is not
/// used by this loader).
#[derive(Debug, Default)]
struct XmlNode {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }
}

/// Parse an XML document into an element tree, dropping text content
/// (GIR documentation strings are not needed by codegen).
fn parse_tree(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(node_from_tag(
                    e.name().as_ref(),
                    e.attributes().filter_map(|a| a.ok()),
                ));
            }
            Ok(Event::Empty(ref e)) => {
                let node = node_from_tag(
                    e.name().as_ref(),
                    e.attributes().filter_map(|a| a.ok()),
                );
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Ok(Event::End(_)) => {
                if let Some(node) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => anyhow::bail!("malformed XML at byte {}: {e}", reader.buffer_position()),
        }
    }

    root.context("empty XML document")
}

fn node_from_tag<'a>(
    name: &[u8],
    attrs: impl Iterator<Item = quick_xml::events::attributes::Attribute<'a>>,
) -> XmlNode {
    let tag = String::from_utf8_lossy(name);
    // Strip the element's namespace prefix ("core:type" → "type") but keep
    // attribute prefixes — "glib:get-type" and "c:type" are distinct keys.
    let tag = tag.rsplit(':').next().unwrap_or(&tag).to_string();
    let attrs = attrs
        .map(|a| {
            (
                String::from_utf8_lossy(a.key.as_ref()).to_string(),
                String::from_utf8_lossy(&a.value).to_string(),
            )
        })
        .collect();
    XmlNode {
        tag,
        attrs,
        children: Vec::new(),
    }
}

/// Load one `.gir` file and add its namespaces to `repo`.
pub fn load_gir_file(repo: &mut Repository, path: &Path) -> Result<()> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("reading GIR file {}", path.display()))?;
    load_gir_str(repo, &xml).with_context(|| format!("parsing GIR file {}", path.display()))
}

/// Load a `.gir` document from a string and add its namespaces to `repo`.
pub fn load_gir_str(repo: &mut Repository, xml: &str) -> Result<()> {
    let root = parse_tree(xml)?;
    if root.tag != "repository" {
        anyhow::bail!("expected <repository> root element, found <{}>", root.tag);
    }

    for ns_node in root.children_named("namespace") {
        let ns = collect_namespace(ns_node)?;
        debug!(
            namespace = %ns.name,
            classes = ns.classes.len(),
            interfaces = ns.interfaces.len(),
            records = ns.records.len(),
            enums = ns.enums.len(),
            callbacks = ns.callbacks.len(),
            functions = ns.functions.len(),
            "loaded namespace"
        );
        repo.add_namespace(ns);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Collection helpers — one per declaration kind
// ---------------------------------------------------------------------------

fn collect_namespace(node: &XmlNode) -> Result<Namespace> {
    let name = node.attr("name").context("namespace without a name")?;
    let mut ns = Namespace::new(name);
    ns.version = node.attr("version").unwrap_or_default().to_string();
    // A namespace may list several DSOs; the first is the one dlopen'd by
    // the runtime bridge.
    ns.shared_library = node
        .attr("shared-library")
        .map(|s| s.split(',').next().unwrap_or(s).to_string());

    for child in &node.children {
        match child.tag.as_str() {
            "class" => {
                let class = collect_class(child);
                match class {
                    Some(c) => {
                        ns.classes.insert(c.name.clone(), c);
                    }
                    None => warn!(tag = "class", "skipping unnamed declaration"),
                }
            }
            "interface" => match collect_class(child) {
                Some(c) => {
                    ns.interfaces.insert(c.name.clone(), c);
                }
                None => warn!(tag = "interface", "skipping unnamed declaration"),
            },
            "record" => match collect_record(child) {
                Some(r) => {
                    ns.records.insert(r.name.clone(), r);
                }
                None => warn!(tag = "record", "skipping unnamed declaration"),
            },
            "enumeration" | "bitfield" => match collect_enum(child) {
                Some(e) => {
                    ns.enums.insert(e.name.clone(), e);
                }
                None => warn!(tag = %child.tag, "skipping unnamed declaration"),
            },
            "callback" => match collect_callback(child) {
                Some(cb) => {
                    ns.callbacks.insert(cb.name.clone(), cb);
                }
                None => warn!(tag = "callback", "skipping unnamed declaration"),
            },
            "function" => {
                if let Some(f) = collect_function(child, false) {
                    ns.functions.push(f);
                }
            }
            _ => {}
        }
    }

    Ok(ns)
}

fn collect_class(node: &XmlNode) -> Option<ClassDef> {
    let name = node.attr("name")?;
    let mut class = ClassDef {
        name: name.to_string(),
        parent: node.attr("parent").map(str::to_string),
        glib_type_name: node.attr("glib:type-name").map(str::to_string),
        glib_get_type: node.attr("glib:get-type").map(str::to_string),
        ref_func: node.attr("glib:ref-func").map(str::to_string),
        unref_func: node.attr("glib:unref-func").map(str::to_string),
        ..ClassDef::default()
    };

    for m in node.children_named("method") {
        if let Some(f) = collect_function(m, true) {
            class.methods.push(f);
        }
    }
    for c in node.children_named("constructor") {
        if let Some(f) = collect_function(c, false) {
            class.constructors.push(f);
        }
    }
    // Static functions hang off the class in GIR but are free functions to
    // the bridge; keep them with the methods, unmarked.
    for f in node.children_named("function") {
        if let Some(f) = collect_function(f, false) {
            class.methods.push(f);
        }
    }

    Some(class)
}

// Record method children are not collected: boxed and plain records cross
// the bridge by value, through the copy/free and get-type hooks alone.
fn collect_record(node: &XmlNode) -> Option<RecordDef> {
    let name = node.attr("name")?;
    Some(RecordDef {
        name: name.to_string(),
        glib_type_name: node.attr("glib:type-name").map(str::to_string),
        glib_get_type: node.attr("glib:get-type").map(str::to_string),
        copy_function: node.attr("copy-function").map(str::to_string),
        free_function: node.attr("free-function").map(str::to_string),
        ref_func: node.attr("glib:ref-func").map(str::to_string),
        unref_func: node.attr("glib:unref-func").map(str::to_string),
    })
}

fn collect_enum(node: &XmlNode) -> Option<EnumDef> {
    let name = node.attr("name")?;
    let members = node
        .children_named("member")
        .filter_map(|m| {
            let name = m.attr("name")?;
            let value = m.attr("value")?.parse::<i64>().ok()?;
            Some(EnumMember {
                name: name.to_string(),
                value,
            })
        })
        .collect();
    Some(EnumDef {
        name: name.to_string(),
        bitfield: node.tag == "bitfield",
        members,
    })
}

fn collect_callback(node: &XmlNode) -> Option<CallbackDef> {
    let name = node.attr("name")?;
    let (return_type, return_nullable) = collect_return(node);
    Some(CallbackDef {
        name: name.to_string(),
        params: collect_params(node),
        return_type,
        return_nullable,
    })
}

fn collect_function(node: &XmlNode, is_method: bool) -> Option<FunctionDef> {
    let name = node.attr("name")?;
    let c_identifier = node.attr("c:identifier").unwrap_or(name);
    let (return_type, return_nullable) = collect_return(node);
    Some(FunctionDef {
        name: name.to_string(),
        c_identifier: c_identifier.to_string(),
        params: collect_params(node),
        return_type,
        return_nullable,
        throws: node.attr("throws") == Some("1"),
        is_method,
    })
}

fn collect_return(node: &XmlNode) -> (TypeNode, bool) {
    match node.child("return-value") {
        Some(rv) => {
            let nullable = flag(rv, "nullable") || flag(rv, "allow-none");
            let mut ty = collect_type(rv).unwrap_or_else(|| TypeNode::named("none"));
            ty.transfer = rv.attr("transfer-ownership").and_then(Transfer::parse);
            ty.nullable = nullable;
            (ty, nullable)
        }
        None => (TypeNode::named("none"), false),
    }
}

/// Collect the `<parameters>` list, skipping the instance parameter (it is
/// supplied implicitly by the receiver at call time).
fn collect_params(node: &XmlNode) -> Vec<Param> {
    let Some(params_node) = node.child("parameters") else {
        return Vec::new();
    };

    let mut params = Vec::new();
    for p in params_node.children_named("parameter") {
        if p.child("varargs").is_some() {
            params.push(Param {
                name: p.attr("name").unwrap_or("...").to_string(),
                is_varargs: true,
                ..Param::default()
            });
            continue;
        }

        let Some(mut ty) = collect_type(p) else {
            warn!(name = p.attr("name").unwrap_or("?"), "parameter without a type");
            continue;
        };
        let transfer = p.attr("transfer-ownership").and_then(Transfer::parse);
        ty.transfer = transfer;
        let nullable = flag(p, "nullable") || flag(p, "allow-none");
        ty.nullable = nullable;

        params.push(Param {
            name: p.attr("name").unwrap_or_default().to_string(),
            ty,
            direction: match p.attr("direction") {
                Some("out") => Direction::Out,
                Some("inout") => Direction::InOut,
                _ => Direction::In,
            },
            nullable,
            optional: flag(p, "optional"),
            caller_allocates: flag(p, "caller-allocates"),
            closure: index_attr(p, "closure"),
            destroy: index_attr(p, "destroy"),
            transfer,
            is_varargs: false,
        });
    }
    params
}

/// Build a [`TypeNode`] from the `<type>` or `<array>` child of a
/// parameter/return-value/field element.
fn collect_type(parent: &XmlNode) -> Option<TypeNode> {
    if let Some(array) = parent.child("array") {
        return Some(collect_array(array));
    }
    let ty = parent.child("type")?;
    Some(collect_type_element(ty))
}

fn collect_type_element(ty: &XmlNode) -> TypeNode {
    let name = ty.attr("name").map(str::to_string);
    let c_type = ty.attr("c:type").map(str::to_string);

    match name.as_deref() {
        Some("GLib.List") | Some("GLib.SList") => TypeNode {
            name,
            c_type,
            is_array: true,
            is_list: true,
            element: ty.child("type").map(|e| Box::new(collect_type_element(e))),
            ..TypeNode::default()
        },
        Some("GLib.HashTable") => {
            let mut inner = ty.children_named("type");
            let key = inner.next().map(|k| Box::new(collect_type_element(k)));
            let value = inner.next().map(|v| Box::new(collect_type_element(v)));
            TypeNode {
                name,
                c_type,
                is_hash_table: true,
                key,
                value,
                ..TypeNode::default()
            }
        }
        Some("GLib.Array") | Some("GLib.ByteArray") => TypeNode {
            name,
            c_type,
            is_g_array: true,
            element: ty.child("type").map(|e| Box::new(collect_type_element(e))),
            ..TypeNode::default()
        },
        Some("GLib.PtrArray") => TypeNode {
            name,
            c_type,
            is_ptr_array: true,
            element: ty.child("type").map(|e| Box::new(collect_type_element(e))),
            ..TypeNode::default()
        },
        _ => TypeNode {
            name,
            c_type,
            ..TypeNode::default()
        },
    }
}

fn collect_array(array: &XmlNode) -> TypeNode {
    // `<array name="GLib.Array">` and `<array name="GLib.PtrArray">` are
    // container types; a plain `<array>` is a C array.
    let name = array.attr("name");
    let element = array
        .child("type")
        .map(collect_type_element)
        .or_else(|| array.child("array").map(collect_array))
        .map(Box::new);

    TypeNode {
        name: name.map(str::to_string),
        c_type: array.attr("c:type").map(str::to_string),
        is_array: true,
        is_g_array: matches!(name, Some("GLib.Array") | Some("GLib.ByteArray")),
        is_ptr_array: name == Some("GLib.PtrArray"),
        element,
        length_param: index_attr(array, "length"),
        fixed_size: index_attr(array, "fixed-size"),
        zero_terminated: array.attr("zero-terminated") == Some("1"),
        ..TypeNode::default()
    }
}

fn flag(node: &XmlNode, key: &str) -> bool {
    node.attr(key) == Some("1")
}

fn index_attr(node: &XmlNode, key: &str) -> Option<usize> {
    node.attr(key).and_then(|v| v.parse::<usize>().ok())
}
