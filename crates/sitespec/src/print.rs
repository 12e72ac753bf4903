//! Text and JSON dumps of the syntax tree and the IR.
//!
//! The text dumps are indented trees, two spaces per level, meant for
//! reading and for snapshot-style assertions. The JSON dump serializes the
//! IR as-is.

use std::fmt::Display;

use sitespec_core::semantic::{
    AttrValue, Attributes, MenuEntry, Method, MethodFlags, SiteSpec, Topic, Type,
};
use sitespec_parser::parser_types::{
    AstNode, MenuEntryNode, MethodNode, SiteAst, TopicNode, TypeExpr,
};

/// Collects indented lines.
#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn line(&mut self, depth: usize, text: impl Display) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.push_str(&text.to_string());
        self.out.push('\n');
    }

    fn attributes(&mut self, depth: usize, attrs: &Attributes) {
        for (key, value) in attrs {
            match value {
                AttrValue::Text(text) => self.line(depth, format_args!("{key}: {text}")),
                AttrValue::Nested(nested) => {
                    self.line(depth, format_args!("{key}:"));
                    self.attributes(depth + 1, nested);
                }
            }
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

fn flag_names(flags: &MethodFlags) -> Vec<&'static str> {
    [
        (flags.is_static, "static"),
        (flags.is_static_embed, "static_embed"),
        (flags.is_socket, "socket"),
        (flags.is_sse, "sse"),
        (flags.is_video_stream, "video"),
        (flags.is_audio_stream, "audio"),
        (flags.is_upload_file, "upload_file"),
        (flags.is_pub_sub, "pub_sub"),
        (flags.returns_partial, "partial"),
        (flags.returns_json, "json"),
        (flags.is_full_html_page, "full_page"),
        (flags.no_output, "no_output"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect()
}

fn arrow(initiated_by_client: bool) -> &'static str {
    if initiated_by_client { ">>" } else { "<<" }
}

// ============================================================================
// Syntax tree
// ============================================================================

/// Render a syntax tree as an indented text tree.
///
/// Every node is printed as `kind name` followed by its attribute block.
pub fn print_ast(ast: &SiteAst) -> String {
    let mut p = Printer::default();
    p.line(0, "ast");

    for node in &ast.structs {
        print_node(&mut p, 1, node);
        for field in &node.fields {
            let line = format!("{} {} {}", field.name, field.type_name, field.tags);
            p.line(2, line.trim_end());
        }
    }

    for module in &ast.modules {
        print_node(&mut p, 1, module);
    }

    for server in &ast.servers {
        print_node(&mut p, 1, server);
        for service in &server.services {
            print_node(&mut p, 2, service);
            for handler in &service.handlers {
                print_node(&mut p, 3, handler);
                for method in &handler.methods {
                    print_method_node(&mut p, 4, method);
                }
            }
        }
    }

    for (name, entries) in &ast.menus {
        p.line(1, format_args!("menu {name}"));
        for entry in entries {
            print_menu_node(&mut p, 2, entry);
        }
    }

    p.finish()
}

fn print_node(p: &mut Printer, depth: usize, node: &impl AstNode) {
    let header = format!("{} {}", node.kind(), node.name());
    p.line(depth, header.trim_end());
    if let Some(attrs) = node.attrs() {
        p.attributes(depth + 1, attrs);
    }
}

fn type_expr(expr: Option<&TypeExpr>) -> String {
    expr.map(ToString::to_string).unwrap_or_default()
}

fn print_method_node(p: &mut Printer, depth: usize, method: &MethodNode) {
    let mut line = format!("{} {}", method.method, method.route);
    if let Some(rewrite) = &method.static_route_rewrite {
        line.push_str(&format!(" -> {rewrite}"));
    }
    if let Some(request) = &method.request_type {
        line.push_str(&format!(" ({request})"));
    }
    if let Some(response) = &method.response_type {
        line.push_str(&format!(" returns ({response})"));
    }
    let flags = flag_names(&method.flags);
    if !flags.is_empty() {
        line.push_str(&format!(" [{}]", flags.join(", ")));
    }
    p.line(depth, line);

    if let Some(page) = &method.page {
        print_node(p, depth + 1, page);
    }
    if let Some(doc) = &method.doc {
        print_node(p, depth + 1, doc);
    }
    if let Some(socket) = &method.socket {
        for topic in &socket.topics {
            print_topic_node(p, depth + 1, topic);
        }
    }
    if let Some(pub_sub) = &method.pub_sub {
        print_topic_node(p, depth + 1, &pub_sub.topic);
    }
}

fn print_topic_node(p: &mut Printer, depth: usize, topic: &TopicNode) {
    p.line(
        depth,
        format_args!(
            "topic {} {} ({}) ({}) reply `{}`",
            arrow(topic.initiated_by_client),
            topic.topic,
            type_expr(topic.request_type.as_ref()),
            type_expr(topic.response_type.as_ref()),
            topic.response_topic,
        ),
    );
}

fn print_menu_node(p: &mut Printer, depth: usize, entry: &MenuEntryNode) {
    p.line(
        depth,
        format_args!(
            "{} \"{}\" weight {} parent `{}`",
            entry.url, entry.title, entry.weight, entry.parent
        ),
    );
}

// ============================================================================
// IR
// ============================================================================

/// Render a site spec as an indented text tree.
///
/// Methods show their full route, their request-type category and their
/// resolved payload types; menus are printed as linked trees.
pub fn print_spec(spec: &SiteSpec) -> String {
    let mut p = Printer::default();
    p.line(0, format_args!("site {}", spec.name()));

    if !spec.types().is_empty() {
        p.line(1, "types");
        for ty in spec.types() {
            print_type(&mut p, 2, ty);
        }
    }

    if !spec.modules().is_empty() {
        p.line(1, "modules");
        for module in spec.modules() {
            p.line(
                2,
                format_args!(
                    "{} source `{}` prefix `{}`",
                    module.name(),
                    module.source(),
                    module.prefix()
                ),
            );
        }
    }

    for server in spec.servers() {
        let mut header = format!("server prefix `{}`", server.prefix());
        if !server.jwt().is_empty() {
            header.push_str(&format!(" jwt `{}`", server.jwt()));
        }
        let middlewares = server.middlewares();
        if !middlewares.is_empty() {
            header.push_str(&format!(" middlewares [{}]", middlewares.join(", ")));
        }
        p.line(1, header);

        for service in server.services() {
            p.line(2, format_args!("service {}", service.name()));
            for handler in service.handlers() {
                p.line(3, format_args!("handler {}", handler.name()));
                for method in handler.methods() {
                    print_method(&mut p, 4, method);
                }
            }
        }
    }

    if !spec.menus().is_empty() {
        p.line(1, "menus");
        for (name, entries) in spec.menus() {
            p.line(2, name);
            print_menu(&mut p, 3, entries);
        }
    }

    p.finish()
}

fn print_type(p: &mut Printer, depth: usize, ty: &Type) {
    let kind = match ty {
        Type::Primitive(_) => "primitive",
        Type::Struct(_) => "struct",
        Type::Array(_) => "array",
        Type::Map(_) => "map",
        Type::Pointer(_) => "pointer",
        Type::Interface(_) => "interface",
    };
    p.line(depth, format_args!("{kind} {}", ty.name()));
    for field in ty.fields() {
        let line = format!("{} {} {}", field.name, field.type_name, field.tag);
        p.line(depth + 1, line.trim_end());
    }
}

fn print_method(p: &mut Printer, depth: usize, method: &Method) {
    p.line(
        depth,
        format_args!(
            "{} {}{} -> {}",
            method.method(),
            method.prefix(),
            method.route(),
            method.classify()
        ),
    );
    if let Some(rewrite) = method.static_route_rewrite() {
        p.line(depth + 1, format_args!("rewrite {rewrite}"));
    }
    if let Some(request) = method.request_type() {
        p.line(depth + 1, format_args!("request {request}"));
    }
    if let Some(response) = method.response_type() {
        p.line(depth + 1, format_args!("response {response}"));
    }
    let flags = flag_names(method.flags());
    if !flags.is_empty() {
        p.line(depth + 1, format_args!("flags {}", flags.join(", ")));
    }
    if let Some(page) = method.page() {
        p.line(depth + 1, "page");
        p.attributes(depth + 2, page.annotation().properties());
    }
    if let Some(doc) = method.doc() {
        p.line(depth + 1, "doc");
        p.attributes(depth + 2, doc.annotation().properties());
    }
    if let Some(socket) = method.socket() {
        for topic in socket.topics() {
            print_topic(p, depth + 1, topic);
        }
    }
    if let Some(pub_sub) = method.pub_sub() {
        print_topic(p, depth + 1, pub_sub.topic());
    }
}

fn print_topic(p: &mut Printer, depth: usize, topic: &Topic) {
    let name = |ty: Option<&Type>| ty.map(Type::name).unwrap_or_default();
    let mut line = format!(
        "topic {} {} ({}) ({})",
        arrow(topic.initiated_by_client()),
        topic.topic(),
        name(topic.request_type()),
        name(topic.response_type()),
    );
    if !topic.response_topic().is_empty() {
        line.push_str(&format!(" reply `{}`", topic.response_topic()));
    }
    p.line(depth, line);
}

fn print_menu(p: &mut Printer, depth: usize, entries: &[MenuEntry]) {
    let mut stack: Vec<(&MenuEntry, usize)> = entries.iter().rev().map(|e| (e, depth)).collect();
    while let Some((entry, level)) = stack.pop() {
        p.line(
            level,
            format_args!("{} \"{}\" weight {}", entry.url, entry.title, entry.weight),
        );
        stack.extend(entry.children.iter().rev().map(|child| (child, level + 1)));
    }
}

/// Serialize a site spec as pretty-printed JSON.
///
/// # Errors
///
/// Returns the serializer error; the IR contains only maps with string keys
/// so this does not happen in practice.
pub fn to_json(spec: &SiteSpec) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(spec)
}
