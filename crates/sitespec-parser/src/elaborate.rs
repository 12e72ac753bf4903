//! Spec building for the site AST
//!
//! This module lowers the [`SiteAst`] into the [`SiteSpec`] IR: textual type
//! expressions are resolved against the declared structs, attribute maps are
//! wrapped as annotations and flat menu entries are linked into sorted trees.
//! Building never fails; questionable input is reported as warnings.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, info, trace};

use sitespec_core::semantic::{
    self, Annotation, Doc, Field, Handler, Method, MenuEntry, Module, Page, Server, Service,
    SiteSpec, Topic, Type, sort_menu,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    parser_types::{
        HandlerNode, MenuEntryNode, MethodNode, ServerNode, SiteAst, StructNode, TopicNode,
        TypeExpr,
    },
};

/// Configuration for building a site spec.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildConfig {
    /// Treat every warning as an error.
    pub strict: bool,
}

impl BuildConfig {
    /// Create a new BuildConfig.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }
}

pub(crate) struct Builder<'a> {
    collector: &'a mut DiagnosticCollector,
    /// Declared struct fields by struct name.
    structs: HashMap<String, Vec<Field>>,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(collector: &'a mut DiagnosticCollector) -> Self {
        Self {
            collector,
            structs: HashMap::new(),
        }
    }

    // ============================================================================
    // Main Entry Methods
    // ============================================================================

    pub(crate) fn build(mut self, name: &str, ast: &SiteAst) -> SiteSpec {
        debug!(name; "Building site spec");

        let types = ast
            .structs
            .iter()
            .map(|node| self.declare_struct(node))
            .collect();

        let servers = ast
            .servers
            .iter()
            .map(|server| self.build_server(server))
            .collect();

        let modules = ast
            .modules
            .iter()
            .map(|module| {
                Module::new(
                    module.name.as_str(),
                    module.source.as_str(),
                    module.prefix.as_str(),
                    module.attrs.clone(),
                )
            })
            .collect();

        let menus: IndexMap<String, Vec<MenuEntry>> = ast
            .menus
            .iter()
            .map(|(menu, entries)| (menu.clone(), self.link_menu(menu, entries)))
            .collect();

        let spec = SiteSpec::new(name, types, servers, modules, menus);
        info!(
            types = spec.types().len(),
            servers = spec.servers().len(),
            methods = spec.methods().count();
            "Site spec built"
        );
        spec
    }

    // ============================================================================
    // Types
    // ============================================================================

    fn declare_struct(&mut self, node: &StructNode) -> Type {
        let fields: Vec<Field> = node
            .fields
            .iter()
            .map(|field| Field::new(&field.name, &field.type_name, &field.tags))
            .collect();
        self.structs.insert(node.name.clone(), fields.clone());
        Type::structure(&node.name, fields)
    }

    /// Resolve a type expression; declared structs carry their fields.
    fn resolve(&self, expr: &TypeExpr) -> Type {
        match expr {
            TypeExpr::Named(name) => match self.structs.get(name) {
                Some(fields) => Type::structure(name, fields.clone()),
                None => Type::named(name),
            },
            TypeExpr::Array(value) => Type::array(self.resolve(value)),
            TypeExpr::Pointer(inner) => Type::pointer(self.resolve(inner)),
            TypeExpr::Map { key, value } => Type::map(key, self.resolve(value)),
        }
    }

    fn resolve_opt(&self, expr: Option<&TypeExpr>) -> Option<Type> {
        expr.map(|expr| self.resolve(expr))
    }

    // ============================================================================
    // Servers
    // ============================================================================

    fn build_server(&self, server: &ServerNode) -> Server {
        let services = server
            .services
            .iter()
            .map(|service| {
                let handlers = service
                    .handlers
                    .iter()
                    .map(|handler| self.build_handler(handler))
                    .collect();
                Service::new(&service.name, handlers)
            })
            .collect();
        Server::new(Annotation::new(server.attrs.clone()), services)
    }

    fn build_handler(&self, handler: &HandlerNode) -> Handler {
        let methods = handler
            .methods
            .iter()
            .map(|method| self.build_method(method))
            .collect();
        Handler::new(&handler.name, methods)
    }

    fn build_method(&self, node: &MethodNode) -> Method {
        trace!(route = node.route.as_str(); "Building method");

        let socket = node.socket.as_ref().map(|socket| {
            let topics = socket
                .topics
                .iter()
                .map(|topic| self.build_topic(topic))
                .collect();
            semantic::SocketNode::new(socket.method, &socket.route, topics)
        });
        let pub_sub = node.pub_sub.as_ref().map(|pub_sub| {
            semantic::PubSubNode::new(
                pub_sub.method,
                &pub_sub.route,
                self.build_topic(&pub_sub.topic),
            )
        });

        Method::new(node.method, &node.route)
            .with_prefix(&node.prefix)
            .with_static_route_rewrite(node.static_route_rewrite.clone())
            .with_request_type(self.resolve_opt(node.request_type.as_ref()))
            .with_response_type(self.resolve_opt(node.response_type.as_ref()))
            .with_page(
                node.page
                    .as_ref()
                    .map(|page| Page::new(Annotation::new(page.attrs.clone()))),
            )
            .with_doc(
                node.doc
                    .as_ref()
                    .map(|doc| Doc::new(Annotation::new(doc.attrs.clone()))),
            )
            .with_socket(socket)
            .with_pub_sub(pub_sub)
            .with_flags(node.flags)
    }

    fn build_topic(&self, topic: &TopicNode) -> Topic {
        Topic::new(
            &topic.topic,
            &topic.response_topic,
            topic.initiated_by_client,
            self.resolve_opt(topic.request_type.as_ref()),
            self.resolve_opt(topic.response_type.as_ref()),
        )
    }

    // ============================================================================
    // Menus
    // ============================================================================

    /// Link the flat entries of one menu into trees by `parent == url`.
    ///
    /// A later entry with the same url replaces an earlier one. Entries whose
    /// parent chain does not end at a top-level entry are dropped with a
    /// warning. Trees are assembled bottom-up with an explicit stack and
    /// sorted stably by weight.
    fn link_menu(&mut self, menu: &str, entries: &[MenuEntryNode]) -> Vec<MenuEntry> {
        let mut by_url: HashMap<&str, usize> = HashMap::new();
        let mut nodes: Vec<Option<MenuEntry>> = Vec::with_capacity(entries.len());

        for (idx, entry) in entries.iter().enumerate() {
            if let Some(previous) = by_url.insert(entry.url.as_str(), idx) {
                nodes[previous] = None;
                self.collector.emit(
                    Diagnostic::warning(format!(
                        "duplicate url `{}` in menu `{menu}`",
                        entry.url
                    ))
                    .with_code(ErrorCode::E202)
                    .with_label(entry.span, "this entry wins")
                    .with_secondary_label(entries[previous].span, "replaces this entry"),
                );
            }
            nodes.push(Some(lower_menu_entry(entry)));
        }

        let mut roots = Vec::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
        for (idx, entry) in entries.iter().enumerate() {
            if nodes[idx].is_none() {
                continue;
            }
            if entry.parent.is_empty() {
                roots.push(idx);
            } else if let Some(&parent) = by_url.get(entry.parent.as_str()) {
                children[parent].push(idx);
            }
        }

        // Post-order: a node is finished once all of its children are.
        let mut built: Vec<Option<MenuEntry>> = vec![None; entries.len()];
        let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&idx| (idx, false)).collect();
        while let Some((idx, expanded)) = stack.pop() {
            if expanded {
                if let Some(mut node) = nodes[idx].take() {
                    node.children = children[idx]
                        .iter()
                        .filter_map(|&child| built[child].take())
                        .collect();
                    built[idx] = Some(node);
                }
            } else {
                stack.push((idx, true));
                stack.extend(children[idx].iter().rev().map(|&child| (child, false)));
            }
        }

        for (idx, node) in nodes.iter().enumerate() {
            if node.is_none() {
                continue;
            }
            let entry = &entries[idx];
            let message = if by_url.contains_key(entry.parent.as_str()) {
                format!(
                    "menu entry `{}` in menu `{menu}` is not reachable from a top-level entry",
                    entry.url
                )
            } else {
                format!(
                    "menu entry `{}` in menu `{menu}` has unknown parent `{}`",
                    entry.url, entry.parent
                )
            };
            self.collector.emit(
                Diagnostic::warning(message)
                    .with_code(ErrorCode::E201)
                    .with_label(entry.span, "dropped from the menu")
                    .with_help(
                        "a menu url is the method's prefix and route without a trailing `/`, \
                         so the entry for route `/` has the empty url and cannot be a parent",
                    ),
            );
        }

        let mut linked: Vec<MenuEntry> = roots.iter().filter_map(|&idx| built[idx].take()).collect();
        sort_menu(&mut linked);
        linked
    }
}

fn lower_menu_entry(entry: &MenuEntryNode) -> MenuEntry {
    MenuEntry {
        title: entry.title.clone(),
        weight: entry.weight,
        icon: entry.icon.clone(),
        url: entry.url.clone(),
        subtitle: entry.subtitle.clone(),
        mobile_title: entry.mobile_title.clone(),
        lead: entry.lead.clone(),
        in_mobile: entry.in_mobile,
        is_at_end: entry.is_at_end,
        is_dropdown: entry.is_dropdown,
        hx_disable: entry.hx_disable,
        parent: entry.parent.clone(),
        children: Vec::new(),
    }
}
