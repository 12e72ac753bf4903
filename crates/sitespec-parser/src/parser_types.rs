//! AST produced by the parser.
//!
//! The AST mirrors the source closely: attribute blocks stay as ordered
//! maps, type expressions stay unresolved and menu entries stay flat. The
//! spec builder in [`elaborate`](super::elaborate) turns it into the
//! [`SiteSpec`](sitespec_core::semantic::SiteSpec) IR.

use std::fmt;

use indexmap::IndexMap;

use sitespec_core::semantic::{Attributes, HttpMethod, MethodFlags};

use crate::span::Span;

/// The kind of an AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Struct,
    Server,
    Service,
    Handler,
    Method,
    Socket,
    Topic,
    PubSub,
    Page,
    Doc,
    MenuEntry,
    Module,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Struct => "struct",
            NodeKind::Server => "server",
            NodeKind::Service => "service",
            NodeKind::Handler => "handler",
            NodeKind::Method => "method",
            NodeKind::Socket => "socket",
            NodeKind::Topic => "topic",
            NodeKind::PubSub => "pubsub",
            NodeKind::Page => "page",
            NodeKind::Doc => "doc",
            NodeKind::MenuEntry => "menu_entry",
            NodeKind::Module => "module",
        };
        write!(f, "{s}")
    }
}

/// Behaviour shared by all AST nodes.
pub trait AstNode {
    fn kind(&self) -> NodeKind;

    /// The node's name; empty for nodes without one.
    fn name(&self) -> &str;

    /// The node's attribute block, if it has one.
    fn attrs(&self) -> Option<&Attributes> {
        None
    }
}

/// The root of a parsed site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteAst {
    pub structs: Vec<StructNode>,
    pub servers: Vec<ServerNode>,
    /// Menu entries by menu name, in declaration order.
    pub menus: IndexMap<String, Vec<MenuEntryNode>>,
    pub modules: Vec<ModuleNode>,
}

/// An unresolved type expression: `[]T`, `*T`, `map[K]V` or a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    Array(Box<TypeExpr>),
    Pointer(Box<TypeExpr>),
    Map { key: String, value: Box<TypeExpr> },
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => write!(f, "{name}"),
            TypeExpr::Array(value) => write!(f, "[]{value}"),
            TypeExpr::Pointer(inner) => write!(f, "*{inner}"),
            TypeExpr::Map { key, value } => write!(f, "map[{key}]{value}"),
        }
    }
}

/// A `type Name { ... }` block.
#[derive(Debug, Clone, PartialEq)]
pub struct StructNode {
    pub name: String,
    pub fields: Vec<StructField>,
    pub span: Span,
}

impl AstNode for StructNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Struct
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub type_name: String,
    /// Everything after the type, joined by single spaces.
    pub tags: String,
}

/// An `@server(...)` block and the services under it.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerNode {
    pub attrs: Attributes,
    pub services: Vec<ServiceNode>,
    pub span: Span,
}

impl AstNode for ServerNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Server
    }

    fn name(&self) -> &str {
        ""
    }

    fn attrs(&self) -> Option<&Attributes> {
        Some(&self.attrs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceNode {
    pub name: String,
    pub handlers: Vec<HandlerNode>,
    pub span: Span,
}

impl AstNode for ServiceNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Service
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerNode {
    pub name: String,
    pub methods: Vec<MethodNode>,
    pub span: Span,
}

impl AstNode for HandlerNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Handler
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One route declaration such as `get /users (UserQuery) returns ([]User)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodNode {
    pub method: HttpMethod,
    /// Route prefix inherited from the server's `prefix` attribute.
    pub prefix: String,
    pub route: String,
    /// Rewrite target of a `static-embed` route.
    pub static_route_rewrite: Option<String>,
    pub request_type: Option<TypeExpr>,
    pub response_type: Option<TypeExpr>,
    pub page: Option<PageNode>,
    pub doc: Option<DocNode>,
    pub socket: Option<SocketNode>,
    pub pub_sub: Option<PubSubNode>,
    pub flags: MethodFlags,
    pub span: Span,
}

impl MethodNode {
    pub(crate) fn new(method: HttpMethod, span: Span) -> Self {
        Self {
            method,
            prefix: String::new(),
            route: String::new(),
            static_route_rewrite: None,
            request_type: None,
            response_type: None,
            page: None,
            doc: None,
            socket: None,
            pub_sub: None,
            flags: MethodFlags::default(),
            span,
        }
    }
}

impl AstNode for MethodNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Method
    }

    fn name(&self) -> &str {
        &self.route
    }
}

/// The topics of a `get socket /route ( ... )` method.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketNode {
    pub method: HttpMethod,
    pub route: String,
    pub topics: Vec<TopicNode>,
}

impl AstNode for SocketNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Socket
    }

    fn name(&self) -> &str {
        &self.route
    }
}

/// One socket topic.
///
/// `response_topic` is the topic the other side answers on, empty when no
/// answer is expected.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicNode {
    pub topic: String,
    pub response_topic: String,
    pub initiated_by_client: bool,
    pub request_type: Option<TypeExpr>,
    pub response_type: Option<TypeExpr>,
    pub span: Span,
}

impl AstNode for TopicNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Topic
    }

    fn name(&self) -> &str {
        &self.topic
    }
}

/// A `sub topic (Req) [pub topic (Resp)]` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct PubSubNode {
    pub method: HttpMethod,
    pub route: String,
    pub topic: TopicNode,
}

impl AstNode for PubSubNode {
    fn kind(&self) -> NodeKind {
        NodeKind::PubSub
    }

    fn name(&self) -> &str {
        &self.route
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageNode {
    pub attrs: Attributes,
}

impl AstNode for PageNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Page
    }

    fn name(&self) -> &str {
        ""
    }

    fn attrs(&self) -> Option<&Attributes> {
        Some(&self.attrs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocNode {
    pub attrs: Attributes,
}

impl AstNode for DocNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Doc
    }

    fn name(&self) -> &str {
        ""
    }

    fn attrs(&self) -> Option<&Attributes> {
        Some(&self.attrs)
    }
}

/// A flat menu entry, linked to its parent by url in the spec builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuEntryNode {
    pub title: String,
    pub weight: i64,
    pub icon: String,
    pub url: String,
    pub subtitle: String,
    pub mobile_title: String,
    pub lead: String,
    pub in_mobile: bool,
    pub is_at_end: bool,
    pub is_dropdown: bool,
    pub hx_disable: bool,
    pub parent: String,
    pub span: Span,
}

impl AstNode for MenuEntryNode {
    fn kind(&self) -> NodeKind {
        NodeKind::MenuEntry
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// An `@module(...)` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleNode {
    pub name: String,
    pub source: String,
    pub prefix: String,
    pub attrs: Attributes,
    pub span: Span,
}

impl AstNode for ModuleNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Module
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attrs(&self) -> Option<&Attributes> {
        Some(&self.attrs)
    }
}
