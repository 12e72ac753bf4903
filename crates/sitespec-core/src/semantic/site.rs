//! Site structure types.
//!
//! This module contains the building blocks of the site model:
//! - [`SiteSpec`] - The root type holding types, servers, modules and menus
//! - [`Server`] / [`Service`] / [`Handler`] / [`Method`] - The endpoint tree
//! - [`SocketNode`] / [`PubSubNode`] / [`Topic`] - Websocket and pub-sub channels
//! - [`Annotation`] - Free-form attribute bags attached to servers, pages and docs

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::semantic::{menu::MenuEntry, request_type::RequestType, types::Type};

/// Ordered attribute map as written in the source.
pub type Attributes = IndexMap<String, AttrValue>;

/// Annotation key holding a server's route prefix.
pub const ROUTE_PREFIX_KEY: &str = "prefix";

/// An attribute value: either text or a nested attribute block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Nested(Attributes),
}

impl AttrValue {
    /// Borrow the text value, if this is a text attribute.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            AttrValue::Nested(_) => None,
        }
    }

    /// Borrow the nested block, if this is a nested attribute.
    pub fn as_nested(&self) -> Option<&Attributes> {
        match self {
            AttrValue::Text(_) => None,
            AttrValue::Nested(attrs) => Some(attrs),
        }
    }
}

/// Key/value properties attached to a server, page or doc block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Annotation {
    properties: Attributes,
}

impl Annotation {
    /// Create an annotation from its properties.
    pub fn new(properties: Attributes) -> Self {
        Self { properties }
    }

    /// Borrow all properties.
    pub fn properties(&self) -> &Attributes {
        &self.properties
    }

    /// Get a text property, or `""` if absent or not text.
    pub fn get(&self, key: &str) -> &str {
        self.properties
            .get(key)
            .and_then(AttrValue::as_text)
            .unwrap_or_default()
    }

    /// Get a raw property value.
    pub fn value(&self, key: &str) -> Option<&AttrValue> {
        self.properties.get(key)
    }
}

/// The verb of a method line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    /// A pub-sub subscription (`sub topic (Type)`).
    Sub,
}

impl HttpMethod {
    /// The upper-case name, e.g. `GET`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Sub => "SUB",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transport and output flags of a method.
///
/// Set by the parser from the method's modifier, payload types and the
/// output classification rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MethodFlags {
    pub is_static: bool,
    pub is_static_embed: bool,
    pub is_socket: bool,
    pub is_sse: bool,
    pub is_video_stream: bool,
    pub is_audio_stream: bool,
    pub is_upload_file: bool,
    pub is_pub_sub: bool,
    pub returns_partial: bool,
    pub returns_json: bool,
    pub is_full_html_page: bool,
    pub no_output: bool,
}

/// The root of the IR.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteSpec {
    name: String,
    types: Vec<Type>,
    servers: Vec<Server>,
    modules: Vec<Module>,
    menus: IndexMap<String, Vec<MenuEntry>>,
}

impl SiteSpec {
    /// Create a new site spec.
    pub fn new(
        name: impl Into<String>,
        types: Vec<Type>,
        servers: Vec<Server>,
        modules: Vec<Module>,
        menus: IndexMap<String, Vec<MenuEntry>>,
    ) -> Self {
        Self {
            name: name.into(),
            types,
            servers,
            modules,
            menus,
        }
    }

    /// Get the site name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the declared types in declaration order.
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    /// Find a declared type by name.
    pub fn find_type(&self, name: &str) -> Option<&Type> {
        self.types.iter().find(|t| t.name() == name)
    }

    /// Borrow the servers.
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// Borrow the external modules.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Borrow the named menus; each holds only its top-level entries.
    pub fn menus(&self) -> &IndexMap<String, Vec<MenuEntry>> {
        &self.menus
    }

    /// Iterate over every method of every server.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.servers
            .iter()
            .flat_map(|server| server.services())
            .flat_map(|service| service.handlers())
            .flat_map(|handler| handler.methods())
    }
}

/// An external module mounted under a route prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    name: String,
    source: String,
    prefix: String,
    attrs: Attributes,
}

impl Module {
    /// Create a new module.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        prefix: impl Into<String>,
        attrs: Attributes,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            prefix: prefix.into(),
            attrs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Borrow all attributes, including `name`, `source` and `prefix`.
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }
}

/// A deployment group of services sharing a prefix, auth and middleware.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Server {
    annotation: Annotation,
    services: Vec<Service>,
}

impl Server {
    /// Create a new server.
    pub fn new(annotation: Annotation, services: Vec<Service>) -> Self {
        Self {
            annotation,
            services,
        }
    }

    /// Borrow the server annotation.
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Get a text annotation, or `""` if absent or not text.
    pub fn get_annotation(&self, key: &str) -> &str {
        self.annotation.get(key)
    }

    /// The route prefix of every method in this server.
    pub fn prefix(&self) -> &str {
        self.annotation.get(ROUTE_PREFIX_KEY)
    }

    /// The JWT auth name, empty when the server is public.
    pub fn jwt(&self) -> &str {
        self.annotation.get("jwt")
    }

    /// Middleware names from the comma-separated `middleware` annotation.
    pub fn middlewares(&self) -> Vec<&str> {
        self.annotation
            .get("middleware")
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Borrow the services.
    pub fn services(&self) -> &[Service] {
        &self.services
    }
}

/// A named group of handlers.
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    name: String,
    handlers: Vec<Handler>,
}

impl Service {
    /// Create a new service.
    pub fn new(name: impl Into<String>, handlers: Vec<Handler>) -> Self {
        Self {
            name: name.into(),
            handlers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }
}

/// A named handler with one or more methods.
#[derive(Debug, Clone, Serialize)]
pub struct Handler {
    name: String,
    methods: Vec<Method>,
}

impl Handler {
    /// Create a new handler.
    pub fn new(name: impl Into<String>, methods: Vec<Method>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

/// A `@page` annotation block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Page {
    annotation: Annotation,
}

impl Page {
    pub fn new(annotation: Annotation) -> Self {
        Self { annotation }
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// The page title, or `""`.
    pub fn title(&self) -> &str {
        self.annotation.get("title")
    }
}

/// A `@doc` annotation block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Doc {
    annotation: Annotation,
}

impl Doc {
    pub fn new(annotation: Annotation) -> Self {
        Self { annotation }
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }
}

/// One endpoint: an HTTP route, a websocket, a stream or a pub-sub subscription.
///
/// Built with [`Method::new`] and the `with_*` setters.
#[derive(Debug, Clone, Serialize)]
pub struct Method {
    method: HttpMethod,
    prefix: String,
    route: String,
    static_route_rewrite: Option<String>,
    request_type: Option<Type>,
    response_type: Option<Type>,
    page: Option<Page>,
    doc: Option<Doc>,
    socket: Option<SocketNode>,
    pub_sub: Option<PubSubNode>,
    flags: MethodFlags,
}

impl Method {
    /// Create a method with no payload types and no flags set.
    pub fn new(method: HttpMethod, route: impl Into<String>) -> Self {
        Self {
            method,
            prefix: String::new(),
            route: route.into(),
            static_route_rewrite: None,
            request_type: None,
            response_type: None,
            page: None,
            doc: None,
            socket: None,
            pub_sub: None,
            flags: MethodFlags::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_static_route_rewrite(mut self, rewrite: Option<String>) -> Self {
        self.static_route_rewrite = rewrite;
        self
    }

    pub fn with_request_type(mut self, request_type: Option<Type>) -> Self {
        self.request_type = request_type;
        self
    }

    pub fn with_response_type(mut self, response_type: Option<Type>) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_page(mut self, page: Option<Page>) -> Self {
        self.page = page;
        self
    }

    pub fn with_doc(mut self, doc: Option<Doc>) -> Self {
        self.doc = doc;
        self
    }

    pub fn with_socket(mut self, socket: Option<SocketNode>) -> Self {
        self.socket = socket;
        self
    }

    pub fn with_pub_sub(mut self, pub_sub: Option<PubSubNode>) -> Self {
        self.pub_sub = pub_sub;
        self
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The route prefix of the enclosing server.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Rewrite target of a `static-embed` route.
    pub fn static_route_rewrite(&self) -> Option<&str> {
        self.static_route_rewrite.as_deref()
    }

    pub fn request_type(&self) -> Option<&Type> {
        self.request_type.as_ref()
    }

    pub fn response_type(&self) -> Option<&Type> {
        self.response_type.as_ref()
    }

    pub fn has_request_type(&self) -> bool {
        self.request_type.is_some()
    }

    pub fn has_response_type(&self) -> bool {
        self.response_type.is_some()
    }

    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    pub fn has_page(&self) -> bool {
        self.page.is_some()
    }

    pub fn doc(&self) -> Option<&Doc> {
        self.doc.as_ref()
    }

    pub fn socket(&self) -> Option<&SocketNode> {
        self.socket.as_ref()
    }

    pub fn pub_sub(&self) -> Option<&PubSubNode> {
        self.pub_sub.as_ref()
    }

    pub fn flags(&self) -> &MethodFlags {
        &self.flags
    }

    /// Classify this method for template selection.
    pub fn classify(&self) -> RequestType {
        crate::semantic::request_type::determine_request_type(self)
    }
}

/// The topics served by a websocket method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocketNode {
    method: HttpMethod,
    route: String,
    topics: Vec<Topic>,
}

impl SocketNode {
    pub fn new(method: HttpMethod, route: impl Into<String>, topics: Vec<Topic>) -> Self {
        Self {
            method,
            route: route.into(),
            topics,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Topics in declaration order, unique by `(topic, initiated_by_client)`.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

/// The single topic of a pub-sub method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PubSubNode {
    method: HttpMethod,
    route: String,
    topic: Topic,
}

impl PubSubNode {
    pub fn new(method: HttpMethod, route: impl Into<String>, topic: Topic) -> Self {
        Self {
            method,
            route: route.into(),
            topic,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

/// A named channel with a direction and optional payload types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    topic: String,
    response_topic: String,
    initiated_by_client: bool,
    request_type: Option<Type>,
    response_type: Option<Type>,
}

impl Topic {
    pub fn new(
        topic: impl Into<String>,
        response_topic: impl Into<String>,
        initiated_by_client: bool,
        request_type: Option<Type>,
        response_type: Option<Type>,
    ) -> Self {
        Self {
            topic: topic.into(),
            response_topic: response_topic.into(),
            initiated_by_client,
            request_type,
            response_type,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The topic answered on, empty when there is none.
    pub fn response_topic(&self) -> &str {
        &self.response_topic
    }

    pub fn initiated_by_client(&self) -> bool {
        self.initiated_by_client
    }

    pub fn request_type(&self) -> Option<&Type> {
        self.request_type.as_ref()
    }

    pub fn response_type(&self) -> Option<&Type> {
        self.response_type.as_ref()
    }
}
