//! Recursive-descent parser for site spec tokens.
//!
//! The parser keeps the current token and one token of lookahead. Every
//! `parse_*` method starts on the first token of its construct and returns
//! with `cur` on the first token after it. The first syntax error aborts
//! parsing; non-fatal findings are emitted to the [`DiagnosticCollector`].
//!
//! The public entry point is [`build_site`].

use std::collections::HashSet;

use log::{debug, trace};

use sitespec_core::semantic::{AttrValue, Attributes, HttpMethod, MethodFlags, ROUTE_PREFIX_KEY};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
    lexer::Lexer,
    parser_types::{
        DocNode, HandlerNode, MenuEntryNode, MethodNode, ModuleNode, PageNode, PubSubNode,
        ServerNode, ServiceNode, SiteAst, SocketNode, StructField, StructNode, TopicNode,
        TypeExpr,
    },
    signature::{Word, parse_group_type, split_words},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Parse resolved source text into a [`SiteAst`].
pub(crate) fn build_site(text: &str, collector: &mut DiagnosticCollector) -> Result<SiteAst> {
    Parser::new(text, collector)?.parse_site()
}

/// A menu entry waiting for the method it describes.
type PendingMenus = Vec<(String, MenuEntryNode)>;

struct Parser<'src, 'c> {
    lexer: Lexer<'src>,
    cur: PositionedToken<'src>,
    peek: PositionedToken<'src>,
    ast: SiteAst,
    collector: &'c mut DiagnosticCollector,
}

impl<'src, 'c> Parser<'src, 'c> {
    fn new(text: &'src str, collector: &'c mut DiagnosticCollector) -> Result<Self> {
        let mut lexer = Lexer::new(text);
        let cur = lexer.next_token()?;
        let peek = lexer.next_token()?;
        Ok(Self {
            lexer,
            cur,
            peek,
            ast: SiteAst::default(),
            collector,
        })
    }

    fn advance(&mut self) -> Result<()> {
        let next = self.lexer.next_token()?;
        self.cur = std::mem::replace(&mut self.peek, next);
        Ok(())
    }

    fn parse_site(mut self) -> Result<SiteAst> {
        loop {
            match self.cur.token {
                Token::Eof => break,
                Token::Type => {
                    let node = self.parse_struct()?;
                    self.ast.structs.push(node);
                }
                Token::Server => {
                    let node = self.parse_server()?;
                    self.ast.servers.push(node);
                }
                Token::Module => {
                    let node = self.parse_module()?;
                    self.ast.modules.push(node);
                }
                Token::Import => {
                    self.collector.emit(
                        Diagnostic::warning(format!("`{}` was not resolved", self.cur.line))
                            .with_code(ErrorCode::E205)
                            .with_label(self.cur.span, "import skipped")
                            .with_help(
                                "imports are resolved when loading from a file and must name an `.api` file",
                            ),
                    );
                    self.advance()?;
                }
                _ => {
                    trace!(line = self.cur.line; "Skipping top-level line");
                    self.advance()?;
                }
            }
        }

        debug!(
            structs = self.ast.structs.len(),
            servers = self.ast.servers.len(),
            modules = self.ast.modules.len(),
            menus = self.ast.menus.len();
            "Parsed site"
        );
        Ok(self.ast)
    }

    // =========================================================================
    // Error helpers
    // =========================================================================

    fn unexpected(&self, expected: &str) -> Diagnostic {
        let token = self.cur;
        let code = if token.token == Token::Eof {
            ErrorCode::E101
        } else {
            ErrorCode::E100
        };
        Diagnostic::error(format!("unexpected {token}, expected {expected}"))
            .with_code(code)
            .with_label(token.span, "unexpected here")
    }

    fn unclosed(&self, opener: &PositionedToken<'_>, what: &str) -> Diagnostic {
        Diagnostic::error(format!("{what} is never closed"))
            .with_code(ErrorCode::E101)
            .with_label(self.cur.span, "input ends here")
            .with_secondary_label(opener.span, "opened here")
    }

    /// Step past a block opener: either the current line ends with it, or the
    /// next line is exactly the opener.
    fn enter_block(&mut self, open: Token, what: &str) -> Result<()> {
        let opener = self.cur;
        let ch = if open == Token::LeftBrace { '{' } else { '(' };
        if opener.line.ends_with(ch) {
            return self.advance();
        }
        if self.peek.token == open {
            self.advance()?;
            return self.advance();
        }
        Err(Diagnostic::error(format!("expected `{ch}` to open {what}"))
            .with_code(ErrorCode::E100)
            .with_label(opener.span, format!("missing `{ch}`"))
            .with_help(format!("end the line with `{ch}`")))
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn parse_struct(&mut self) -> Result<StructNode> {
        let token = self.cur;
        // `type Foo {}` and `type Foo { Name string; Age int }` fit on one line.
        let (name, inline_body) = match token
            .literal
            .strip_suffix('}')
            .and_then(|rest| rest.split_once('{'))
        {
            Some((name, body)) => (name.trim(), Some(body)),
            None => (token.literal, None),
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(Diagnostic::error("expected a single type name after `type`")
                .with_code(ErrorCode::E100)
                .with_label(token.span, "invalid type declaration"));
        }

        let mut fields = Vec::new();
        let mut span = token.span;
        if let Some(body) = inline_body {
            fields.extend(
                body.split(';')
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(parse_field),
            );
            self.advance()?;
        } else {
            let what = format!("type `{name}`");
            self.enter_block(Token::LeftBrace, &what)?;
            loop {
                match self.cur.token {
                    Token::RightBrace => {
                        span = span.union(self.cur.span);
                        self.advance()?;
                        break;
                    }
                    Token::Eof => return Err(self.unclosed(&token, &what)),
                    Token::LeftBrace | Token::LeftParen | Token::RightParen => {
                        return Err(self.unexpected("a field or `}`"));
                    }
                    _ => {
                        fields.push(parse_field(self.cur.line));
                        self.advance()?;
                    }
                }
            }
        }

        Ok(StructNode {
            name: name.to_string(),
            fields,
            span,
        })
    }

    // =========================================================================
    // Attribute blocks
    // =========================================================================

    /// Parse the block of an `@server`, `@page`, `@doc`, `@menus` or `@module` line.
    fn parse_annotation_block(&mut self) -> Result<Attributes> {
        let token = self.cur;
        if !token.literal.is_empty() {
            return Err(Diagnostic::error(format!(
                "unexpected `{}` after `{}`",
                token.literal, token.token
            ))
            .with_code(ErrorCode::E100)
            .with_label(token.span, "attributes must start on the next line")
            .with_help(format!(
                "write `{}(` and put each attribute on its own line",
                token.token
            )));
        }
        self.parse_attributes()
    }

    /// Parse `key: value` and nested `key (` lines up to the closing `)`.
    fn parse_attributes(&mut self) -> Result<Attributes> {
        let opener = self.cur;
        self.enter_block(Token::LeftParen, "an attribute block")?;

        let mut attrs = Attributes::new();
        loop {
            let token = self.cur;
            match token.token {
                Token::RightParen => {
                    self.advance()?;
                    return Ok(attrs);
                }
                Token::Eof => return Err(self.unclosed(&opener, "attribute block")),
                _ => {}
            }

            if let Some((key, value)) = split_attribute(token.line) {
                attrs.insert(key.to_string(), AttrValue::Text(unquote(value).to_string()));
                self.advance()?;
            } else if let Some(key) = nested_key(token.line) {
                let nested = self.parse_attributes()?;
                attrs.insert(key.to_string(), AttrValue::Nested(nested));
            } else {
                return Err(self
                    .unexpected("`key: value`, `name (` or `)`")
                    .with_help("attribute values go on one line as `key: value`"));
            }
        }
    }

    // =========================================================================
    // Servers
    // =========================================================================

    fn parse_server(&mut self) -> Result<ServerNode> {
        let token = self.cur;
        let attrs = self.parse_annotation_block()?;
        let prefix = attrs
            .get(ROUTE_PREFIX_KEY)
            .and_then(AttrValue::as_text)
            .unwrap_or_default()
            .to_string();

        let mut services = Vec::new();
        if self.cur.token == Token::LeftBrace {
            let opener = self.cur;
            self.advance()?;
            loop {
                match self.cur.token {
                    Token::Service => services.push(self.parse_service(&prefix)?),
                    Token::RightBrace => {
                        self.advance()?;
                        break;
                    }
                    Token::Eof => return Err(self.unclosed(&opener, "server block")),
                    _ => return Err(self.unexpected("`service` or `}`")),
                }
            }
        } else {
            while self.cur.token == Token::Service {
                services.push(self.parse_service(&prefix)?);
            }
        }

        if services.is_empty() {
            return Err(Diagnostic::error("server declares no services")
                .with_code(ErrorCode::E100)
                .with_label(token.span, "server declared here")
                .with_help("follow the `@server` block with `service name {`"));
        }

        trace!(prefix = prefix.as_str(), services = services.len(); "Parsed server");
        Ok(ServerNode {
            attrs,
            services,
            span: token.span,
        })
    }

    fn parse_service(&mut self, prefix: &str) -> Result<ServiceNode> {
        let token = self.cur;
        let name = token.literal;
        if name.is_empty() {
            return Err(Diagnostic::error("expected a service name after `service`")
                .with_code(ErrorCode::E100)
                .with_label(token.span, "unnamed service"));
        }

        let what = format!("service `{name}`");
        self.enter_block(Token::LeftBrace, &what)?;

        let mut handlers = Vec::new();
        loop {
            match self.cur.token {
                Token::Handler => handlers.push(self.parse_handler(prefix)?),
                Token::RightBrace => {
                    self.advance()?;
                    break;
                }
                Token::Eof => return Err(self.unclosed(&token, &what)),
                _ => return Err(self.unexpected("`@handler` or `}`")),
            }
        }

        Ok(ServiceNode {
            name: name.to_string(),
            handlers,
            span: token.span,
        })
    }

    fn parse_handler(&mut self, prefix: &str) -> Result<HandlerNode> {
        let token = self.cur;
        let name = token.literal;
        if name.is_empty() {
            return Err(Diagnostic::error("expected a handler name after `@handler`")
                .with_code(ErrorCode::E100)
                .with_label(token.span, "unnamed handler"));
        }
        self.advance()?;

        let mut methods = Vec::new();
        let mut page = None;
        let mut doc = None;
        let mut menus: Option<PendingMenus> = None;
        let mut pending: Option<Span> = None;

        loop {
            let current = self.cur;
            match current.token {
                Token::Page => {
                    page = Some(PageNode {
                        attrs: self.parse_annotation_block()?,
                    });
                    pending.get_or_insert(current.span);
                }
                Token::Doc => {
                    doc = Some(DocNode {
                        attrs: self.parse_annotation_block()?,
                    });
                    pending.get_or_insert(current.span);
                }
                Token::Menus => {
                    menus = Some(self.parse_menus()?);
                    pending.get_or_insert(current.span);
                }
                t if t.is_method() => {
                    let method = self.parse_method(prefix, page.take(), doc.take())?;
                    if let Some(entries) = menus.take() {
                        self.attach_menu_entries(entries, &method);
                    }
                    pending = None;
                    methods.push(method);
                }
                _ => break,
            }
        }

        if let Some(span) = pending {
            self.collector.emit(
                Diagnostic::warning(format!(
                    "annotation in handler `{name}` is not followed by a method"
                ))
                .with_code(ErrorCode::E203)
                .with_label(span, "ignored")
                .with_secondary_label(token.span, "in this handler"),
            );
        }

        if methods.is_empty() {
            return Err(Diagnostic::error(format!("handler `{name}` declares no methods"))
                .with_code(ErrorCode::E100)
                .with_label(token.span, "handler declared here")
                .with_help("add a method line such as `get /path`"));
        }

        Ok(HandlerNode {
            name: name.to_string(),
            methods,
            span: token.span,
        })
    }

    // =========================================================================
    // Methods
    // =========================================================================

    fn parse_method(
        &mut self,
        prefix: &str,
        page: Option<PageNode>,
        doc: Option<DocNode>,
    ) -> Result<MethodNode> {
        let token = self.cur;
        let verb = match token.token {
            Token::Get => HttpMethod::Get,
            Token::Post => HttpMethod::Post,
            Token::Put => HttpMethod::Put,
            Token::Delete => HttpMethod::Delete,
            Token::Patch => HttpMethod::Patch,
            Token::Sub => HttpMethod::Sub,
            _ => return Err(self.unexpected("a method")),
        };

        let mut method = MethodNode::new(verb, token.span);
        method.prefix = prefix.to_string();
        method.page = page;
        method.doc = doc;

        if verb == HttpMethod::Sub {
            parse_sub_topic(&mut method, &token)?;
        } else {
            parse_signature(&mut method, &token)?;
        }
        self.advance()?;

        if method.flags.is_socket {
            self.parse_socket_topics(&mut method, &token)?;
        }

        classify_output(&mut method.flags, verb);
        trace!(method = verb.as_str(), route = method.route.as_str(); "Parsed method");
        Ok(method)
    }

    /// Parse the topic lines of a socket method up to its closing `)`.
    fn parse_socket_topics(
        &mut self,
        method: &mut MethodNode,
        opener: &PositionedToken<'_>,
    ) -> Result<()> {
        if !opener.line.ends_with('(') {
            if self.cur.token != Token::LeftParen {
                return Err(Diagnostic::error("socket method needs a topic block")
                    .with_code(ErrorCode::E104)
                    .with_label(opener.span, "no `(` after this line")
                    .with_help("end the line with `(` and list one topic per line"));
            }
            self.advance()?;
        }

        let mut topics = Vec::new();
        loop {
            let token = self.cur;
            match token.token {
                Token::RightParen => {
                    self.advance()?;
                    break;
                }
                Token::Eof => return Err(self.unclosed(opener, "socket topic block")),
                _ => {
                    topics.extend(parse_topic_line(token.line, token.span)?);
                    self.advance()?;
                }
            }
        }

        let mut seen = HashSet::new();
        let collector = &mut *self.collector;
        topics.retain(|topic: &TopicNode| {
            if seen.insert((topic.topic.clone(), topic.initiated_by_client)) {
                return true;
            }
            collector.emit(
                Diagnostic::warning(format!("duplicate socket topic `{}`", topic.topic))
                    .with_code(ErrorCode::E200)
                    .with_label(topic.span, "dropped"),
            );
            false
        });

        method.socket = Some(SocketNode {
            method: method.method,
            route: method.route.clone(),
            topics,
        });
        Ok(())
    }

    // =========================================================================
    // Menus and modules
    // =========================================================================

    fn parse_menus(&mut self) -> Result<PendingMenus> {
        let token = self.cur;
        let attrs = self.parse_annotation_block()?;

        let mut entries = Vec::new();
        for (name, value) in attrs {
            self.ast.menus.entry(name.clone()).or_default();
            let Some(fields) = value.as_nested() else {
                return Err(Diagnostic::error(format!("menu `{name}` must be a nested block"))
                    .with_code(ErrorCode::E106)
                    .with_label(token.span, "in this menu block")
                    .with_help(format!("write `{name} (` followed by one attribute per line")));
            };
            let entry = self.decode_menu_entry(&name, fields, token.span)?;
            entries.push((name, entry));
        }
        Ok(entries)
    }

    fn decode_menu_entry(
        &mut self,
        menu: &str,
        fields: &Attributes,
        span: Span,
    ) -> Result<MenuEntryNode> {
        let mut entry = MenuEntryNode {
            span,
            ..MenuEntryNode::default()
        };

        for (key, value) in fields {
            let text = || menu_text(menu, key, value, span);
            match key.as_str() {
                "title" => entry.title = text()?.to_string(),
                "icon" => entry.icon = text()?.to_string(),
                "url" => entry.url = text()?.to_string(),
                "subtitle" => entry.subtitle = text()?.to_string(),
                "mobileTitle" => entry.mobile_title = text()?.to_string(),
                "lead" => entry.lead = text()?.to_string(),
                "parent" => entry.parent = text()?.to_string(),
                "weight" => {
                    let raw = text()?;
                    entry.weight = raw.parse().map_err(|_| {
                        menu_error(menu, span, format!("`weight` must be an integer, got `{raw}`"))
                    })?;
                }
                "inMobile" => entry.in_mobile = menu_bool(menu, key, text()?, span)?,
                "isAtEnd" => entry.is_at_end = menu_bool(menu, key, text()?, span)?,
                "isDropdown" => entry.is_dropdown = menu_bool(menu, key, text()?, span)?,
                "hxDisable" => entry.hx_disable = menu_bool(menu, key, text()?, span)?,
                _ => self.collector.emit(
                    Diagnostic::warning(format!("unknown attribute `{key}` in menu `{menu}`"))
                        .with_code(ErrorCode::E204)
                        .with_label(span, "in this menu block"),
                ),
            }
        }
        Ok(entry)
    }

    /// Give pending menu entries the url of the method they annotate, and the
    /// page title when they have none, then file them under their menus.
    fn attach_menu_entries(&mut self, entries: PendingMenus, method: &MethodNode) {
        let url = format!("{}{}", method.prefix, method.route).replace("//", "/");
        let url = url.strip_suffix('/').unwrap_or(&url);
        let page_title = method
            .page
            .as_ref()
            .and_then(|page| page.attrs.get("title"))
            .and_then(AttrValue::as_text);

        for (name, mut entry) in entries {
            entry.url = url.to_string();
            if entry.title.is_empty() {
                entry.title = page_title.unwrap_or_default().to_string();
            }
            self.ast.menus.entry(name).or_default().push(entry);
        }
    }

    fn parse_module(&mut self) -> Result<ModuleNode> {
        let token = self.cur;
        let attrs = self.parse_annotation_block()?;

        let required = |key: &str| -> Result<String> {
            match attrs.get(key) {
                Some(AttrValue::Text(value)) => Ok(value.clone()),
                Some(AttrValue::Nested(_)) => Err(Diagnostic::error(format!(
                    "module attribute `{key}` must be a text value"
                ))
                .with_code(ErrorCode::E107)
                .with_label(token.span, "in this module block")),
                None => Err(Diagnostic::error(format!("module block is missing `{key}`"))
                    .with_code(ErrorCode::E107)
                    .with_label(token.span, "in this module block")
                    .with_help("modules require `name`, `source` and `prefix`")),
            }
        };
        let name = required("name")?;
        let source = required("source")?;
        let prefix = required("prefix")?;

        Ok(ModuleNode {
            name,
            source,
            prefix,
            attrs,
            span: token.span,
        })
    }
}

// =============================================================================
// Line-level helpers
// =============================================================================

/// `Name type tag...`; a single word is an embedded type.
fn parse_field(line: &str) -> StructField {
    let mut parts = line.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let type_name = parts.next().unwrap_or(name);
    StructField {
        name: name.to_string(),
        type_name: type_name.to_string(),
        tags: parts.collect::<Vec<_>>().join(" "),
    }
}

/// Split `key: value` at the first `:` outside quotes. Keys may contain
/// spaces, e.g. `og title: Home`.
fn split_attribute(line: &str) -> Option<(&str, &str)> {
    let mut quote = None;
    for (idx, c) in line.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '`') => quote = Some(c),
            (None, ':') => {
                let key = line[..idx].trim();
                if key.is_empty() {
                    return None;
                }
                return Some((key, line[idx + 1..].trim()));
            }
            (None, _) => {}
        }
    }
    None
}

/// The key of a nested block opener `key (`.
fn nested_key(line: &str) -> Option<&str> {
    line.strip_suffix('(')
        .map(str::trim)
        .filter(|key| !key.is_empty() && !key.contains(char::is_whitespace))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn menu_error(menu: &str, span: Span, message: String) -> Diagnostic {
    Diagnostic::error(format!("invalid menu `{menu}`: {message}"))
        .with_code(ErrorCode::E106)
        .with_label(span, "in this menu block")
}

fn menu_text<'a>(menu: &str, key: &str, value: &'a AttrValue, span: Span) -> Result<&'a str> {
    value
        .as_text()
        .ok_or_else(|| menu_error(menu, span, format!("`{key}` must be a text value")))
}

fn menu_bool(menu: &str, key: &str, raw: &str, span: Span) -> Result<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(menu_error(
            menu,
            span,
            format!("`{key}` must be a boolean, got `{raw}`"),
        )),
    }
}

// =============================================================================
// Method signatures
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Static,
    StaticEmbed,
    Socket,
    Sse,
    Video,
    Audio,
    File,
}

impl Modifier {
    fn parse(word: &str) -> Option<Self> {
        let modifier = match word.to_ascii_lowercase().as_str() {
            "static" => Modifier::Static,
            "static-embed" => Modifier::StaticEmbed,
            "socket" => Modifier::Socket,
            "sse" => Modifier::Sse,
            "video" => Modifier::Video,
            "audio" => Modifier::Audio,
            "file" => Modifier::File,
            _ => return None,
        };
        Some(modifier)
    }

    fn allows(self, verb: HttpMethod) -> bool {
        match self {
            Modifier::Sse => matches!(verb, HttpMethod::Get | HttpMethod::Post),
            Modifier::File => verb == HttpMethod::Post,
            _ => verb == HttpMethod::Get,
        }
    }

    fn usage(self) -> &'static str {
        match self {
            Modifier::Static | Modifier::StaticEmbed => {
                "static routes (`get static /path`) can only be used with GET"
            }
            Modifier::Socket => "socket routes (`get socket /path`) can only be used with GET",
            Modifier::Sse => "SSE routes (`get|post sse /path`) can only be used with GET or POST",
            Modifier::Video => "video routes (`get video /path`) can only be used with GET",
            Modifier::Audio => "audio routes (`get audio /path`) can only be used with GET",
            Modifier::File => "file routes (`post file /path`) can only be used with POST",
        }
    }

    fn apply(self, flags: &mut MethodFlags) {
        match self {
            Modifier::Static => flags.is_static = true,
            Modifier::StaticEmbed => {
                flags.is_static = true;
                flags.is_static_embed = true;
            }
            Modifier::Socket => flags.is_socket = true,
            Modifier::Sse => flags.is_sse = true,
            Modifier::Video => flags.is_video_stream = true,
            Modifier::Audio => flags.is_audio_stream = true,
            Modifier::File => flags.is_upload_file = true,
        }
    }
}

fn malformed_signature(token: &PositionedToken<'_>, message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(message)
        .with_code(ErrorCode::E103)
        .with_label(token.span, "in this method")
        .with_help("methods look like `get [modifier] /route [(Request)] [returns (Response)] [partial]`")
}

fn type_error(token: &PositionedToken<'_>, code: ErrorCode, message: String) -> Diagnostic {
    Diagnostic::error(message)
        .with_code(code)
        .with_label(token.span, "invalid type")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureState {
    Request,
    Response,
}

/// Walk `[modifier] route [(Request)] [returns] [(Response)] [partial]`.
fn parse_signature(method: &mut MethodNode, token: &PositionedToken<'_>) -> Result<()> {
    let words = split_words(token.literal).map_err(|msg| malformed_signature(token, msg))?;
    let mut words = words.into_iter().peekable();

    if let Some(modifier) = words
        .peek()
        .and_then(|word| word.as_bare())
        .and_then(Modifier::parse)
    {
        words.next();
        if !modifier.allows(method.method) {
            return Err(Diagnostic::error(modifier.usage())
                .with_code(ErrorCode::E102)
                .with_label(token.span, "invalid modifier for this method"));
        }
        modifier.apply(&mut method.flags);
    }

    match words.next() {
        Some(Word::Bare(route)) => method.route = route.to_string(),
        _ => return Err(malformed_signature(token, "method is missing a route")),
    }

    let mut state = SignatureState::Request;
    for word in words {
        match (state, word) {
            (_, Word::Bare(w)) if w.eq_ignore_ascii_case("partial") => {
                method.flags.returns_partial = true;
                state = SignatureState::Response;
            }
            (_, Word::Bare(w)) if w.eq_ignore_ascii_case("returns") => {
                state = SignatureState::Response;
            }
            (SignatureState::Request, Word::Bare(rewrite))
                if method.flags.is_static && method.static_route_rewrite.is_none() =>
            {
                method.static_route_rewrite = Some(rewrite.to_string());
            }
            (SignatureState::Request, Word::Group(group)) => {
                method.request_type = parse_group_type(group)
                    .map_err(|msg| type_error(token, ErrorCode::E103, msg))?;
                state = SignatureState::Response;
            }
            (SignatureState::Response, Word::Group(group)) => {
                if method.response_type.is_some() {
                    return Err(malformed_signature(token, "method has more than one response type"));
                }
                method.response_type = parse_group_type(group)
                    .map_err(|msg| type_error(token, ErrorCode::E103, msg))?;
                method.flags.returns_json |= method.response_type.is_some();
            }
            (_, Word::Bare(w)) => {
                return Err(malformed_signature(token, format!("unexpected `{w}` in method")));
            }
        }
    }
    Ok(())
}

/// `sub topic (Request)` or `sub topic (Request) pub topic (Response)`.
fn parse_sub_topic(method: &mut MethodNode, token: &PositionedToken<'_>) -> Result<()> {
    let malformed = |message: String| {
        Diagnostic::error(message)
            .with_code(ErrorCode::E105)
            .with_label(token.span, "in this topic")
            .with_help("write `sub topic (Request)` or `sub topic (Request) pub topic (Response)`")
    };

    let words = split_words(token.literal).map_err(malformed)?;
    let (topic, request, publish) = match words.as_slice() {
        [Word::Bare(topic), Word::Group(request)] => (*topic, *request, None),
        [
            Word::Bare(topic),
            Word::Group(request),
            Word::Bare(keyword),
            Word::Bare(publish),
            Word::Group(response),
        ] if *keyword == "pub" => (*topic, *request, Some((*publish, *response))),
        _ => return Err(malformed(format!("malformed topic `{}`", token.literal))),
    };

    let request_type = parse_group_type(request)
        .map_err(|msg| type_error(token, ErrorCode::E105, msg))?
        .ok_or_else(|| malformed(format!("topic `{topic}` needs a request type")))?;
    let (response_topic, response_type) = match publish {
        Some((publish, response)) => (
            publish,
            parse_group_type(response).map_err(|msg| type_error(token, ErrorCode::E105, msg))?,
        ),
        None => ("", None),
    };

    method.route = topic.to_string();
    method.flags.is_pub_sub = true;
    method.request_type = Some(request_type.clone());
    if response_type.is_some() {
        method.response_type = response_type.clone();
        method.flags.returns_json = true;
    }
    method.pub_sub = Some(PubSubNode {
        method: method.method,
        route: topic.to_string(),
        topic: TopicNode {
            topic: topic.to_string(),
            response_topic: response_topic.to_string(),
            initiated_by_client: true,
            request_type: Some(request_type),
            response_type,
            span: token.span,
        },
    });
    Ok(())
}

fn malformed_topic(span: Span, message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(message)
        .with_code(ErrorCode::E104)
        .with_label(span, "in this topic")
        .with_help("write `topic (Type) >>`, `<< topic (Type)` or `a (A) <<>> b (B)`")
}

/// `topic (Type)` on one side of a bidirectional topic line.
fn typed_topic(side: &str, span: Span) -> Result<(String, Option<TypeExpr>)> {
    let words = split_words(side).map_err(|msg| malformed_topic(span, msg))?;
    match words.as_slice() {
        [Word::Bare(topic), Word::Group(ty)] => {
            let ty = parse_group_type(ty).map_err(|msg| malformed_topic(span, msg))?;
            Ok((topic.to_string(), ty))
        }
        _ => Err(malformed_topic(
            span,
            format!("expected `topic (Type)`, got `{}`", side.trim()),
        )),
    }
}

/// Parse one socket topic line into one topic, or two for `<<>>`.
fn parse_topic_line(line: &str, span: Span) -> Result<Vec<TopicNode>> {
    if let Some((client, server)) = line.split_once("<<>>") {
        let (client_topic, client_type) = typed_topic(client, span)?;
        let (server_topic, server_type) = typed_topic(server, span)?;
        return Ok(vec![
            TopicNode {
                topic: client_topic,
                response_topic: server_topic.clone(),
                initiated_by_client: true,
                request_type: client_type.clone(),
                response_type: server_type.clone(),
                span,
            },
            TopicNode {
                topic: server_topic,
                response_topic: String::new(),
                initiated_by_client: false,
                request_type: server_type,
                response_type: client_type,
                span,
            },
        ]);
    }

    let initiated_by_client = line.contains(">>");
    if !initiated_by_client && !line.contains("<<") {
        return Err(malformed_topic(
            span,
            format!("topic `{line}` has no direction"),
        ));
    }

    let stripped = line.replace(">>", " ").replace("<<", " ");
    let words = split_words(&stripped).map_err(|msg| malformed_topic(span, msg))?;
    let (topic, groups) = match words.split_first() {
        Some((Word::Bare(topic), rest)) if rest.len() <= 2 => (*topic, rest),
        _ => {
            return Err(malformed_topic(
                span,
                format!("expected `topic [(Request)] [(Response)]`, got `{}`", line),
            ));
        }
    };

    let mut types = Vec::with_capacity(2);
    for group in groups {
        let Word::Group(ty) = group else {
            return Err(malformed_topic(
                span,
                format!("unexpected `{}` in topic", group.as_bare().unwrap_or_default()),
            ));
        };
        types.push(parse_group_type(ty).map_err(|msg| malformed_topic(span, msg))?);
    }
    let mut types = types.into_iter();

    Ok(vec![TopicNode {
        topic: topic.to_string(),
        response_topic: topic.to_string(),
        initiated_by_client,
        request_type: types.next().flatten(),
        response_type: types.next().flatten(),
        span,
    }])
}

/// Derive the full-page and no-output flags from the others.
fn classify_output(flags: &mut MethodFlags, verb: HttpMethod) {
    let is_get = verb == HttpMethod::Get;
    let streams = flags.is_socket || flags.is_sse || flags.is_video_stream || flags.is_audio_stream;

    if is_get && !streams && !flags.returns_json && !flags.is_pub_sub {
        flags.is_full_html_page = true;
    }
    if is_get && flags.returns_partial {
        flags.is_full_html_page = true;
    }
    if !flags.is_full_html_page
        && !flags.returns_partial
        && !flags.returns_json
        && !flags.is_pub_sub
        && !streams
    {
        flags.no_output = true;
    }
}
