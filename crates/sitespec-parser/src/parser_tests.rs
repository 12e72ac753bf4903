//! Unit tests for the parser and spec builder
//!
//! These tests drive whole site spec snippets through the lexer, parser and
//! builder and check the resulting AST, IR and diagnostics.

use sitespec_core::semantic::{HttpMethod, RequestType, SiteSpec, Type};

use crate::{
    BuildConfig, Source,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser,
    parser_types::{SiteAst, TypeExpr},
};

/// Parse a snippet and return the AST with the collected warnings.
fn parse_site(text: &str) -> (SiteAst, Vec<Diagnostic>) {
    let source = Source::inline("site", text);
    let mut collector = DiagnosticCollector::new();
    let ast = parser::build_site(source.text(), &mut collector)
        .unwrap_or_else(|err| panic!("Expected parsing to succeed, but got error: {err}"));
    let warnings = collector.finish(false).expect("no errors were emitted");
    (ast, warnings)
}

/// Parse a snippet that must fail and return its first diagnostic.
fn parse_err(text: &str) -> Diagnostic {
    let source = Source::inline("site", text);
    let mut collector = DiagnosticCollector::new();
    match parser::build_site(source.text(), &mut collector) {
        Ok(ast) => panic!("Expected parsing to fail, but got {ast:?}"),
        Err(diagnostic) => diagnostic,
    }
}

fn build(text: &str) -> SiteSpec {
    crate::parse(&Source::inline("site", text), BuildConfig::default())
        .unwrap_or_else(|err| panic!("Expected build to succeed, but got error: {err}"))
}

fn build_strict(text: &str) -> Result<SiteSpec, ParseError> {
    crate::parse(&Source::inline("site", text), BuildConfig::new(true))
}

/// Wrap method lines in a server, service and handler.
fn handler(body: &str) -> String {
    format!("@server (\n)\nservice app {{\n@handler main\n{body}\n}}\n")
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
    diagnostics.iter().filter_map(Diagnostic::code).collect()
}

mod type_tests {
    use super::*;

    #[test]
    fn test_single_line_struct() {
        let spec = build("type Foo { Name string }");

        assert_eq!(spec.types().len(), 1);
        let ty = &spec.types()[0];
        assert!(matches!(ty, Type::Struct(_)));
        assert_eq!(ty.name(), "Foo");
        assert_eq!(ty.fields().len(), 1);
        assert_eq!(ty.fields()[0].name, "Name");
        assert_eq!(ty.fields()[0].type_name, "string");
    }

    #[test]
    fn test_multi_line_struct_with_tags() {
        let (ast, _) = parse_site(
            r#"
type User {
    Name string `json:"name"`
    Tags []string `json:"tags" form:"tags"`
    Base
}
"#,
        );

        let user = &ast.structs[0];
        assert_eq!(user.name, "User");
        assert_eq!(user.fields.len(), 3);
        assert_eq!(user.fields[1].type_name, "[]string");
        assert_eq!(user.fields[1].tags, r#"`json:"tags" form:"tags"`"#);
        assert_eq!(user.fields[2].name, "Base");
        assert_eq!(user.fields[2].type_name, "Base");
    }

    #[test]
    fn test_empty_struct_and_brace_on_next_line() {
        let (ast, _) = parse_site("type Empty {}\ntype Later\n{\nID int64\n}\n");

        assert_eq!(ast.structs.len(), 2);
        assert!(ast.structs[0].fields.is_empty());
        assert_eq!(ast.structs[1].fields[0].name, "ID");
    }

    #[test]
    fn test_unclosed_struct() {
        let diag = parse_err("type User {\nName string\n");

        assert_eq!(diag.code(), Some(ErrorCode::E101));
        assert_eq!(diag.labels().len(), 2);
    }

    #[test]
    fn test_method_types_resolve_declared_fields() {
        let spec = build(&format!(
            "type LoginRequest {{\nEmail string `form:\"email\"`\n}}\n{}",
            handler("post /login (LoginRequest)")
        ));

        let method = spec.methods().next().expect("one method");
        let request = method.request_type().expect("request type");
        assert_eq!(request.fields().len(), 1);
        assert_eq!(method.classify(), RequestType::FormSubmission);
    }

    #[test]
    fn test_wrapped_types_in_signature() {
        let (ast, _) = parse_site(&handler(
            "get /users (map[string]*Filter) returns ([]User)",
        ));

        let method = &ast.servers[0].services[0].handlers[0].methods[0];
        assert_eq!(
            method.request_type.as_ref().map(ToString::to_string).as_deref(),
            Some("map[string]*Filter")
        );
        assert_eq!(
            method.response_type,
            Some(TypeExpr::Array(Box::new(TypeExpr::Named("User".to_string()))))
        );
    }
}

mod server_tests {
    use super::*;

    #[test]
    fn test_server_attributes_and_prefix() {
        let (ast, _) = parse_site(
            r#"
@server (
    prefix: /api
    jwt: Auth
    middleware: "Log, Cors"
)
service app {
    @handler list
    get /items
}
"#,
        );

        let server = &ast.servers[0];
        assert_eq!(server.attrs.len(), 3);
        assert_eq!(
            server.attrs.get("middleware").and_then(|v| v.as_text()),
            Some("Log, Cors")
        );
        assert_eq!(server.services[0].handlers[0].methods[0].prefix, "/api");
    }

    #[test]
    fn test_server_brace_wrapped_services() {
        let (ast, _) = parse_site(
            "@server (\n)\n{\nservice a {\n@handler x\nget /x\n}\nservice b {\n@handler y\nget /y\n}\n}\n",
        );

        let names: Vec<_> = ast.servers[0]
            .services
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_server_without_services() {
        let diag = parse_err("@server (\n)\n");

        assert_eq!(diag.code(), Some(ErrorCode::E100));
    }

    #[test]
    fn test_unclosed_service() {
        let diag = parse_err("@server (\n)\nservice app {\n@handler x\nget /x\n");

        assert_eq!(diag.code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_handler_without_methods() {
        let diag = parse_err(&handler(""));

        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert!(diag.message().contains("declares no methods"));
    }

    #[test]
    fn test_nested_attributes() {
        let (ast, _) = parse_site(
            "@server (\nprefix: /\nlimits (\nrate: 10\n)\n)\nservice app {\n@handler x\nget /x\n}\n",
        );

        let limits = ast.servers[0].attrs.get("limits").and_then(|v| v.as_nested());
        assert_eq!(
            limits.and_then(|l| l.get("rate")).and_then(|v| v.as_text()),
            Some("10")
        );
    }

    #[test]
    fn test_page_and_doc_attach_to_next_method() {
        let (ast, warnings) = parse_site(&handler(
            "@page (\ntitle: Home\n)\n@doc (\nsummary: Landing\n)\nget /\nget /about",
        ));

        let methods = &ast.servers[0].services[0].handlers[0].methods;
        assert!(warnings.is_empty());
        assert!(methods[0].page.is_some());
        assert!(methods[0].doc.is_some());
        assert!(methods[1].page.is_none());
    }

    #[test]
    fn test_attribute_keys_may_contain_spaces() {
        let (ast, _) = parse_site(&handler(
            "@page (\nog title: Summer Sale\ntitle: \"Sale: 50%\"\n)\nget /sale",
        ));

        let page = ast.servers[0].services[0].handlers[0].methods[0]
            .page
            .as_ref()
            .expect("page is attached");
        assert_eq!(
            page.attrs.get("og title").and_then(|v| v.as_text()),
            Some("Summer Sale")
        );
        assert_eq!(
            page.attrs.get("title").and_then(|v| v.as_text()),
            Some("Sale: 50%")
        );
    }

    #[test]
    fn test_dangling_annotation_warns() {
        let (_, warnings) = parse_site(&handler("get /\n@page (\ntitle: Lost\n)"));

        assert_eq!(codes(&warnings), vec![ErrorCode::E203]);
    }

    #[test]
    fn test_annotation_with_trailing_text() {
        let diag = parse_err(&handler("@page title\nget /"));

        assert_eq!(diag.code(), Some(ErrorCode::E100));
    }
}

mod method_tests {
    use super::*;

    fn only_method(text: &str) -> sitespec_core::semantic::Method {
        let spec = build(&handler(text));
        spec.methods().next().cloned().expect("one method")
    }

    #[test]
    fn test_output_classification() {
        let page = only_method("get /");
        assert!(page.flags().is_full_html_page);
        assert_eq!(page.classify(), RequestType::FullHtmlPage);

        let json = only_method("get /api returns (User)");
        assert!(json.flags().returns_json);
        assert!(!json.flags().is_full_html_page);
        assert_eq!(json.classify(), RequestType::JsonOutput);

        let silent = only_method("post /logout");
        assert!(silent.flags().no_output);
        assert_eq!(silent.classify(), RequestType::NoOutput);

        let partial = only_method("get /rows (Query) partial");
        assert!(partial.flags().returns_partial);
        assert!(partial.flags().is_full_html_page);
        assert_eq!(partial.classify(), RequestType::PartialHtml);
    }

    #[test]
    fn test_spacing_inside_groups() {
        let spaced = only_method("post /login ( Login ) returns ( Session )");
        let tight = only_method("post /login (Login) (Session)");

        assert_eq!(spaced.request_type(), tight.request_type());
        assert_eq!(spaced.response_type(), tight.response_type());
    }

    #[test]
    fn test_empty_response_group() {
        let method = only_method("post /ping (Ping) returns ()");

        assert!(method.response_type().is_none());
        assert!(method.flags().no_output);
    }

    #[test]
    fn test_modifiers() {
        assert!(only_method("get sse /events").flags().is_sse);
        assert!(only_method("post SSE /events").flags().is_sse);
        assert!(only_method("get video /clip").flags().is_video_stream);
        assert!(only_method("get audio /track").flags().is_audio_stream);
        assert!(only_method("post file /upload").flags().is_upload_file);

        let embed = only_method("get static-embed /assets /public");
        assert!(embed.flags().is_static);
        assert!(embed.flags().is_static_embed);
        assert_eq!(embed.static_route_rewrite(), Some("/public"));
    }

    #[test]
    fn test_invalid_modifier_pairing() {
        for line in [
            "post socket /ws (",
            "post static /assets",
            "get file /upload",
            "delete sse /events",
        ] {
            let diag = parse_err(&handler(line));
            assert_eq!(diag.code(), Some(ErrorCode::E102), "line `{line}`");
        }
    }

    #[test]
    fn test_malformed_signatures() {
        for line in ["get", "get /a bogus", "get /a (A) (B) (C)", "get /a (A"] {
            let diag = parse_err(&handler(line));
            assert_eq!(diag.code(), Some(ErrorCode::E103), "line `{line}`");
        }
    }

    #[test]
    fn test_sub_with_pub() {
        let method = only_method("sub chat.send (Message) pub chat.recv (Reply)");

        assert_eq!(method.method(), HttpMethod::Sub);
        assert_eq!(method.route(), "chat.send");
        assert!(method.flags().is_pub_sub);
        assert!(method.flags().returns_json);

        let pub_sub = method.pub_sub().expect("pub-sub node");
        assert_eq!(pub_sub.topic().topic(), "chat.send");
        assert_eq!(pub_sub.topic().response_topic(), "chat.recv");
        assert!(pub_sub.topic().initiated_by_client());
        assert_eq!(
            pub_sub.topic().response_type().map(Type::name).as_deref(),
            Some("Reply")
        );
    }

    #[test]
    fn test_sub_without_pub() {
        let method = only_method("sub metrics (Sample)");

        assert!(!method.flags().returns_json);
        assert!(!method.flags().no_output);
        assert_eq!(method.pub_sub().map(|p| p.topic().response_topic()), Some(""));
    }

    #[test]
    fn test_sub_requires_request_type() {
        assert_eq!(
            parse_err(&handler("sub metrics ()")).code(),
            Some(ErrorCode::E105)
        );
        assert_eq!(
            parse_err(&handler("sub metrics")).code(),
            Some(ErrorCode::E105)
        );
    }
}

mod socket_tests {
    use super::*;

    fn socket(topics: &str) -> (SiteAst, Vec<Diagnostic>) {
        parse_site(&handler(&format!("get socket /ws (\n{topics}\n)")))
    }

    #[test]
    fn test_bidirectional_expansion() {
        let (ast, _) = socket("a (ReqA) <<>> b (RespA)");

        let method = &ast.servers[0].services[0].handlers[0].methods[0];
        let topics = &method.socket.as_ref().expect("socket node").topics;
        let named = |n: &str| Some(TypeExpr::Named(n.to_string()));

        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].topic, "a");
        assert!(topics[0].initiated_by_client);
        assert_eq!(topics[0].request_type, named("ReqA"));
        assert_eq!(topics[0].response_type, named("RespA"));
        assert_eq!(topics[0].response_topic, "b");

        assert_eq!(topics[1].topic, "b");
        assert!(!topics[1].initiated_by_client);
        assert_eq!(topics[1].request_type, named("RespA"));
        assert_eq!(topics[1].response_type, named("ReqA"));
    }

    #[test]
    fn test_directional_topics() {
        let (ast, _) = socket("join (Join) (Welcome) >>\n<< notice (Notice)");

        let topics = &ast.servers[0].services[0].handlers[0].methods[0]
            .socket
            .as_ref()
            .expect("socket node")
            .topics;
        assert!(topics[0].initiated_by_client);
        assert_eq!(topics[0].response_topic, "join");
        assert!(topics[0].response_type.is_some());
        assert!(!topics[1].initiated_by_client);
        assert_eq!(topics[1].topic, "notice");
    }

    #[test]
    fn test_topic_dedup() {
        let (ast, warnings) = socket("ping (Ping) >>\nping (Ping) >>\nping (Ping) <<");

        let topics = &ast.servers[0].services[0].handlers[0].methods[0]
            .socket
            .as_ref()
            .expect("socket node")
            .topics;
        assert_eq!(topics.len(), 2);
        assert_eq!(codes(&warnings), vec![ErrorCode::E200]);
    }

    #[test]
    fn test_socket_flags() {
        let spec = build(&handler("get socket /ws (\nping (Ping) >>\n)"));
        let method = spec.methods().next().expect("one method");

        assert!(method.flags().is_socket);
        assert!(!method.flags().is_full_html_page);
        assert_eq!(method.classify(), RequestType::WebSocket);
        assert_eq!(method.socket().map(|s| s.topics().len()), Some(1));
    }

    #[test]
    fn test_topic_without_direction() {
        let diag = parse_err(&handler("get socket /ws (\nping (Ping)\n)"));

        assert_eq!(diag.code(), Some(ErrorCode::E104));
    }

    #[test]
    fn test_socket_without_block() {
        let diag = parse_err(&handler("get socket /ws"));

        assert_eq!(diag.code(), Some(ErrorCode::E104));
    }
}

mod menu_tests {
    use super::*;

    fn menu_method(route: &str, attrs: &str) -> String {
        format!("@menus (\nmain (\n{attrs}\n)\n)\nget {route}")
    }

    #[test]
    fn test_menu_linking_and_stable_sort() {
        let body = [
            menu_method("/a", "title: A\nweight: 2"),
            menu_method("/b", "title: B\nweight: 1\nparent: /a"),
            menu_method("/c", "title: C\nweight: 1\nparent: /a"),
        ]
        .join("\n");
        let spec = build(&handler(&body));

        let main = &spec.menus()["main"];
        assert_eq!(main.len(), 1);
        assert_eq!(main[0].url, "/a");
        let children: Vec<_> = main[0].children.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(children, vec!["/b", "/c"]);
    }

    #[test]
    fn test_menu_url_uses_prefix_and_page_title() {
        let (ast, _) = parse_site(
            "@server (\nprefix: /docs/\n)\nservice app {\n@handler main\n@page (\ntitle: Guide\n)\n@menus (\nside (\nweight: 3\n)\n)\nget /guide/\n}\n",
        );

        let entry = &ast.menus["side"][0];
        assert_eq!(entry.url, "/docs/guide");
        assert_eq!(entry.title, "Guide");
        assert_eq!(entry.weight, 3);
    }

    #[test]
    fn test_menu_booleans_and_unknown_keys() {
        let (ast, warnings) = parse_site(&handler(&menu_method(
            "/",
            "inMobile: true\nisAtEnd: 0\nisDropdown: T\ncolor: red",
        )));

        let entry = &ast.menus["main"][0];
        assert!(entry.in_mobile);
        assert!(!entry.is_at_end);
        assert!(entry.is_dropdown);
        assert_eq!(codes(&warnings), vec![ErrorCode::E204]);
    }

    #[test]
    fn test_menu_bad_values() {
        for attrs in ["weight: heavy", "inMobile: yes"] {
            let diag = parse_err(&handler(&menu_method("/", attrs)));
            assert_eq!(diag.code(), Some(ErrorCode::E106), "attrs `{attrs}`");
        }

        let diag = parse_err(&handler("@menus (\nmain: x\n)\nget /"));
        assert_eq!(diag.code(), Some(ErrorCode::E106));
    }

    #[test]
    fn test_orphan_menu_entry_warns() {
        let body = menu_method("/lost", "parent: /nowhere");
        let spec = build(&handler(&body));

        assert!(spec.menus()["main"].is_empty());
        let err = build_strict(&handler(&body)).expect_err("strict mode fails");
        assert_eq!(codes(err.diagnostics()), vec![ErrorCode::E201]);
    }

    #[test]
    fn test_home_entry_has_empty_url() {
        let body = [
            menu_method("/", "title: Home"),
            menu_method("/about", "title: About\nparent: /"),
        ]
        .join("\n");
        let spec = build(&handler(&body));

        let main = &spec.menus()["main"];
        assert_eq!(main.len(), 1);
        assert_eq!(main[0].url, "");
        assert!(main[0].children.is_empty());

        let err = build_strict(&handler(&body)).expect_err("strict mode fails");
        let orphan = &err.diagnostics()[0];
        assert_eq!(orphan.code(), Some(ErrorCode::E201));
        assert!(orphan.help().is_some_and(|help| help.contains("empty url")));
    }
}

mod module_tests {
    use super::*;

    #[test]
    fn test_module_block() {
        let spec = build("@module (\nname: billing\nsource: ./billing\nprefix: /billing\nowner: ops\n)\n");

        let module = &spec.modules()[0];
        assert_eq!(module.name(), "billing");
        assert_eq!(module.source(), "./billing");
        assert_eq!(module.prefix(), "/billing");
        assert_eq!(module.attrs().len(), 4);
    }

    #[test]
    fn test_module_missing_key() {
        let diag = parse_err("@module (\nname: billing\nsource: ./billing\n)\n");

        assert_eq!(diag.code(), Some(ErrorCode::E107));
        assert!(diag.message().contains("`prefix`"));
    }

    #[test]
    fn test_module_nested_key() {
        let diag = parse_err("@module (\nname (\nx: y\n)\nsource: s\nprefix: /p\n)\n");

        assert_eq!(diag.code(), Some(ErrorCode::E107));
        assert!(diag.message().contains("`name`"));
    }
}

mod top_level_tests {
    use super::*;

    #[test]
    fn test_unknown_lines_are_skipped() {
        let (ast, warnings) = parse_site("syntax = \"v1\"\ninfo: something\ntype A {}\n");

        assert_eq!(ast.structs.len(), 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unresolved_import_warns() {
        let (_, warnings) = parse_site("import \"shared.api\"\ntype A {}\n");

        assert_eq!(codes(&warnings), vec![ErrorCode::E205]);
    }

    #[test]
    fn test_strict_mode_promotes_warnings() {
        let err = build_strict("import \"shared.api\"\n").expect_err("strict mode fails");
        let diag = &err.diagnostics()[0];

        assert!(diag.severity().is_error());
        assert_eq!(diag.code(), Some(ErrorCode::E205));
    }

    #[test]
    fn test_errors_carry_location() {
        let err = crate::parse(
            &Source::inline("site", "type A {}\n\n@module (\nname: x\n)\n"),
            BuildConfig::default(),
        )
        .expect_err("module block is incomplete");

        let location = err.diagnostics()[0].location().expect("location");
        assert_eq!(location.line(), 3);
    }

    #[test]
    fn test_unterminated_string() {
        let diag = parse_err("@server (\nprefix: \"/api\n)\n");

        assert_eq!(diag.code(), Some(ErrorCode::E001));
    }
}
