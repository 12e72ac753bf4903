//! Request-type classification of methods.
//!
//! Generators pick a template per method from its [`RequestType`]. The
//! category is derived from the method's flags, route and payload types by
//! [`determine_request_type`].

use std::fmt;

use serde::Serialize;

use crate::semantic::{
    site::{HttpMethod, Method},
    types::Type,
};

/// The semantic category of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    FullHtmlPage,
    PartialHtml,
    JsonOutput,
    NoOutput,
    /// Form data, including file uploads.
    FormSubmission,
    WebSocket,
    SseStream,
    VideoStream,
    AudioStream,
}

impl From<RequestType> for &'static str {
    fn from(val: RequestType) -> Self {
        match val {
            RequestType::FullHtmlPage => "full_html_page",
            RequestType::PartialHtml => "partial_html",
            RequestType::JsonOutput => "json_output",
            RequestType::NoOutput => "no_output",
            RequestType::FormSubmission => "form_submission",
            RequestType::WebSocket => "web_socket",
            RequestType::SseStream => "sse_stream",
            RequestType::VideoStream => "video_stream",
            RequestType::AudioStream => "audio_stream",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// Classify a method. The first matching rule wins:
///
/// 1. socket
/// 2. SSE flag, or `sse` in the route
/// 3. video flag, or `video` in the route or response type name
/// 4. audio flag, or `audio` in the route or response type name
/// 5. partial
/// 6. request type with a `form:` or `file:` tagged field
/// 7. response type with a non-empty name
/// 8. `GET` without a (named) request type
/// 9. anything else produces no output
pub fn determine_request_type(method: &Method) -> RequestType {
    let flags = method.flags();
    let route = method.route().to_lowercase();
    let response_name = method
        .response_type()
        .map(|t| t.name().to_lowercase())
        .unwrap_or_default();

    if flags.is_socket {
        return RequestType::WebSocket;
    }

    if flags.is_sse || route.contains("sse") {
        return RequestType::SseStream;
    }

    if flags.is_video_stream || route.contains("video") || response_name.contains("video") {
        return RequestType::VideoStream;
    }

    if flags.is_audio_stream || route.contains("audio") || response_name.contains("audio") {
        return RequestType::AudioStream;
    }

    if flags.returns_partial {
        return RequestType::PartialHtml;
    }

    if method.request_type().is_some_and(has_form_fields) {
        return RequestType::FormSubmission;
    }

    if !response_name.is_empty() {
        return RequestType::JsonOutput;
    }

    if method.method() == HttpMethod::Get && method.request_type().is_none_or(Type::is_unnamed) {
        return RequestType::FullHtmlPage;
    }

    RequestType::NoOutput
}

fn has_form_fields(request_type: &Type) -> bool {
    request_type
        .fields()
        .iter()
        .any(|field| field.has_tag_key("form") || field.has_tag_key("file"))
}
