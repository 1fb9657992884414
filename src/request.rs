use http::{HeaderMap, Request, Uri};

use crate::config::RenderConfig;

pub const HX_BOOSTED: &str = "hx-boosted";
pub const HX_CURRENT_URL: &str = "hx-current-url";
pub const HX_HISTORY_RESTORE_REQUEST: &str = "hx-history-restore-request";
pub const HX_PROMPT: &str = "hx-prompt";
pub const HX_REQUEST: &str = "hx-request";
pub const HX_TARGET: &str = "hx-target";
pub const HX_TRIGGER: &str = "hx-trigger";
pub const HX_TRIGGER_NAME: &str = "hx-trigger-name";

/// The hypermedia protocol headers of an inbound request, parsed into typed
/// fields.
#[derive(Debug, Clone, Default)]
pub struct HxRequest {
    pub boosted: bool,
    pub current_url: Option<String>,
    pub history_restore_request: bool,
    pub prompt: Option<String>,
    pub request: bool,
    pub target: Option<String>,
    pub trigger: Option<String>,
    pub trigger_name: Option<String>,
}

impl HxRequest {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            boosted: header_bool(headers, HX_BOOSTED),
            current_url: header_string(headers, HX_CURRENT_URL),
            history_restore_request: header_bool(headers, HX_HISTORY_RESTORE_REQUEST),
            prompt: header_string(headers, HX_PROMPT),
            request: header_bool(headers, HX_REQUEST),
            target: header_string(headers, HX_TARGET),
            trigger: header_string(headers, HX_TRIGGER),
            trigger_name: header_string(headers, HX_TRIGGER_NAME),
        }
    }

    /// True when the client asked for a fragment: a hypermedia or boosted
    /// request that is not replaying browser history. History restores must
    /// always receive the full page.
    pub fn render_partial(&self) -> bool {
        (self.request || self.boosted) && !self.history_restore_request
    }
}

/// The request-derived signal consumed by the renderer: the partial-target
/// slot identity, the protocol booleans, and the originating URI.
///
/// Built from an [`http::Request`] in handlers, or by hand (the fields are
/// public) for non-HTTP callers. The default value means "full page".
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub uri: Option<Uri>,
    pub hx: HxRequest,
    pub partial_target: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(request: &Request<B>, config: &RenderConfig) -> Self {
        Self {
            uri: Some(request.uri().clone()),
            hx: HxRequest::from_headers(request.headers()),
            partial_target: header_string(request.headers(), &config.partial_header),
        }
    }

    pub fn render_partial(&self) -> bool {
        self.hx.render_partial()
    }

    /// The target slot to render in isolation, if any. A history-restore
    /// request never has one: it must get the full page back.
    pub(crate) fn effective_target(&self) -> Option<&str> {
        if self.hx.history_restore_request {
            return None;
        }
        self.partial_target.as_deref().filter(|t| !t.is_empty())
    }

    pub(crate) fn without_target(&self) -> Self {
        Self {
            partial_target: None,
            ..self.clone()
        }
    }
}

pub fn str_to_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

pub fn bool_to_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn header_bool(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(str_to_bool)
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
