use std::collections::HashMap;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

use crate::request::bool_to_str;
use crate::swap::Swap;
use crate::trigger::{NotificationLevel, Trigger};

/// Response status that tells a polling client to stop polling.
pub const STATUS_STOP_POLLING: u16 = 286;

pub fn stop_polling_status() -> StatusCode {
    StatusCode::from_u16(STATUS_STOP_POLLING).expect("286 is a valid status code")
}

/// The hypermedia protocol response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HxResponseKey {
    /// Client-side redirect without a full page reload.
    Location,
    /// Push a new URL onto the history stack.
    PushUrl,
    /// Client-side redirect to a new location.
    Redirect,
    /// Full page refresh on the client when "true".
    Refresh,
    /// Replace the current URL in the location bar.
    ReplaceUrl,
    /// Override how the response is swapped in.
    Reswap,
    /// CSS selector redirecting the content update to another element.
    Retarget,
    /// CSS selector choosing which part of the response gets swapped in.
    Reselect,
    /// Trigger client-side events on receipt of the response.
    Trigger,
    /// Trigger client-side events after the settle step.
    TriggerAfterSettle,
    /// Trigger client-side events after the swap step.
    TriggerAfterSwap,
}

impl HxResponseKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Location => "hx-location",
            Self::PushUrl => "hx-push-url",
            Self::Redirect => "hx-redirect",
            Self::Refresh => "hx-refresh",
            Self::ReplaceUrl => "hx-replace-url",
            Self::Reswap => "hx-reswap",
            Self::Retarget => "hx-retarget",
            Self::Reselect => "hx-reselect",
            Self::Trigger => "hx-trigger",
            Self::TriggerAfterSettle => "hx-trigger-after-settle",
            Self::TriggerAfterSwap => "hx-trigger-after-swap",
        }
    }

    pub fn header_name(self) -> HeaderName {
        HeaderName::from_static(self.as_str())
    }
}

impl std::fmt::Display for HxResponseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for the `HX-Location` header.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocationInput {
    /// Path to navigate to.
    pub path: String,
    /// Source element of the request.
    pub source: String,
    /// Event that triggered the request.
    pub event: String,
    /// Callback handling the response HTML.
    pub handler: String,
    /// Target to swap the response into.
    pub target: String,
    /// How the response is swapped in relative to the target.
    pub swap: String,
    /// Values to submit with the request.
    pub values: HashMap<String, serde_json::Value>,
    /// Headers to submit with the request.
    pub headers: HashMap<String, serde_json::Value>,
}

/// Typed setters for the protocol's response headers, writing into any
/// framework's `http::HeaderMap`.
#[derive(Debug)]
pub struct HxResponse<'a> {
    headers: &'a mut HeaderMap,
}

impl<'a> HxResponse<'a> {
    pub fn new(headers: &'a mut HeaderMap) -> Self {
        Self { headers }
    }

    /// Set a raw protocol header. A value that is not a valid header value is
    /// dropped with a warning; all values produced by this crate's builders
    /// are valid.
    pub fn set(&mut self, key: HxResponseKey, value: &str) -> &mut Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(key.header_name(), value);
            }
            Err(err) => log::warn!("dropping response header {key}: {err}"),
        }
        self
    }

    pub fn get(&self, key: HxResponseKey) -> Option<&str> {
        self.headers.get(key.as_str()).and_then(|v| v.to_str().ok())
    }

    /// Client-side redirect without a page reload.
    /// <https://htmx.org/headers/hx-location/>
    pub fn location(&mut self, input: &LocationInput) -> Result<&mut Self, serde_json::Error> {
        let payload = serde_json::to_string(input)?;
        Ok(self.set(HxResponseKey::Location, &payload))
    }

    /// Push a new URL onto the history stack.
    pub fn push_url(&mut self, url: &str) -> &mut Self {
        self.set(HxResponseKey::PushUrl, url)
    }

    /// Client-side redirect to a new location.
    pub fn redirect(&mut self, url: &str) -> &mut Self {
        self.set(HxResponseKey::Redirect, url)
    }

    /// When true, the client does a full page refresh.
    pub fn refresh(&mut self, refresh: bool) -> &mut Self {
        self.set(HxResponseKey::Refresh, bool_to_str(refresh))
    }

    /// Replace the current URL in the location bar.
    pub fn replace_url(&mut self, url: &str) -> &mut Self {
        self.set(HxResponseKey::ReplaceUrl, url)
    }

    /// Override how the response is swapped in. See `hx-swap` for values.
    pub fn reswap(&mut self, value: &str) -> &mut Self {
        self.set(HxResponseKey::Reswap, value)
    }

    pub fn reswap_with(&mut self, swap: &Swap) -> &mut Self {
        self.reswap(&swap.to_string())
    }

    /// Redirect the content update to another element.
    pub fn retarget(&mut self, selector: &str) -> &mut Self {
        self.set(HxResponseKey::Retarget, selector)
    }

    /// Choose which part of the response gets swapped in.
    pub fn reselect(&mut self, selector: &str) -> &mut Self {
        self.set(HxResponseKey::Reselect, selector)
    }

    /// Trigger client-side events as soon as the response is received.
    /// <https://htmx.org/headers/hx-trigger/>
    pub fn trigger(&mut self, value: &str) -> &mut Self {
        self.set(HxResponseKey::Trigger, value)
    }

    pub fn trigger_with(&mut self, trigger: &Trigger) -> &mut Self {
        self.trigger(&trigger.to_string())
    }

    /// Trigger client-side events after the settle step.
    pub fn trigger_after_settle(&mut self, value: &str) -> &mut Self {
        self.set(HxResponseKey::TriggerAfterSettle, value)
    }

    pub fn trigger_after_settle_with(&mut self, trigger: &Trigger) -> &mut Self {
        self.trigger_after_settle(&trigger.to_string())
    }

    /// Trigger client-side events after the swap step.
    pub fn trigger_after_swap(&mut self, value: &str) -> &mut Self {
        self.set(HxResponseKey::TriggerAfterSwap, value)
    }

    pub fn trigger_after_swap_with(&mut self, trigger: &Trigger) -> &mut Self {
        self.trigger_after_swap(&trigger.to_string())
    }

    /// Trigger a success notification event on the client.
    pub fn trigger_success(&mut self, message: &str, vars: &[(&str, &str)]) -> &mut Self {
        self.notify(NotificationLevel::Success, message, vars)
    }

    /// Trigger an info notification event on the client.
    pub fn trigger_info(&mut self, message: &str, vars: &[(&str, &str)]) -> &mut Self {
        self.notify(NotificationLevel::Info, message, vars)
    }

    /// Trigger a warning notification event on the client.
    pub fn trigger_warning(&mut self, message: &str, vars: &[(&str, &str)]) -> &mut Self {
        self.notify(NotificationLevel::Warning, message, vars)
    }

    /// Trigger an error notification event on the client.
    pub fn trigger_error(&mut self, message: &str, vars: &[(&str, &str)]) -> &mut Self {
        self.notify(NotificationLevel::Error, message, vars)
    }

    fn notify(&mut self, level: NotificationLevel, message: &str, vars: &[(&str, &str)]) -> &mut Self {
        self.trigger_with(&Trigger::notification(level, message, vars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_populate_the_header_map() {
        let mut headers = HeaderMap::new();
        let mut response = HxResponse::new(&mut headers);

        response
            .push_url("/articles/42")
            .refresh(false)
            .retarget("#main");

        assert_eq!(headers["hx-push-url"], "/articles/42");
        assert_eq!(headers["hx-refresh"], "false");
        assert_eq!(headers["hx-retarget"], "#main");
    }

    #[test]
    fn location_serializes_the_input() {
        let mut headers = HeaderMap::new();
        let mut response = HxResponse::new(&mut headers);

        let input = LocationInput {
            path: "/dashboard".to_string(),
            target: "#content".to_string(),
            ..LocationInput::default()
        };
        response.location(&input).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(headers["hx-location"].to_str().unwrap()).unwrap();
        assert_eq!(value["path"], "/dashboard");
        assert_eq!(value["target"], "#content");
    }

    #[test]
    fn reswap_takes_a_swap_object() {
        let mut headers = HeaderMap::new();
        HxResponse::new(&mut headers).reswap_with(&Swap::new());

        assert_eq!(headers["hx-reswap"], "innerHTML");
    }

    #[test]
    fn notification_shortcut_builds_a_trigger_object() {
        let mut headers = HeaderMap::new();
        HxResponse::new(&mut headers).trigger_success("saved", &[]);

        let value: serde_json::Value =
            serde_json::from_str(headers["hx-trigger"].to_str().unwrap()).unwrap();
        assert_eq!(value["showMessage"]["level"], "success");
        assert_eq!(value["showMessage"]["message"], "saved");
    }

    #[test]
    fn invalid_header_value_is_dropped() {
        let mut headers = HeaderMap::new();
        HxResponse::new(&mut headers).push_url("bad\nvalue");

        assert!(headers.get("hx-push-url").is_none());
    }

    #[test]
    fn get_reads_back_set_values() {
        let mut headers = HeaderMap::new();
        let mut response = HxResponse::new(&mut headers);
        response.redirect("/login");

        assert_eq!(response.get(HxResponseKey::Redirect), Some("/login"));
    }

    #[test]
    fn stop_polling_is_286() {
        assert_eq!(stop_polling_status().as_u16(), 286);
    }
}
