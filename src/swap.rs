use std::fmt;
use std::time::Duration;

use crate::request::bool_to_str;

/// How long the client waits before swapping content in, unless overridden.
pub const DEFAULT_SWAP_DURATION: Duration = Duration::from_millis(0);
/// How long the client waits between swap and settle, unless overridden.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(20);

/// Builder for swap specifications, as carried by `hx-swap` attributes and
/// the `HX-Reswap` response header.
///
/// ```
/// use hx_render::swap::{Swap, SwapStyle};
///
/// let value = Swap::new()
///     .style(SwapStyle::OuterHtml)
///     .scroll_top(Some("#list"))
///     .to_string();
/// assert_eq!(value, "outerHTML scroll:#list:top");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Swap {
    style: SwapStyle,
    transition: Option<bool>,
    timing: Option<SwapTiming>,
    scrolling: Option<SwapScrolling>,
    ignore_title: Option<bool>,
    focus_scroll: Option<bool>,
}

impl Swap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the swap style. The default is innerHTML, matching the client's
    /// own default.
    pub fn style(mut self, style: SwapStyle) -> Self {
        self.style = style;
        self
    }

    fn set_scrolling(
        mut self,
        mode: SwapScrollingMode,
        direction: SwapDirection,
        target: Option<&str>,
    ) -> Self {
        self.scrolling = Some(SwapScrolling {
            mode,
            direction,
            target: target.map(str::to_owned),
        });
        self
    }

    /// Scroll the target element (or the element named by `target`) after the
    /// swap.
    pub fn scroll(self, direction: SwapDirection, target: Option<&str>) -> Self {
        self.set_scrolling(SwapScrollingMode::Scroll, direction, target)
    }

    pub fn scroll_top(self, target: Option<&str>) -> Self {
        self.scroll(SwapDirection::Top, target)
    }

    pub fn scroll_bottom(self, target: Option<&str>) -> Self {
        self.scroll(SwapDirection::Bottom, target)
    }

    /// Show (scroll into view) the target element after the swap.
    pub fn show(self, direction: SwapDirection, target: Option<&str>) -> Self {
        self.set_scrolling(SwapScrollingMode::Show, direction, target)
    }

    pub fn show_top(self, target: Option<&str>) -> Self {
        self.show(SwapDirection::Top, target)
    }

    pub fn show_bottom(self, target: Option<&str>) -> Self {
        self.show(SwapDirection::Bottom, target)
    }

    fn set_timing(mut self, mode: SwapTimingMode, duration: Option<Duration>) -> Self {
        let duration = duration.unwrap_or(match mode {
            SwapTimingMode::Swap => DEFAULT_SWAP_DURATION,
            SwapTimingMode::Settle => DEFAULT_SETTLE_DELAY,
        });
        self.timing = Some(SwapTiming { mode, duration });
        self
    }

    /// Change how long the client waits before swapping the content in.
    pub fn swap(self, duration: impl Into<Option<Duration>>) -> Self {
        self.set_timing(SwapTimingMode::Swap, duration.into())
    }

    /// Change how long the client waits between the swap and the settle step.
    pub fn settle(self, duration: impl Into<Option<Duration>>) -> Self {
        self.set_timing(SwapTimingMode::Settle, duration.into())
    }

    /// Enable or disable the view transition for this swap.
    pub fn transition(mut self, transition: bool) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Keep the page title untouched by the swapped content.
    pub fn ignore_title(mut self, ignore_title: bool) -> Self {
        self.ignore_title = Some(ignore_title);
        self
    }

    /// Enable or disable focus preservation scrolling.
    pub fn focus_scroll(mut self, focus_scroll: bool) -> Self {
        self.focus_scroll = Some(focus_scroll);
        self
    }
}

impl fmt::Display for Swap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.style)?;

        if let Some(scrolling) = &self.scrolling {
            write!(f, " {scrolling}")?;
        }
        if let Some(transition) = self.transition {
            write!(f, " transition:{}", bool_to_str(transition))?;
        }
        if let Some(ignore_title) = self.ignore_title {
            write!(f, " ignoreTitle:{}", bool_to_str(ignore_title))?;
        }
        if let Some(focus_scroll) = self.focus_scroll {
            write!(f, " focus-scroll:{}", bool_to_str(focus_scroll))?;
        }
        if let Some(timing) = &self.timing {
            write!(f, " {timing}")?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
struct SwapTiming {
    mode: SwapTimingMode,
    duration: Duration,
}

impl fmt::Display for SwapTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mode.as_str())?;
        if !self.duration.is_zero() {
            write!(f, ":{}", format_duration(self.duration))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct SwapScrolling {
    mode: SwapScrollingMode,
    target: Option<String>,
    direction: SwapDirection,
}

impl fmt::Display for SwapScrolling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mode.as_str())?;
        if let Some(target) = &self.target {
            write!(f, ":{target}")?;
        }
        write!(f, ":{}", self.direction.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SwapStyle {
    /// Replace the inner html of the target element.
    #[default]
    InnerHtml,
    /// Replace the entire target element with the response.
    OuterHtml,
    /// Insert the response before the target element.
    BeforeBegin,
    /// Insert the response before the first child of the target element.
    AfterBegin,
    /// Insert the response after the last child of the target element.
    BeforeEnd,
    /// Insert the response after the target element.
    AfterEnd,
    /// Delete the target element regardless of the response.
    Delete,
    /// Do not append content from the response; out-of-band items are still
    /// processed.
    None,
}

impl SwapStyle {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InnerHtml => "innerHTML",
            Self::OuterHtml => "outerHTML",
            Self::BeforeBegin => "beforebegin",
            Self::AfterBegin => "afterbegin",
            Self::BeforeEnd => "beforeend",
            Self::AfterEnd => "afterend",
            Self::Delete => "delete",
            Self::None => "none",
        }
    }
}

impl fmt::Display for SwapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapScrollingMode {
    Scroll,
    Show,
}

impl SwapScrollingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Show => "show",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapTimingMode {
    Swap,
    Settle,
}

impl SwapTimingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Swap => "swap",
            Self::Settle => "settle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    Top,
    Bottom,
}

impl SwapDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 && duration.as_secs() > 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_is_inner_html() {
        assert_eq!(Swap::new().to_string(), "innerHTML");
    }

    #[test]
    fn style_override() {
        assert_eq!(
            Swap::new().style(SwapStyle::OuterHtml).to_string(),
            "outerHTML"
        );
    }

    #[test]
    fn transition_modifier() {
        assert_eq!(
            Swap::new().transition(true).to_string(),
            "innerHTML transition:true"
        );
    }

    #[test]
    fn ignore_title_modifier() {
        assert_eq!(
            Swap::new().ignore_title(true).to_string(),
            "innerHTML ignoreTitle:true"
        );
    }

    #[test]
    fn focus_scroll_modifier() {
        assert_eq!(
            Swap::new().focus_scroll(false).to_string(),
            "innerHTML focus-scroll:false"
        );
    }

    #[test]
    fn swap_timing_with_duration() {
        assert_eq!(
            Swap::new().swap(Duration::from_millis(100)).to_string(),
            "innerHTML swap:100ms"
        );
    }

    #[test]
    fn swap_timing_default_is_suppressed() {
        // the default swap duration is zero, which renders without a suffix
        assert_eq!(Swap::new().swap(None).to_string(), "innerHTML swap");
    }

    #[test]
    fn settle_timing_default() {
        assert_eq!(Swap::new().settle(None).to_string(), "innerHTML settle:20ms");
    }

    #[test]
    fn whole_second_durations_use_seconds() {
        assert_eq!(
            Swap::new().settle(Duration::from_secs(2)).to_string(),
            "innerHTML settle:2s"
        );
    }

    #[test]
    fn scrolling_with_target() {
        assert_eq!(
            Swap::new().scroll_bottom(Some("#element")).to_string(),
            "innerHTML scroll:#element:bottom"
        );
    }

    #[test]
    fn show_without_target() {
        assert_eq!(
            Swap::new().show_top(None).to_string(),
            "innerHTML show:top"
        );
    }

    #[test]
    fn modifiers_combine_in_order() {
        let value = Swap::new()
            .style(SwapStyle::AfterEnd)
            .scroll_top(None)
            .transition(true)
            .settle(Duration::from_millis(50))
            .to_string();
        assert_eq!(value, "afterend scroll:top transition:true settle:50ms");
    }
}
