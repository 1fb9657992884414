use std::collections::HashMap;
use std::sync::Arc;

use minijinja::Value;

/// Request header carrying the identity of the partial to render in isolation.
pub const DEFAULT_PARTIAL_HEADER: &str = "hx-partial";

/// A template function callable from within templates. Arguments arrive as
/// loosely typed template values; implementations are expected to coerce.
pub type TemplateFunction =
    Arc<dyn Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync>;

/// Named template functions, merged into the engine at parse time.
pub type FuncMap = HashMap<String, TemplateFunction>;

#[derive(Clone)]
pub struct RenderConfig {
    /// Name of the request header that selects a partial target. Matched
    /// case-insensitively, as headers are.
    pub partial_header: String,
    /// When false every render reparses its templates. Development affordance;
    /// set once at startup.
    pub use_template_cache: bool,
    /// Functions available to every template, unless shadowed by a
    /// partial-specific function of the same name.
    pub functions: FuncMap,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            partial_header: DEFAULT_PARTIAL_HEADER.to_string(),
            use_template_cache: true,
            functions: FuncMap::new(),
        }
    }
}

impl std::fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderConfig")
            .field("partial_header", &self.partial_header)
            .field("use_template_cache", &self.use_template_cache)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Helper for building a [`FuncMap`] entry from a closure.
pub fn template_fn<F>(f: F) -> TemplateFunction
where
    F: Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
{
    Arc::new(f)
}
