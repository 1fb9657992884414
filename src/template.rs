use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use minijinja::value::Rest;
use minijinja::{context, Environment, Value};

use crate::config::{FuncMap, RenderConfig};
use crate::errors::RenderError;
use crate::partial::Partial;

/// A rendered markup fragment. Fragments are substituted into parent
/// templates verbatim, without re-escaping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Html(String);

impl Html {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub(crate) fn append(&mut self, other: &Html) {
        self.0.push_str(&other.0);
    }
}

impl From<String> for Html {
    fn from(markup: String) -> Self {
        Self(markup)
    }
}

impl AsRef<str> for Html {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Html {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-wide cache of parsed template environments, shared by every render
/// pass going through one [`Renderer`](crate::Renderer). Writes are
/// idempotent: re-parsing and overwriting an entry with an equivalent parse
/// is harmless.
pub(crate) struct TemplateCache {
    inner: RwLock<HashMap<String, Arc<Environment<'static>>>>,
}

impl TemplateCache {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn get(&self, key: &str) -> Option<Arc<Environment<'static>>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn insert(&self, key: String, env: Arc<Environment<'static>>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, env);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }
}

/// Execute the node's entry template against its accumulated data scopes and
/// fragment cache.
pub(crate) fn execute(
    cache: &TemplateCache,
    config: &RenderConfig,
    partial: &Partial,
) -> Result<Html, RenderError> {
    let entry = partial
        .templates
        .first()
        .ok_or_else(|| RenderError::NoTemplates(partial.id.clone()))?;

    // Process-wide defaults, shadowed by node-specific functions.
    let mut functions = config.functions.clone();
    for (name, func) in &partial.functions {
        functions.insert(name.clone(), func.clone());
    }

    let key = cache_key(&partial.templates, &functions);
    let env = match config.use_template_cache.then(|| cache.get(&key)).flatten() {
        Some(env) => env,
        None => {
            log::debug!("parsing templates for cache key {key}");
            let env = Arc::new(parse_templates(&partial.templates, &functions)?);
            cache.insert(key, Arc::clone(&env));
            env
        }
    };

    let template = env.get_template(&entry_name(entry))?;

    let data = Value::from_iter(partial.data.iter().map(|(k, v)| (k.clone(), v.clone())));
    let global = {
        let global = partial.global.read().unwrap_or_else(PoisonError::into_inner);
        Value::from_iter(global.iter().map(|(k, v)| (k.clone(), v.clone())))
    };
    let partials = Value::from_iter(
        partial
            .partials
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_safe_string(v.as_str().to_owned()))),
    );

    let output = template.render(context! {
        url => partial.uri.as_ref().map(|u| u.to_string()),
        data => data,
        global => global,
        partials => partials,
        any => partial.any.clone().unwrap_or(Value::UNDEFINED),
    })?;

    Ok(Html(output))
}

/// Parse the template files into a fresh environment with the merged
/// function set registered.
fn parse_templates(
    templates: &[String],
    functions: &FuncMap,
) -> Result<Environment<'static>, RenderError> {
    let mut env = Environment::new();

    for (name, func) in functions {
        let func = Arc::clone(func);
        env.add_function(name.clone(), move |args: Rest<Value>| func(&args.0));
    }

    for path in templates {
        let source = std::fs::read_to_string(path).map_err(|source| RenderError::TemplateRead {
            path: path.clone(),
            source,
        })?;
        env.add_template_owned(entry_name(path), source)?;
    }

    Ok(env)
}

/// Base file name of a template path; templates are registered and looked up
/// under it, so cross-file includes can use bare file names.
pub(crate) fn entry_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Derive the cache key from the entry template path and the set of bound
/// function names. Two equally named templates with different function sets
/// must not share a parse.
pub(crate) fn cache_key(templates: &[String], functions: &FuncMap) -> String {
    let mut names: Vec<&str> = functions.keys().map(String::as_str).collect();
    names.sort_unstable();

    let mut hasher = DefaultHasher::new();
    names.join(",").hash(&mut hasher);

    format!("{}:{:016x}", templates[0], hasher.finish())
}
