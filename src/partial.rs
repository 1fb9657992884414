use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use http::Uri;
use minijinja::Value;
use serde::Serialize;

use crate::config::{FuncMap, TemplateFunction};
use crate::template::Html;

/// Identity of a tree's entry node when none is given explicitly.
pub const ROOT_ID: &str = "root";

/// Data shared by every node of a render tree. Attaching a child aliases its
/// global scope to the parent's, so a write performed anywhere in the tree is
/// visible tree-wide.
pub(crate) type GlobalData = Arc<RwLock<HashMap<String, Value>>>;

/// A node in the composable rendering tree.
///
/// A `Partial` owns its templates, a local data scope, named children, and
/// optionally a wrapper it is nested inside. Trees are built per request with
/// the chainable setters, then handed to [`Renderer`](crate::Renderer) and
/// consumed by the render pass.
pub struct Partial {
    pub(crate) id: String,
    /// Template files; the first one is the entry point for execution.
    pub(crate) templates: Vec<String>,
    pub(crate) functions: FuncMap,
    /// Local data, visible only to this node's templates.
    pub(crate) data: HashMap<String, Value>,
    /// Free-form payload exposed to templates as `any`.
    pub(crate) any: Option<Value>,
    pub(crate) global: GlobalData,
    /// Children keyed by their identity, which doubles as the slot name.
    pub(crate) children: HashMap<String, Partial>,
    /// Subset of `children` whose output is appended out of band instead of
    /// substituted into a named slot.
    pub(crate) oob_children: HashSet<String>,
    /// Fragments rendered bottom-up during a pass, consumed by the node's own
    /// template as `partials.<id>`.
    pub(crate) partials: HashMap<String, Html>,
    pub(crate) wrapper: Option<Box<Partial>>,
    pub(crate) uri: Option<Uri>,
}

impl Partial {
    /// Create a new root node with the given template files.
    pub fn new<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: ROOT_ID.to_string(),
            templates: templates.into_iter().map(Into::into).collect(),
            functions: FuncMap::new(),
            data: HashMap::new(),
            any: None,
            global: Arc::new(RwLock::new(HashMap::new())),
            children: HashMap::new(),
            oob_children: HashSet::new(),
            partials: HashMap::new(),
            wrapper: None,
            uri: None,
        }
    }

    /// Create a new node with the given identity.
    pub fn new_with_id<I, S>(id: impl Into<String>, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(templates).set_id(id)
    }

    pub fn set_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replace the template list.
    pub fn templates<I, S>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates = templates.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_template(mut self, template: impl Into<String>) -> Self {
        self.templates.push(template.into());
        self
    }

    /// Replace the local data wholesale.
    pub fn set_data(mut self, data: HashMap<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Merge a single key into the local data, overwriting an existing entry.
    pub fn add_data(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.data.insert(key.into(), Value::from_serialize(value));
        self
    }

    /// Replace the contents of the shared global scope.
    pub fn set_global_data(self, data: HashMap<String, Value>) -> Self {
        *self.global.write().unwrap_or_else(PoisonError::into_inner) = data;
        self
    }

    /// Write one key into the shared global scope. Visible to every node that
    /// shares this tree's global scope, immediately.
    pub fn add_global_data(self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.global
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), Value::from_serialize(value));
        self
    }

    /// Set the free-form payload passed to templates as `any`.
    pub fn set_any(mut self, any: impl Serialize) -> Self {
        self.any = Some(Value::from_serialize(any));
        self
    }

    pub fn set_funcs(mut self, funcs: FuncMap) -> Self {
        self.functions = funcs;
        self
    }

    pub fn add_func(mut self, name: impl Into<String>, func: TemplateFunction) -> Self {
        self.functions.insert(name.into(), func);
        self
    }

    /// Merge functions into the node, keeping existing ones on name clashes.
    pub fn append_funcs(mut self, funcs: FuncMap) -> Self {
        for (name, func) in funcs {
            self.functions.entry(name).or_insert(func);
        }
        self
    }

    /// Set the originating request URI, propagated to children at render time
    /// for link building inside templates.
    pub fn set_uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Attach `child` under its own identity as slot name.
    ///
    /// The child (and its whole subtree) adopts this node's global scope; any
    /// entries the child had already written are carried over without
    /// overwriting existing keys. Re-attaching under an occupied identity
    /// replaces the previous child.
    pub fn with(mut self, child: Partial) -> Self {
        self.adopt(child);
        self
    }

    /// As [`with`](Self::with), but the child's output is appended to this
    /// node's rendered fragment instead of filling a named slot.
    pub fn with_oob(mut self, child: Partial) -> Self {
        self.oob_children.insert(child.id.clone());
        self.adopt(child);
        self
    }

    /// Nest this node inside `wrapper`. For full-page requests the wrapper is
    /// rendered instead, with this node's output injected into the wrapper's
    /// slot named after this node's identity. A node has at most one wrapper;
    /// a second call replaces the first.
    pub fn wrap(mut self, wrapper: Partial) -> Self {
        let global = Arc::clone(&wrapper.global);
        self.merge_global_into(&global);
        self.rebind_global(&global);
        self.wrapper = Some(Box::new(wrapper));
        self
    }

    /// Clear per-request state so the node can be repopulated.
    pub fn reset(mut self) -> Self {
        self.data = HashMap::new();
        self.global = Arc::new(RwLock::new(HashMap::new()));
        self.children = HashMap::new();
        self.oob_children = HashSet::new();
        self.partials = HashMap::new();
        self.any = None;
        self.uri = None;
        self
    }

    pub(crate) fn adopt(&mut self, mut child: Partial) {
        child.merge_global_into(&self.global);
        child.rebind_global(&self.global);
        self.children.insert(child.id.clone(), child);
    }

    /// Carry this node's global entries over into `target`, first write wins.
    fn merge_global_into(&self, target: &GlobalData) {
        if Arc::ptr_eq(&self.global, target) {
            return;
        }
        let src = self.global.read().unwrap_or_else(PoisonError::into_inner);
        let mut dst = target.write().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in src.iter() {
            dst.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    /// Point this subtree at the shared global scope of its new tree.
    fn rebind_global(&mut self, global: &GlobalData) {
        self.global = Arc::clone(global);
        for child in self.children.values_mut() {
            child.rebind_global(global);
        }
        if let Some(wrapper) = self.wrapper.as_mut() {
            wrapper.rebind_global(global);
        }
    }

    /// Inherit render-pass state from the parent: the request URI overwrites,
    /// local data merges without overwriting.
    pub(crate) fn inherit_from(&mut self, parent: &Partial) {
        if parent.uri.is_some() {
            self.uri = parent.uri.clone();
        }
        for (key, value) in &parent.data {
            if !self.data.contains_key(key) {
                self.data.insert(key.clone(), value.clone());
            }
        }
    }

    pub(crate) fn merge_funcs(&mut self, funcs: &FuncMap) {
        for (name, func) in funcs {
            if !self.functions.contains_key(name) {
                self.functions.insert(name.clone(), func.clone());
            }
        }
    }
}

impl std::fmt::Debug for Partial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partial")
            .field("id", &self.id)
            .field("templates", &self.templates)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("oob_children", &self.oob_children)
            .field("wrapped", &self.wrapper.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults() {
        let root = Partial::new(["template.html"]);

        assert_eq!(root.id, "root");
        assert_eq!(root.templates, vec!["template.html".to_string()]);
        assert!(root.data.is_empty());
        assert!(root.children.is_empty());
        assert!(root.oob_children.is_empty());
        assert!(root.partials.is_empty());
        assert!(root.wrapper.is_none());
    }

    #[test]
    fn with_attaches_under_child_identity() {
        let root = Partial::new(["page.html"])
            .with(Partial::new_with_id("sidebar", ["sidebar.html"]));

        assert!(root.children.contains_key("sidebar"));
        assert!(!root.oob_children.contains("sidebar"));
    }

    #[test]
    fn with_oob_marks_child() {
        let root = Partial::new(["page.html"])
            .with_oob(Partial::new_with_id("notice", ["notice.html"]));

        assert!(root.children.contains_key("notice"));
        assert!(root.oob_children.contains("notice"));
    }

    #[test]
    fn with_aliases_global_scope() {
        let child = Partial::new_with_id("child", ["child.html"]);
        let root = Partial::new(["page.html"]).with(child);

        assert!(Arc::ptr_eq(&root.global, &root.children["child"].global));
    }

    #[test]
    fn with_rebinds_grandchildren() {
        let child = Partial::new_with_id("child", ["child.html"])
            .with(Partial::new_with_id("grandchild", ["grandchild.html"]));
        let root = Partial::new(["page.html"]).with(child);

        let grandchild = &root.children["child"].children["grandchild"];
        assert!(Arc::ptr_eq(&root.global, &grandchild.global));
    }

    #[test]
    fn attach_carries_existing_global_entries() {
        let child = Partial::new_with_id("child", ["child.html"])
            .add_global_data("Site", "example.org");
        let root = Partial::new(["page.html"])
            .add_global_data("Site", "root.example")
            .with(child);

        let global = root.global.read().unwrap();
        // first write wins: the parent's entry predates the attach
        assert_eq!(global["Site"].as_str(), Some("root.example"));
    }

    #[test]
    fn wrap_shares_global_with_wrapper() {
        let page = Partial::new_with_id("content", ["content.html"])
            .add_global_data("Title", "home")
            .wrap(Partial::new(["layout.html"]));

        let wrapper = page.wrapper.as_ref().unwrap();
        assert!(Arc::ptr_eq(&page.global, &wrapper.global));
        let global = page.global.read().unwrap();
        assert_eq!(global["Title"].as_str(), Some("home"));
    }

    #[test]
    fn inherit_merges_without_overwriting() {
        let parent = Partial::new(["page.html"])
            .add_data("Title", "parent")
            .add_data("Shared", "from-parent");
        let mut child = Partial::new_with_id("child", ["child.html"]).add_data("Title", "child");

        child.inherit_from(&parent);

        assert_eq!(child.data["Title"].as_str(), Some("child"));
        assert_eq!(child.data["Shared"].as_str(), Some("from-parent"));
    }

    #[test]
    fn reset_clears_request_state() {
        let root = Partial::new(["page.html"])
            .add_data("Title", "home")
            .add_global_data("Site", "example.org")
            .with(Partial::new_with_id("sidebar", ["sidebar.html"]))
            .reset();

        assert!(root.data.is_empty());
        assert!(root.children.is_empty());
        assert!(root.global.read().unwrap().is_empty());
        assert_eq!(root.templates, vec!["page.html".to_string()]);
    }
}
