use crate::config::RenderConfig;
use crate::errors::RenderError;
use crate::partial::Partial;
use crate::request::RequestContext;
use crate::template::{execute, Html, TemplateCache};

/// Render service: owns the injected configuration and the process-wide
/// template cache. One `Renderer` is built at startup and shared across
/// requests; each request builds its own [`Partial`] tree and hands it to one
/// of the entry points, which consume it.
pub struct Renderer {
    config: RenderConfig,
    cache: TemplateCache,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            cache: TemplateCache::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render the full tree unconditionally, without a request signal.
    ///
    /// This is the entry point for non-HTTP rendering such as periodic push
    /// updates. Child failures propagate, and a node revisiting an identity
    /// already on its active render path fails with
    /// [`RenderError::CircularReference`].
    pub fn render(&self, partial: Partial) -> Result<Html, RenderError> {
        let mut active = Vec::new();
        self.render_tree(partial, &mut active)
    }

    /// Render according to the request's partial-target protocol: either the
    /// full page or exactly one named subtree plus its out-of-band fragments.
    pub fn render_with_request(
        &self,
        mut partial: Partial,
        request: &RequestContext,
    ) -> Result<Html, RenderError> {
        if request.uri.is_some() {
            partial.uri = request.uri.clone();
        }
        self.resolve(partial, request)
    }

    fn resolve(&self, mut partial: Partial, request: &RequestContext) -> Result<Html, RenderError> {
        let mut request = request;
        let stripped;

        if let Some(target) = request.effective_target() {
            if let Some(mut child) = partial.children.remove(target) {
                // The target lives directly under this node: render only that
                // subtree and bypass the parent entirely. The target is spent
                // here, so drop it before descending or the child's own slots
                // would re-run target resolution.
                child.inherit_from(&partial);
                child.merge_funcs(&partial.functions);
                return self.render_fragment(child, &request.without_target());
            }

            if partial.id != target {
                return Err(RenderError::PartialNotFound {
                    requested: target.to_string(),
                    actual: partial.id,
                });
            }

            // This node is the target itself; fall through to a full render of
            // it, dropping the target so descendants render their slots.
            stripped = request.without_target();
            request = &stripped;
        }

        self.render_children(&mut partial, request);

        if !request.render_partial() {
            if let Some(wrapper) = partial.wrapper.take() {
                // Detach before delegating so the wrapper cannot loop back.
                let mut wrapper = *wrapper;
                wrapper.adopt(partial);
                return self.resolve(wrapper, request);
            }
        }

        execute(&self.cache, &self.config, &partial)
    }

    /// Render all non-out-of-band children into the node's fragment cache.
    /// A failing child is replaced by its error text inline so the rest of
    /// the page still renders; only the node's own render failures propagate.
    fn render_children(&self, partial: &mut Partial, request: &RequestContext) {
        let children = std::mem::take(&mut partial.children);
        for (id, mut child) in children {
            if partial.oob_children.contains(&id) {
                // left in place for the fragment path to append out of band
                partial.children.insert(id, child);
                continue;
            }
            child.inherit_from(partial);
            let fragment = match self.resolve(child, request) {
                Ok(html) => html,
                Err(err) => Html::from(err.to_string()),
            };
            partial.partials.insert(id, fragment);
        }
    }

    /// Render a partial-target subtree: its slots, its own template, then its
    /// out-of-band children appended to the output. A failing out-of-band
    /// fragment is dropped from the response.
    fn render_fragment(
        &self,
        mut partial: Partial,
        request: &RequestContext,
    ) -> Result<Html, RenderError> {
        let oob: Vec<String> = partial.oob_children.iter().cloned().collect();
        self.render_children(&mut partial, request);

        let mut output = execute(&self.cache, &self.config, &partial)?;

        for id in oob {
            let Some(mut child) = partial.children.remove(&id) else {
                continue;
            };
            child.inherit_from(&partial);
            child.merge_funcs(&partial.functions);
            match self.render_fragment(child, request) {
                Ok(fragment) => output.append(&fragment),
                Err(err) => log::warn!("dropping out-of-band fragment '{id}': {err}"),
            }
        }

        Ok(output)
    }

    /// Request-less full-tree recursion with the cycle guard threaded through.
    fn render_tree(&self, mut partial: Partial, active: &mut Vec<String>) -> Result<Html, RenderError> {
        if active.iter().any(|id| *id == partial.id) {
            return Err(RenderError::CircularReference(partial.id));
        }
        active.push(partial.id.clone());

        let children = std::mem::take(&mut partial.children);
        let mut oob = Vec::new();
        for (id, mut child) in children {
            child.inherit_from(&partial);
            if partial.oob_children.contains(&id) {
                oob.push(child);
                continue;
            }
            let fragment = self.render_tree(child, active)?;
            partial.partials.insert(id, fragment);
        }

        let mut output = execute(&self.cache, &self.config, &partial)?;

        for child in oob {
            let fragment = self.render_tree(child, active)?;
            output.append(&fragment);
        }

        active.pop();
        Ok(output)
    }

    #[cfg(test)]
    pub(crate) fn cached_parses(&self) -> usize {
        self.cache.len()
    }
}
