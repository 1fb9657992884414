#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no templates provided for rendering partial '{0}'")]
    NoTemplates(String),

    #[error("circular reference detected at partial '{0}'")]
    CircularReference(String),

    #[error("partial '{requested}' not found, got '{actual}'")]
    PartialNotFound { requested: String, actual: String },

    #[error("failed to read template '{path}'")]
    TemplateRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Template(#[from] minijinja::Error),
}
