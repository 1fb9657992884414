pub mod config;
pub mod errors;
pub mod partial;
pub mod render;
pub mod request;
pub mod response;
pub mod swap;
pub mod trigger;

mod template;

pub use config::{template_fn, FuncMap, RenderConfig, TemplateFunction, DEFAULT_PARTIAL_HEADER};
pub use errors::RenderError;
pub use partial::Partial;
pub use render::Renderer;
pub use request::{HxRequest, RequestContext};
pub use response::{HxResponse, HxResponseKey, LocationInput};
pub use swap::{Swap, SwapDirection, SwapStyle};
pub use template::Html;
pub use trigger::{NotificationLevel, Trigger};
