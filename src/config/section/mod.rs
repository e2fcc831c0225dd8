//! Configuration sections of `plantlink.toml`.

mod render;
mod serve;

pub use render::RenderConfig;
pub use serve::ServeConfig;
