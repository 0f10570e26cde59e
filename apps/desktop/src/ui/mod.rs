//! Terminal presentation of page events.

pub mod renderer;

pub use renderer::spawn_renderer;
