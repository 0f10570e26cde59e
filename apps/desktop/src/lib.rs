//! Desktop chat client: the backend bridge, page controllers and their
//! terminal presentation.

pub mod backend_bridge;
pub mod config;
pub mod controller;
pub mod ui;
