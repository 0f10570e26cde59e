//! The `invoke` bridge: named backend commands with JSON arguments, as sent
//! by the page layer or typed in on the command line.

pub mod commands;
pub mod runtime;

pub use commands::BackendCommand;
pub use runtime::{invoke, parse_command};
