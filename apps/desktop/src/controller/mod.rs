//! Controller layer: one page controller per screen, the state they share
//! and the UI events they emit.

pub mod chat;
pub mod chat_list;
pub mod context;
pub mod events;
pub mod login;
pub mod navigation;
pub mod register;

pub use chat::ChatPage;
pub use chat_list::ChatListPage;
pub use context::PageContext;
pub use login::LoginPage;
pub use navigation::Page;
pub use register::RegisterPage;

#[cfg(test)]
#[path = "tests/pages_tests.rs"]
mod tests;
