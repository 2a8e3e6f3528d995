pub mod board;
pub mod catalog;
pub mod model;
pub mod notify;
pub mod parse;
pub mod session;
pub mod store;
pub mod transfer;
pub mod tui_shell;
