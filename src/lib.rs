pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod forms;
pub mod logtree;
pub mod models;
pub mod notify;
pub mod poll;
pub mod tui;
pub mod ui;
pub mod utils;
