pub mod app;
pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod flash;
pub mod forms;
pub mod posts;
pub mod state;
pub mod users;
pub mod views;
