pub mod app;
pub mod cache;
pub mod chain;
pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod pokeapi;
pub mod store;
pub mod tui;
