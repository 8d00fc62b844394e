pub mod app;
pub mod cli;
pub mod config;
pub mod search;
pub mod storage;
pub mod store;
pub mod ui;
pub mod undo;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use store::{Item, ItemId, ItemStore, StoreError};
