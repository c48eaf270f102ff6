pub mod env;
mod loader;

pub use env::{ApiConfig, AppConfig, ChatConfig, ConfigError, DirectoryConfig, PageSource};
pub use loader::load_config;
