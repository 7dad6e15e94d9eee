pub mod config_service;
pub mod paths;
pub mod scripted_source;
pub mod storage;
pub mod toml_recent_handles_repository;

pub use crate::config_service::ConfigService;
pub use crate::paths::LiveFeedPaths;
pub use crate::scripted_source::ScriptedSource;
pub use crate::toml_recent_handles_repository::TomlRecentHandlesRepository;
