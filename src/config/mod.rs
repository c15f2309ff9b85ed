// src/config/mod.rs

//! Configuration loading and validation for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate paths, ports, watch rules and custom tasks (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_optional};
pub use model::{
    ConfigFile, CssSection, HtmlSection, ImagesSection, ManifestSection, RawConfigFile,
    ScriptsSection, ServeSection, SiteSection, TaskConfig, ToolsSection, WatchRuleConfig,
    default_watch_rules,
};
