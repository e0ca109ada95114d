//! Runtime configuration: built-in defaults, then an optional
//! `rusty-blog.toml`, then `RUSTY_BLOG_*` environment variables.

use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use rb_core::BlogSettings;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "rusty-blog";
pub const ENV_PREFIX: &str = "RUSTY_BLOG";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub port: u16,
    pub database_url: String,
    pub media_root: PathBuf,
    /// URL prefix uploaded files are served under
    pub media_url: String,
    pub static_root: PathBuf,
    pub page_size: usize,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    pub invalidate_cache_on_write: bool,
    pub login_url: String,
    pub max_upload_bytes: usize,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("bind_addr", "127.0.0.1")?
        .set_default("port", 8080)?
        .set_default("database_url", "sqlite:rusty_blog.db")?
        .set_default("media_root", "./media")?
        .set_default("media_url", "/media")?
        .set_default("static_root", "./static")?
        .set_default("page_size", 10)?
        .set_default("cache_ttl_secs", 20)?
        .set_default("cache_capacity", 1024)?
        .set_default("invalidate_cache_on_write", false)?
        .set_default("login_url", "/auth/login/")?
        .set_default("max_upload_bytes", 5 * 1024 * 1024)
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// The part of the configuration the engine cares about.
    pub fn blog_settings(&self) -> BlogSettings {
        BlogSettings {
            page_size: self.page_size,
            invalidate_cache_on_write: self.invalidate_cache_on_write,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}
