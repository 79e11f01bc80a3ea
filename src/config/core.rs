use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};

// Embed the default config at compile time
pub const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

pub const ENV_PREFIX: &str = "SEOSCAN_";

/// Layered configuration sources, lowest priority first.
pub fn figment(custom_config: Option<&str>) -> Result<Figment> {
    let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG)); // Embedded defaults

    // User config - support multiple formats
    if let Some(user) = user_config_path() {
        figment = figment
            .merge(Toml::file(&user))
            .merge(Json::file(user.with_extension("json")))
            .merge(Yaml::file(user.with_extension("yaml")))
            .merge(Yaml::file(user.with_extension("yml")));
    }

    // Repository config - support multiple formats
    figment = figment
        .merge(Toml::file("seoscan.toml"))
        .merge(Json::file("seoscan.json"))
        .merge(Yaml::file("seoscan.yaml"))
        .merge(Yaml::file("seoscan.yml"));

    if let Some(custom_path) = custom_config {
        figment = merge_custom(figment, Path::new(custom_path))?;
    }

    // Environment variables always have highest priority
    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

fn merge_custom(figment: Figment, path: &Path) -> Result<Figment> {
    if !path.is_file() {
        bail!("Config file not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let figment = match extension.as_deref() {
        Some("json") => figment.merge(Json::file(path)),
        Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
        Some("toml") | None => figment.merge(Toml::file(path)),
        Some(other) => bail!("Unsupported config format '.{}' for {}", other, path.display()),
    };
    Ok(figment)
}

fn user_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(".config").join("seoscan").join("config.toml"))
}
