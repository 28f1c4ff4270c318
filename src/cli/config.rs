//! Config command - print the effective configuration

use anyhow::{Context, Result};
use autosubmit::config::{CommentKind, default_config_path, load_config};
use std::path::Path;

/// Print the configuration `run` would use, templates included
pub fn run_show_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let source = config_path
        .map(Path::to_path_buf)
        .or_else(default_config_path)
        .filter(|p| p.exists());

    match source {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# no config file found, using defaults"),
    }
    let rendered = toml::to_string_pretty(&config).context("failed to render config")?;
    println!("{rendered}");

    println!("# comment templates");
    for kind in CommentKind::ALL {
        println!("# {}: {}", kind.file_name(), config.templates.get(kind).trim_end());
    }
    Ok(())
}
