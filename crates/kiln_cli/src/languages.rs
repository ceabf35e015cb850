//! `kiln languages`: show the configured registry.

use kiln_lang::{LanguageConfig, Registry};

use crate::pipeline::setup;
use crate::GlobalArgs;

/// Runs the `kiln languages` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let setup = setup(global)?;
    print!("{}", table(&setup.registry));
    Ok(0)
}

fn mode(language: &LanguageConfig) -> String {
    match &language.remote_url {
        Some(url) => format!("remote {url}"),
        None => format!("local {}", language.command.first().map_or("", String::as_str)),
    }
}

fn table(registry: &Registry) -> String {
    let mut out = String::new();
    for language in registry.iter() {
        let extensions = language
            .extensions
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            "{:<4} {:<9} {:<12} {}\n     cache: {}\n",
            language.key,
            language.name,
            extensions,
            mode(language),
            language.cache_dir.display()
        ));
    }
    out
}
