//! `kiln clean`: empty language caches.

use kiln_compile::Dispatcher;

use crate::pipeline::setup;
use crate::GlobalArgs;

/// Runs the `kiln clean` command for one language, or all when `lang` is
/// `None`.
pub fn run(lang: Option<&str>, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let setup = setup(global)?;
    let dispatcher = Dispatcher::new(&setup.registry, setup.config.timeout());
    let removed = dispatcher.clear_cache(lang)?;

    if !global.quiet {
        let scope = lang.unwrap_or("all languages");
        eprintln!("     Removed {removed} cache entries ({scope})");
    }
    Ok(0)
}
