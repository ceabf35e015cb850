//! Kiln CLI: compile LLL, Serpent and Solidity contracts through the
//! content-addressed cache.
//!
//! Provides `kiln compile` for one or more source files, `kiln clean` for
//! emptying language caches, and `kiln languages` for inspecting the
//! configured registry.

#![warn(missing_docs)]

mod clean;
mod compile;
mod languages;
mod pipeline;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Kiln: cached smart-contract compilation.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Cached smart-contract compiler front end")]
pub struct Cli {
    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored log output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `kiln.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile one or more source files.
    Compile(CompileArgs),
    /// Remove cached artifacts.
    Clean {
        /// Only clear this language's cache (e.g. `sol`).
        #[arg(short, long)]
        lang: Option<String>,
    },
    /// List the configured languages.
    Languages,
}

/// Arguments for the `kiln compile` subcommand.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Source files; the language is chosen by extension.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Library addresses, or `@<file>` to read them from a file.
    #[arg(long)]
    pub libs: Option<String>,

    /// Ask the compiler to optimize.
    #[arg(long)]
    pub optimize: bool,

    /// Compile with the local compilers even if a remote URL is configured.
    #[arg(long, conflicts_with = "url")]
    pub local: bool,

    /// Send every compile to this remote service.
    #[arg(long)]
    pub url: Option<String>,

    /// Print each response as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Compile(ref args) => compile::run(args, &global),
        Command::Clean { ref lang } => clean::run(lang.as_deref(), &global),
        Command::Languages => languages::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Default log level when `RUST_LOG` is unset.
fn default_level(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(global)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn global(quiet: bool, verbose: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose,
            color: false,
            config: None,
        }
    }

    #[test]
    fn parse_compile_default() {
        let cli = Cli::parse_from(["kiln", "compile", "Token.sol"]);
        match cli.command {
            Command::Compile(ref args) => {
                assert_eq!(args.files, vec!["Token.sol"]);
                assert!(args.libs.is_none());
                assert!(!args.optimize);
                assert!(!args.local);
                assert!(args.url.is_none());
                assert!(!args.json);
            }
            _ => panic!("expected Compile command"),
        }
    }

    #[test]
    fn parse_compile_with_args() {
        let cli = Cli::parse_from([
            "kiln",
            "compile",
            "a.sol",
            "b.lll",
            "--libs",
            "@libs.txt",
            "--optimize",
            "--url",
            "http://compilers.local/compile",
            "--json",
        ]);
        match cli.command {
            Command::Compile(ref args) => {
                assert_eq!(args.files, vec!["a.sol", "b.lll"]);
                assert_eq!(args.libs.as_deref(), Some("@libs.txt"));
                assert!(args.optimize);
                assert_eq!(args.url.as_deref(), Some("http://compilers.local/compile"));
                assert!(args.json);
            }
            _ => panic!("expected Compile command"),
        }
    }

    #[test]
    fn compile_requires_a_file() {
        assert!(Cli::try_parse_from(["kiln", "compile"]).is_err());
    }

    #[test]
    fn local_conflicts_with_url() {
        let parsed = Cli::try_parse_from([
            "kiln", "compile", "a.se", "--local", "--url", "http://x/",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_clean() {
        let cli = Cli::parse_from(["kiln", "clean"]);
        assert!(matches!(cli.command, Command::Clean { lang: None }));

        let cli = Cli::parse_from(["kiln", "clean", "--lang", "sol"]);
        match cli.command {
            Command::Clean { lang } => assert_eq!(lang.as_deref(), Some("sol")),
            _ => panic!("expected Clean command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["kiln", "--quiet", "--color", "never", "languages"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert!(matches!(cli.command, Command::Languages));
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["kiln", "--config", "/path/to/kiln.toml", "languages"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/kiln.toml"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["kiln", "compile", "a.lll", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn log_level_follows_flags() {
        assert_eq!(default_level(&global(false, false)), "warn");
        assert_eq!(default_level(&global(false, true)), "debug");
        assert_eq!(default_level(&global(true, true)), "error");
    }
}
