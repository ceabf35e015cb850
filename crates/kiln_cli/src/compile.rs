//! `kiln compile`: compile source files through the cache.

use std::fmt::Write as _;
use std::path::Path;

use kiln_common::Response;
use kiln_compile::{Dispatcher, RequestOptions};
use rayon::prelude::*;

use crate::pipeline::{read_libraries, setup};
use crate::{CompileArgs, GlobalArgs};

/// Runs the `kiln compile` command.
///
/// Files are compiled in parallel. Returns exit code 1 if any file failed to
/// compile or could not be dispatched.
pub fn run(args: &CompileArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut setup = setup(global)?;
    for language in setup.registry.iter_mut() {
        if args.local {
            language.remote_url = None;
        } else if let Some(url) = &args.url {
            language.remote_url = Some(url.clone());
        }
    }

    let options = RequestOptions {
        libraries: read_libraries(args.libs.as_deref())?,
        optimize: args.optimize,
    };
    let dispatcher = Dispatcher::new(&setup.registry, setup.config.timeout());

    let results: Vec<_> = args
        .files
        .par_iter()
        .map(|file| (file, dispatcher.compile_file(Path::new(file), &options)))
        .collect();

    let mut code = 0;
    for (file, result) in results {
        match result {
            Ok(response) => {
                if response.is_failure() {
                    code = 1;
                }
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                } else if response.is_failure() {
                    eprintln!("{file}: compilation failed\n{}", response.error);
                } else {
                    print!("{}", render(file, &response));
                }
            }
            Err(e) => {
                eprintln!("error: {file}: {e}");
                code = 1;
            }
        }
    }
    Ok(code)
}

/// Formats a successful response for the terminal.
fn render(file: &str, response: &Response) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{file}");
    for item in &response.objects {
        let _ = writeln!(out, "  {}", item.object_name);
        let _ = writeln!(out, "    bytecode: {}", item.bytecode);
        if !item.abi.is_empty() {
            let _ = writeln!(out, "    abi:      {}", item.abi);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_common::ResponseItem;

    #[test]
    fn render_lists_every_object() {
        let response = Response::success(vec![
            ResponseItem {
                object_name: "Token".to_string(),
                bytecode: "6060".to_string(),
                abi: "[]".to_string(),
            },
            ResponseItem {
                object_name: "main".to_string(),
                bytecode: "6001".to_string(),
                abi: String::new(),
            },
        ]);
        let text = render("a.sol", &response);
        assert_eq!(
            text,
            "a.sol\n  Token\n    bytecode: 6060\n    abi:      []\n  main\n    bytecode: 6001\n"
        );
    }
}
