//! Shared fixtures: a scripted stand-in for the external compilers and a
//! one-shot HTTP responder.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;

use kiln_lang::Registry;

/// Shell script that logs each run to `counter` and prints the hex bytes
/// of the last file argument, like a blob-style compiler would.
pub const HEX_COMPILER: &str = r#"echo run >> "$KILN_TEST_COUNTER"
for last; do :; done
od -An -tx1 "$last" | tr -d ' \n'
"#;

/// Shell script that names its last argument in a diagnostic and fails.
pub const FAILING_COMPILER: &str = r#"echo run >> "$KILN_TEST_COUNTER"
for last; do :; done
echo "$last:1:1: syntax error" >&2
exit 1
"#;

/// Shell script emitting combined JSON for two contracts.
pub const COMBINED_COMPILER: &str = r#"echo run >> "$KILN_TEST_COUNTER"
printf '{"contracts":{"a.sol:Token":{"bin":"6060","abi":"[]"},"b.sol:Math":{"bin":"6070","abi":[{"type":"function"}]}}}'
"#;

/// A registry rooted in `cache_root` whose `language` runs `script` via sh.
///
/// The script body is written next to the counter file; `counter` receives
/// one line per invocation.
pub fn scripted_registry(
    cache_root: &Path,
    language: &str,
    script: &str,
    counter: &Path,
) -> Registry {
    let script_path = cache_root.join(format!("fake-{language}.sh"));
    let body = script.replace("$KILN_TEST_COUNTER", &counter.display().to_string());
    std::fs::create_dir_all(cache_root).unwrap();
    std::fs::write(&script_path, body).unwrap();

    let mut registry = Registry::with_defaults(&cache_root.join("cache")).unwrap();
    let lang = registry.get_mut(language).unwrap();
    lang.command = vec![
        "sh".to_string(),
        script_path.display().to_string(),
        kiln_lang::ARGS_PLACEHOLDER.to_string(),
    ];
    registry
}

/// Number of times the scripted compiler ran.
pub fn invocations(counter: &Path) -> usize {
    std::fs::read_to_string(counter)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

/// A listener that answers exactly one request.
pub struct OneShot {
    /// URL to post to.
    pub url: String,
    handle: JoinHandle<String>,
}

impl OneShot {
    /// Replies to the first request with `status` and `body`.
    pub fn reply(status: u16, body: &str) -> Self {
        Self::spawn(status, body.to_string(), None)
    }

    /// Accepts the first request but waits `delay` before replying.
    pub fn stall(delay: Duration) -> Self {
        Self::spawn(200, "{}".to_string(), Some(delay))
    }

    fn spawn(status: u16, body: String, delay: Option<Duration>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/compile", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut received = vec![0u8; content_length];
            reader.read_exact(&mut received).unwrap();

            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            let mut stream = stream;
            let reply = format!(
                "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            // The client may have hung up already after a timeout.
            let _ = stream.write_all(reply.as_bytes());
            String::from_utf8(received).unwrap()
        });
        Self { url, handle }
    }

    /// Waits for the exchange and returns the request body received.
    pub fn received(self) -> String {
        self.handle.join().unwrap()
    }
}

/// Writes `content` to `dir/name` and returns the path.
pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
