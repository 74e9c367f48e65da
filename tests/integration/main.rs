//! Integration tests for relcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::path::Path;
    use std::thread;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    /// Command isolated from the user's config and state
    fn relcache(state: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("relcache");
        cmd.env_remove("RELCACHE_SOURCE_URL")
            .env_remove("RELCACHE_CACHE_FILE")
            .env_remove("RELCACHE_ARTIFACT_DIR")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(state.path().join("config.toml"))
            .arg("--state-dir")
            .arg(state.path());
        cmd
    }

    fn write_store(state: &TempDir, content: &str) {
        std::fs::write(state.path().join("cache.json"), content).unwrap();
    }

    fn read_store(state: &TempDir) -> serde_json::Value {
        let content = std::fs::read_to_string(state.path().join("cache.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    fn write_artifact(dir: &Path, name: &str, body: &[u8]) {
        let artifacts = dir.join("artifacts");
        std::fs::create_dir_all(&artifacts).unwrap();
        std::fs::write(artifacts.join(format!("{}.txt", name)), body).unwrap();
    }

    /// Serve `body` to exactly one request, then stop listening
    fn serve_once(body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(body);
            }
        });

        format!("http://{}/release-notes.txt", addr)
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("relcache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Commit-keyed build cache for externally hosted release notes",
            ));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("relcache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("relcache"));
    }

    #[test]
    fn fresh_fetch_then_cached_replay() {
        let state = TempDir::new().unwrap();
        let source = serve_once(b"hello");

        relcache(&state)
            .args(["resolve", "abc123", "--source", &source, "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"outcome\": \"fresh\""))
            .stdout(predicate::str::contains(HELLO_SHA256));

        assert_eq!(read_store(&state)["abc123"], HELLO_SHA256);
        let artifact = state.path().join("artifacts").join(format!("{}.txt", HELLO_SHA256));
        assert_eq!(std::fs::read(artifact).unwrap(), b"hello");

        // The server is gone; a second fetch would fail
        relcache(&state)
            .args(["resolve", "abc123", "--source", &source, "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"outcome\": \"cached\""));
    }

    #[test]
    fn workspace_layout_from_env() {
        let state = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        let source = serve_once(b"hello");

        relcache(&state)
            .current_dir(workspace.path())
            .env("RELCACHE_CACHE_FILE", "cache/cache.json")
            .env("RELCACHE_ARTIFACT_DIR", "releases")
            .args(["resolve", "abc123", "--source", &source, "--format", "plain"])
            .assert()
            .success()
            .stdout(format!("{}\n", HELLO_SHA256));

        let content = std::fs::read_to_string(workspace.path().join("cache/cache.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["abc123"], HELLO_SHA256);
        let artifact = workspace.path().join("releases").join(format!("{}.txt", HELLO_SHA256));
        assert_eq!(std::fs::read(artifact).unwrap(), b"hello");
        assert!(!state.path().join("cache.json").exists());
    }

    #[test]
    fn resolved_entry_replays_without_source() {
        let state = TempDir::new().unwrap();
        write_store(&state, &format!("{{\"abc123\": \"{}\"}}", HELLO_SHA256));
        write_artifact(state.path(), HELLO_SHA256, b"hello");

        relcache(&state)
            .args(["resolve", "abc123", "--format", "plain"])
            .assert()
            .success()
            .stdout(format!("{}\n", HELLO_SHA256));
    }

    #[test]
    fn emit_copies_artifact() {
        let state = TempDir::new().unwrap();
        write_store(&state, &format!("{{\"abc123\": \"{}\"}}", HELLO_SHA256));
        write_artifact(state.path(), HELLO_SHA256, b"hello");
        let dest = state.path().join("dist").join("NOTES.txt");

        relcache(&state)
            .args(["resolve", "abc123", "--emit"])
            .arg(&dest)
            .assert()
            .success();

        assert_eq!(std::fs::read(dest).unwrap(), b"hello");
    }

    #[test]
    fn unavailable_entry_exits_with_replay_code() {
        let state = TempDir::new().unwrap();
        write_store(&state, r#"{"abc123": null}"#);

        relcache(&state)
            .args(["resolve", "abc123", "--source", "http://127.0.0.1:1/notes.txt"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Unavailable:"))
            .stderr(predicate::str::contains("unavailable for commit abc123"));
    }

    #[test]
    fn allow_unavailable_succeeds() {
        let state = TempDir::new().unwrap();
        write_store(&state, r#"{"abc123": null}"#);

        relcache(&state)
            .args(["resolve", "abc123", "--allow-unavailable"])
            .assert()
            .success();
    }

    #[test]
    fn unreachable_source_records_unavailable() {
        let state = TempDir::new().unwrap();

        relcache(&state)
            .args([
                "resolve",
                "abc123",
                "--source",
                "http://127.0.0.1:1/notes.txt",
                "--max-attempts",
                "2",
                "--initial-backoff-ms",
                "1",
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("after 2 attempt(s)"));

        assert!(read_store(&state)["abc123"].is_null());
    }

    #[test]
    fn corrupt_store_is_fatal() {
        let state = TempDir::new().unwrap();
        write_store(&state, "{not json");

        relcache(&state)
            .args(["resolve", "abc123", "--source", "http://127.0.0.1:1/notes.txt"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("corrupt"));

        let content = std::fs::read_to_string(state.path().join("cache.json")).unwrap();
        assert_eq!(content, "{not json");
    }

    #[test]
    fn unresolved_without_source_fails() {
        let state = TempDir::new().unwrap();

        relcache(&state)
            .args(["resolve", "abc123"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("No release notes source configured"));
    }

    #[test]
    fn lookup_unknown_commit() {
        let state = TempDir::new().unwrap();

        relcache(&state)
            .args(["lookup", "deadbeef", "--format", "plain"])
            .assert()
            .success()
            .stdout("unresolved\n");
    }

    #[test]
    fn list_as_json() {
        let state = TempDir::new().unwrap();
        write_store(
            &state,
            &format!("{{\"abc123\": \"{}\", \"def456\": null}}", HELLO_SHA256),
        );

        let output = relcache(&state)
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json[0]["commit"], "abc123");
        assert_eq!(json[0]["state"], "resolved");
        assert_eq!(json[1]["commit"], "def456");
        assert_eq!(json[1]["state"], "unavailable");
    }

    #[test]
    fn artifact_verify_detects_tampering() {
        let state = TempDir::new().unwrap();
        write_artifact(state.path(), HELLO_SHA256, b"tampered");

        relcache(&state)
            .args(["artifact", HELLO_SHA256, "--verify"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("does not match"));
    }

    #[test]
    fn config_set_then_show() {
        let state = TempDir::new().unwrap();

        relcache(&state)
            .args(["config", "set", "retry.max_attempts", "3"])
            .assert()
            .success();

        relcache(&state)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("max_attempts = 3"));
    }

    #[test]
    fn config_path() {
        let state = TempDir::new().unwrap();

        relcache(&state)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn completions_generate() {
        cargo_bin_cmd!("relcache")
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("relcache"));
    }
}
