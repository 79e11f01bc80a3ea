//! Integration tests for the seoscan CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::TempDir;

/// Command running inside `dir` with no user config, proxies or RUST_LOG.
fn seoscan(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("seoscan").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("RUST_LOG")
        .env_remove("SEOSCAN_PARALLEL__MAX_WORKERS")
        .env_remove("SEOSCAN_PARALLEL__THREAD_PERCENTAGE");
    for proxy in ["http_proxy", "HTTP_PROXY", "https_proxy", "HTTPS_PROXY", "all_proxy", "ALL_PROXY"] {
        cmd.env_remove(proxy);
    }
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "invalid JSON ({e}): {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

/// Serve `body` with a 200 to the next `connections` requests.
fn serve(body: &'static str, connections: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming().take(connections) {
            let Ok(mut stream) = stream else { continue };
            let mut buf = [0_u8; 4096];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("keywords"))
        .stdout(predicate::str::contains("--workers"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("seoscan"));
}

/// Test invalid subcommand shows error
#[test]
fn test_invalid_subcommand() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_workers_reports_resolved_count() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .arg("workers")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workers:"));

    let json = stdout_json(seoscan(&dir).args(["--format", "json", "workers"]));
    let units = json["available_units"].as_u64().unwrap();
    let workers = json["workers"].as_u64().unwrap();
    assert!(workers >= 1);
    assert_eq!(workers, std::cmp::max(1, units * 75 / 100));
}

#[test]
fn test_workers_flag_overrides_policy() {
    let dir = TempDir::new().unwrap();
    let json = stdout_json(seoscan(&dir).args(["--format", "json", "--workers", "3", "workers"]));
    assert_eq!(json["workers"], 3);
}

#[test]
fn test_env_overrides_worker_cap() {
    let dir = TempDir::new().unwrap();
    let json = stdout_json(
        seoscan(&dir)
            .env("SEOSCAN_PARALLEL__MAX_WORKERS", "2")
            .args(["--format", "json", "workers"]),
    );
    assert_eq!(json["max_workers"], 2);
    assert_eq!(json["workers"], 2);
}

#[test]
fn test_zero_or_negative_workers_rejected() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .args(["--workers", "0", "keywords", "--text", "a b c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));

    seoscan(&dir)
        .args(["--workers", "-4", "workers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
}

#[test]
fn test_keywords_from_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("sample.txt"), "a a a b b c").unwrap();

    let json = stdout_json(seoscan(&dir).args(["--format", "json", "keywords", "sample.txt"]));
    assert_eq!(json[0]["status"], "success");
    assert_eq!(
        json[0]["keywords"],
        serde_json::json!([
            {"keyword": "a", "count": 3},
            {"keyword": "b", "count": 2},
            {"keyword": "c", "count": 1},
        ])
    );

    seoscan(&dir)
        .args(["keywords", "sample.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sample.txt"))
        .stdout(predicate::str::contains("Texts analyzed:"));
}

#[test]
fn test_keywords_preserve_submission_order() {
    let dir = TempDir::new().unwrap();
    let texts: Vec<String> = (0..12).map(|i| format!("word{i} word{i} filler")).collect();

    let mut cmd = seoscan(&dir);
    cmd.args(["--format", "json", "--workers", "4", "keywords"]);
    for text in &texts {
        cmd.args(["--text", text.as_str()]);
    }
    let json = stdout_json(&mut cmd);

    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 12);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry["source"], format!("text #{}", i + 1));
        assert_eq!(entry["keywords"][0]["keyword"], format!("word{i}"));
    }
}

#[test]
fn test_keywords_seo_tokenizer_and_top() {
    let dir = TempDir::new().unwrap();
    let json = stdout_json(seoscan(&dir).args([
        "--format",
        "json",
        "keywords",
        "--tokenizer",
        "seo",
        "--top",
        "1",
        "--text",
        "The crawler's crawler isn't the crawler you'd expect",
    ]));
    assert_eq!(json[0]["keywords"], serde_json::json!([{"keyword": "crawler", "count": 3}]));
}

#[test]
fn test_keywords_partial_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ok.txt"), "fine text").unwrap();

    let json = stdout_json(seoscan(&dir).args([
        "--format",
        "json",
        "keywords",
        "ok.txt",
        "missing.txt",
    ]));
    assert_eq!(json[0]["status"], "success");
    assert_eq!(json[1]["status"], "error");
    assert!(json[1]["error"].as_str().unwrap().contains("missing.txt"));

    seoscan(&dir)
        .args(["keywords", "ok.txt", "missing.txt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("missing.txt"));
}

#[test]
fn test_keywords_all_failed_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .args(["keywords", "missing-1.txt", "missing-2.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("all 2 tasks failed"));
}

#[test]
fn test_keywords_without_input_fails() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .arg("keywords")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to analyze"));
}

#[test]
fn test_config_show_defaults() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[parallel]"))
        .stdout(predicate::str::contains("thread_percentage = 75"));
}

#[test]
fn test_config_show_merges_repository_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("seoscan.toml"),
        "[keywords]\ntokenizer = \"seo\"\ntop_n = 4\n",
    )
    .unwrap();

    let json = stdout_json(seoscan(&dir).args(["--format", "json", "config", "show"]));
    assert_eq!(json["keywords"]["tokenizer"], "seo");
    assert_eq!(json["keywords"]["top_n"], 4);
    assert_eq!(json["http"]["timeout_secs"], 10);
}

#[test]
fn test_config_custom_file_and_validation() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.yaml");
    fs::write(&good, "sitemap:\n  max_pages: 5\n").unwrap();
    seoscan(&dir)
        .arg("--config")
        .arg(&good)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "[parallel]\nthread_percentage = 150\n").unwrap();
    seoscan(&dir)
        .arg("--config")
        .arg(&bad)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("thread_percentage"));

    seoscan(&dir)
        .args(["--config", "nope.toml", "workers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_pages_success_and_error_payloads() {
    let dir = TempDir::new().unwrap();
    let live = serve("<html/>", 1);
    let dead = closed_port_url();

    let json = stdout_json(
        seoscan(&dir).args(["--format", "json", "pages", live.as_str(), dead.as_str()]),
    );
    assert_eq!(json[0]["url"], live);
    assert_eq!(json[0]["status"], "success");
    assert_eq!(json[0]["content"], "<html/>");
    assert_eq!(json[1]["url"], dead);
    assert_eq!(json[1]["status"], "error");
    assert!(json[1]["error"].as_str().unwrap().len() > 0);
}

#[test]
fn test_pages_all_failed_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .args(["pages", closed_port_url().as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("all 1 tasks failed"));
}

#[test]
fn test_pages_audit_from_url_file() {
    let dir = TempDir::new().unwrap();
    let url = serve(
        "<html><head><title>Short</title></head><body><h1>Hello</h1><img src=\"x.png\"></body></html>",
        1,
    );
    fs::write(dir.path().join("urls.txt"), format!("# seeds\n{url}\n{url}\n")).unwrap();

    let json = stdout_json(seoscan(&dir).args([
        "--format",
        "json",
        "pages",
        "--url-file",
        "urls.txt",
        "--audit",
    ]));
    let pages = json.as_array().unwrap();
    assert_eq!(pages.len(), 1);
    let audit = &pages[0]["audit"];
    assert_eq!(audit["title"], "Short");
    assert_eq!(audit["h1_count"], 1);
    assert_eq!(audit["images_missing_alt"], 1);
    assert_eq!(audit["score"], 10);
}

#[test]
fn test_pages_report_dir_writes_csv_and_html() {
    let dir = TempDir::new().unwrap();
    let url = serve("<html><head><title>Report &amp; Co</title></head><body><h1>Hi</h1></body></html>", 1);
    let missing = closed_port_url();

    seoscan(&dir)
        .args(["pages", &url, &missing, "--audit", "--report-dir", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CSV report:"));

    let csv = fs::read_to_string(dir.path().join("out/seo_report_127.0.0.1.csv")).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("url,status,error,score,title"));
    let first = lines.next().unwrap();
    assert!(first.contains("success"));
    assert!(first.contains("Report & Co"));
    assert!(lines.next().unwrap().contains(",error,"));

    let html = fs::read_to_string(dir.path().join("out/seo_report_127.0.0.1.html")).unwrap();
    assert!(html.contains("Report &amp; Co"));
    assert_eq!(html.matches("<tr class=\"error\">").count(), 1);
}

#[test]
fn test_verbose_writes_log_file() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .args(["-v", "keywords", "--text", "logging check"])
        .assert()
        .success();

    let log = fs::read_to_string(dir.path().join("seoscan.log")).unwrap();
    assert!(log.contains("Extracting keywords"));
}

#[test]
fn test_quiet_suppresses_output() {
    let dir = TempDir::new().unwrap();
    seoscan(&dir)
        .args(["-q", "keywords", "--text", "silent run"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
