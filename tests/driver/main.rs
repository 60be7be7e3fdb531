//! Integration tests for the benchmark driver
//!
//! These run whole benchmarks (all strategies in sequence) against a mock
//! server and check the console report and the output directories.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};

use httpmock::prelude::*;
use tempfile::TempDir;

use fetch_bench::app::{BenchConfig, Driver, Reporter, StrategyKind};

/// Writer that keeps everything the reporter prints
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn image_server() -> MockServer {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/images/image1.jpg");
        then.status(200).body(b"one");
    });
    server.mock(|when, then| {
        when.method(GET).path("/images/image2.jpg");
        then.status(200).body(b"two");
    });
    server.mock(|when, then| {
        when.method(GET).path("/images/missing.jpg");
        then.status(500);
    });
    server
}

#[test]
fn test_full_benchmark_writes_every_directory() {
    let server = image_server();
    let temp = TempDir::new().unwrap();
    let config = BenchConfig::new(vec![
        server.url("/images/image1.jpg"),
        server.url("/images/image2.jpg"),
    ])
    .with_output_root(temp.path())
    .with_worker_program(env!("CARGO_BIN_EXE_fetch_bench"));

    let summary = Driver::new(config, Reporter::new(io::sink())).run();

    assert!(summary.all_ran());
    let order: Vec<_> = summary.reports.iter().map(|r| r.strategy).collect();
    assert_eq!(order, StrategyKind::ALL.to_vec());

    for kind in StrategyKind::ALL {
        let report = summary.report(kind).unwrap();
        assert_eq!(report.succeeded(), 2, "{}", kind);

        let dir = temp.path().join(kind.default_dir());
        assert_eq!(std::fs::read(dir.join("image1.jpg")).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.join("image2.jpg")).unwrap(), b"two");
    }
}

#[test]
fn test_console_report_shape() {
    let server = image_server();
    let temp = TempDir::new().unwrap();
    let good = server.url("/images/image1.jpg");
    let bad = server.url("/images/missing.jpg");
    let config = BenchConfig::new(vec![good.clone(), bad.clone()]).with_strategies(
        temp.path(),
        &[StrategyKind::Threads, StrategyKind::Cooperative],
    );

    let capture = Capture::default();
    let summary = Driver::new(config, Reporter::new(capture.clone())).run();
    assert!(summary.all_ran());

    let lines = capture.lines();
    // Header, two unit lines, summary; twice
    assert_eq!(lines.len(), 8, "{:#?}", lines);

    assert_eq!(lines[0], "Thread pool strategy:");
    assert_eq!(lines[4], "Cooperative async strategy:");

    for block in [&lines[1..3], &lines[5..7]] {
        let success = block
            .iter()
            .find(|l| l.starts_with(&good))
            .expect("success line");
        assert!(success.contains("image1.jpg, load time: "), "{}", success);

        let failure = block
            .iter()
            .find(|l| l.starts_with("Error downloading"))
            .expect("failure line");
        assert!(failure.contains(&bad));
        assert!(failure.contains("HTTP 500"), "{}", failure);
    }

    assert!(lines[3].starts_with("Total time for thread pool strategy: "));
    assert!(lines[3].ends_with("(1 succeeded, 1 failed)"));
    assert!(lines[7].starts_with("Total time for cooperative async strategy: "));
}

#[test]
fn test_aborted_strategy_is_reported_and_others_continue() {
    let server = image_server();
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("not-a-dir"), b"occupied").unwrap();

    let mut config = BenchConfig::new(vec![server.url("/images/image2.jpg")]).with_strategies(
        temp.path(),
        &[StrategyKind::Threads, StrategyKind::Cooperative],
    );
    config.plans[0].output_dir = temp.path().join("not-a-dir");

    let capture = Capture::default();
    let summary = Driver::new(config, Reporter::new(capture.clone())).run();

    assert!(!summary.all_ran());
    assert_eq!(summary.aborted[0].kind, StrategyKind::Threads);
    assert_eq!(summary.report(StrategyKind::Cooperative).unwrap().succeeded(), 1);

    let lines = capture.lines();
    assert_eq!(lines[0], "Thread pool strategy:");
    assert!(lines[1].starts_with("Strategy thread pool aborted: "), "{}", lines[1]);
    assert!(lines[1].contains("not-a-dir"));
    assert_eq!(lines[2], "Cooperative async strategy:");
}

#[test]
fn test_worker_binary_runs_process_strategy() {
    let server = image_server();
    let temp = TempDir::new().unwrap();
    let locations = vec![
        server.url("/images/image1.jpg"),
        server.url("/images/missing.jpg"),
        server.url("/images/"),
    ];
    let config = BenchConfig::new(locations.clone())
        .with_strategies(temp.path(), &[StrategyKind::Processes])
        .with_worker_program(env!("CARGO_BIN_EXE_fetch_bench"));

    let summary = Driver::new(config, Reporter::new(io::sink())).run();
    let report = summary.report(StrategyKind::Processes).unwrap();

    assert_eq!(report.per_item.len(), 3);
    assert_eq!(report.succeeded(), 1);
    for result in &report.per_item {
        assert!(locations.contains(&result.location));
        assert!(result.elapsed <= report.total_elapsed);
    }
    assert!(temp
        .path()
        .join(StrategyKind::Processes.default_dir())
        .join("image1.jpg")
        .exists());
}

#[test]
fn test_missing_worker_program_loses_units_without_aborting() {
    let temp = TempDir::new().unwrap();
    let config = BenchConfig::new(vec!["http://127.0.0.1:1/a.jpg".to_string()])
        .with_strategies(temp.path(), &[StrategyKind::Processes])
        .with_worker_program(temp.path().join("no-such-binary"));

    let summary = Driver::new(config, Reporter::new(io::sink())).run();

    assert!(summary.all_ran());
    let report = summary.report(StrategyKind::Processes).unwrap();
    assert_eq!(report.per_item.len(), 1);
    assert_eq!(report.failed(), 1);
}

/// Run the real binary in `dir` with an empty config file
fn run_binary(dir: &Path, args: &[&str]) -> Output {
    let config = dir.join("fetch-bench.toml");
    std::fs::write(&config, "").unwrap();
    Command::new(env!("CARGO_BIN_EXE_fetch_bench"))
        .current_dir(dir)
        .env_remove("FETCH_BENCH_CONFIG")
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_worker_processes_print_their_own_lines() {
    let server = image_server();
    let temp = TempDir::new().unwrap();
    let good = server.url("/images/image1.jpg");
    let bad = server.url("/images/missing.jpg");

    let output = run_binary(temp.path(), &[good.as_str(), bad.as_str()]);
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    let start = lines
        .iter()
        .position(|l| *l == "Process pool strategy:")
        .expect("process pool header");
    let end = lines
        .iter()
        .position(|l| l.starts_with("Total time for process pool strategy: "))
        .expect("process pool summary");

    // One line per unit, printed by the child that ran it
    let section = &lines[start + 1..end];
    assert_eq!(section.len(), 2, "{:#?}", section);
    for location in [&good, &bad] {
        assert_eq!(
            section.iter().filter(|l| l.contains(location.as_str())).count(),
            1,
            "{:#?}",
            section
        );
    }

    let success = section.iter().find(|l| l.starts_with(&good)).unwrap();
    assert!(success.contains(" -> "), "{}", success);
    assert!(success.contains("image1.jpg, load time: "), "{}", success);

    let failure = section
        .iter()
        .find(|l| l.starts_with("Error downloading"))
        .unwrap();
    assert!(failure.contains(&bad) && failure.contains("HTTP 500"), "{}", failure);

    assert!(temp
        .path()
        .join(StrategyKind::Processes.default_dir())
        .join("image1.jpg")
        .exists());
}

#[test]
fn test_bad_arguments_exit_with_one() {
    let temp = TempDir::new().unwrap();
    let output = run_binary(temp.path(), &["--no-such-flag"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_help_exits_with_zero() {
    let temp = TempDir::new().unwrap();
    let output = run_binary(temp.path(), &["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}
