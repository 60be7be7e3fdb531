//! Integration tests for the scheduling strategies
//!
//! Every strategy runs against a local mock server. The process strategy uses
//! the crate's own binary as its worker executable.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use httpmock::prelude::*;
use tempfile::TempDir;

use fetch_bench::app::{
    run_strategy, ClientConfig, CooperativeRunner, FetchOutcome, ProcessPoolRunner, Reporter,
    StrategyKind, StrategyReport, StrategyRunner, ThreadPoolRunner,
};

/// Build a runner of the given kind with a short unit deadline
fn runner(kind: StrategyKind, limit: Option<NonZeroUsize>) -> Box<dyn StrategyRunner> {
    let client = ClientConfig::default().with_unit_timeout(Some(Duration::from_secs(10)));
    match kind {
        StrategyKind::Threads => Box::new(ThreadPoolRunner::new(client, limit)),
        StrategyKind::Processes => Box::new(ProcessPoolRunner::new(
            env!("CARGO_BIN_EXE_fetch_bench"),
            client,
            limit,
        )),
        StrategyKind::Cooperative => Box::new(CooperativeRunner::new(client, limit)),
    }
}

fn run(kind: StrategyKind, locations: &[String], output_dir: &Path) -> StrategyReport {
    run_strategy(
        runner(kind, None).as_ref(),
        locations,
        output_dir,
        &Reporter::new(std::io::sink()),
    )
    .unwrap()
}

/// Mock server with two good images and one failing endpoint
fn mixed_server() -> MockServer {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/images/one.jpg");
        then.status(200).body(b"first image");
    });
    server.mock(|when, then| {
        when.method(GET).path("/images/two.jpg");
        then.status(200).body(b"second image");
    });
    server.mock(|when, then| {
        when.method(GET).path("/images/broken.jpg");
        then.status(500);
    });
    server
}

fn mixed_locations(server: &MockServer) -> Vec<String> {
    vec![
        server.url("/images/one.jpg"),
        server.url("/images/broken.jpg"),
        server.url("/images/two.jpg"),
        // Nothing listens on port 1
        "http://127.0.0.1:1/images/unreachable.jpg".to_string(),
    ]
}

#[test]
fn test_every_strategy_returns_one_result_per_location() {
    let server = mixed_server();
    let locations = mixed_locations(&server);

    for kind in StrategyKind::ALL {
        let temp = TempDir::new().unwrap();
        let report = run(kind, &locations, temp.path());

        assert_eq!(report.strategy, kind);
        assert_eq!(report.per_item.len(), locations.len(), "{}", kind);

        let reported: HashSet<_> = report.per_item.iter().map(|r| r.location.clone()).collect();
        let expected: HashSet<_> = locations.iter().cloned().collect();
        assert_eq!(reported, expected, "{}", kind);

        for result in &report.per_item {
            assert!(result.elapsed <= report.total_elapsed, "{}", kind);
        }
    }
}

#[test]
fn test_files_exist_only_for_successful_units() {
    let server = mixed_server();
    let locations = mixed_locations(&server);

    for kind in StrategyKind::ALL {
        let temp = TempDir::new().unwrap();
        let report = run(kind, &locations, temp.path());

        assert_eq!(report.succeeded(), 2, "{}", kind);
        assert_eq!(report.failed(), 2, "{}", kind);
        assert_eq!(
            std::fs::read(temp.path().join("one.jpg")).unwrap(),
            b"first image"
        );
        assert_eq!(
            std::fs::read(temp.path().join("two.jpg")).unwrap(),
            b"second image"
        );
        assert!(!temp.path().join("broken.jpg").exists(), "{}", kind);
        assert!(!temp.path().join("unreachable.jpg").exists(), "{}", kind);

        let broken = report.result_for(&locations[1]).unwrap();
        assert_eq!(broken.outcome, FetchOutcome::HttpError { status: 500 });

        let unreachable = report.result_for(&locations[3]).unwrap();
        assert!(
            matches!(unreachable.outcome, FetchOutcome::TransportError { .. }),
            "{}: {:?}",
            kind,
            unreachable.outcome
        );
    }
}

#[test]
fn test_empty_batch_finishes_immediately() {
    for kind in StrategyKind::ALL {
        let temp = TempDir::new().unwrap();
        let output_dir = temp.path().join(kind.default_dir());
        let report = run(kind, &[], &output_dir);

        assert!(report.per_item.is_empty());
        assert!(report.total_elapsed < Duration::from_millis(500));
        assert!(output_dir.is_dir());
    }
}

#[test]
fn test_rerun_overwrites_existing_files() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/a.jpg");
        then.status(200).body(b"fresh");
    });
    let locations = vec![server.url("/a.jpg")];

    for kind in StrategyKind::ALL {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.jpg"), b"stale content that is longer").unwrap();

        let first = run(kind, &locations, temp.path());
        let second = run(kind, &locations, temp.path());

        assert_eq!(first.succeeded(), 1);
        assert_eq!(second.succeeded(), 1);
        assert_eq!(std::fs::read(temp.path().join("a.jpg")).unwrap(), b"fresh");
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1, "{}", kind);
    }
}

#[test]
fn test_colliding_names_leave_one_complete_file() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/a/x.jpg");
        then.status(200).body(b"from a");
    });
    server.mock(|when, then| {
        when.method(GET).path("/b/x.jpg");
        then.status(200).body(b"from b");
    });
    let locations = vec![server.url("/a/x.jpg"), server.url("/b/x.jpg")];

    let temp = TempDir::new().unwrap();
    let report = run(StrategyKind::Cooperative, &locations, temp.path());

    assert_eq!(report.succeeded(), 2);
    let content = std::fs::read(temp.path().join("x.jpg")).unwrap();
    assert!(content == b"from a" || content == b"from b");
}

#[test]
fn test_invalid_location_does_not_disturb_the_batch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/ok.jpg");
        then.status(200).body(b"ok");
    });
    let locations = vec![server.url("/ok.jpg"), server.url("/dir/")];

    for kind in StrategyKind::ALL {
        let temp = TempDir::new().unwrap();
        let report = run(kind, &locations, temp.path());

        assert_eq!(report.per_item.len(), 2);
        let invalid = report.result_for(&locations[1]).unwrap();
        assert!(matches!(invalid.outcome, FetchOutcome::InvalidLocation { .. }));
        assert!(invalid.output_path.is_none());
        assert!(temp.path().join("ok.jpg").exists());
    }
}

#[test]
fn test_concurrency_limit_serializes_units() {
    let server = MockServer::start();
    for name in ["/s1.jpg", "/s2.jpg"] {
        server.mock(|when, then| {
            when.method(GET).path(name);
            then.status(200).body(b"slow").delay(Duration::from_millis(300));
        });
    }
    let locations = vec![server.url("/s1.jpg"), server.url("/s2.jpg")];

    for kind in [StrategyKind::Threads, StrategyKind::Cooperative] {
        let temp = TempDir::new().unwrap();
        let report = run_strategy(
            runner(kind, NonZeroUsize::new(1)).as_ref(),
            &locations,
            temp.path(),
            &Reporter::new(std::io::sink()),
        )
        .unwrap();

        assert_eq!(report.succeeded(), 2);
        assert!(
            report.total_elapsed >= Duration::from_millis(600),
            "{}: {:?}",
            kind,
            report.total_elapsed
        );
    }
}

#[test]
fn test_unbounded_fan_out_overlaps_units() {
    let server = MockServer::start();
    for name in ["/p1.jpg", "/p2.jpg", "/p3.jpg"] {
        server.mock(|when, then| {
            when.method(GET).path(name);
            then.status(200).body(b"slow").delay(Duration::from_millis(500));
        });
    }
    let locations: Vec<String> = ["/p1.jpg", "/p2.jpg", "/p3.jpg"]
        .iter()
        .map(|p| server.url(*p))
        .collect();

    for kind in [StrategyKind::Threads, StrategyKind::Cooperative] {
        let temp = TempDir::new().unwrap();
        let report = run(kind, &locations, temp.path());

        assert_eq!(report.succeeded(), 3);
        assert!(
            report.total_elapsed < Duration::from_millis(1400),
            "{}: {:?}",
            kind,
            report.total_elapsed
        );
    }
}
