//! End-to-end behavior of the guest backend against the literal guest.

mod common;

use common::{literal_matcher, runtime};
use multimatch_core::stats::StatsProvider;
use multimatch_core::{Backend, Error, Matcher, MatcherConfig, MatcherState, PatternSet};
use multimatch_native::SequentialMatcher;
use std::sync::Arc;
use std::thread;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("multimatch_wasm=debug")
        .with_test_writer()
        .try_init();
}

fn patterns(list: &[&str]) -> PatternSet {
    PatternSet::new(list.iter().copied()).unwrap()
}

#[test]
fn test_keyword_scenario() {
    init_tracing();
    let runtime = runtime();
    let matcher = runtime
        .compile_matcher(&literal_matcher(), &patterns(&["error", "warning", "critical"]))
        .unwrap();

    assert_eq!(matcher.backend(), Backend::Guest);
    assert_eq!(matcher.state(), MatcherState::Ready);
    assert_eq!(matcher.pattern_count(), 3);
    assert!(!matcher.supports_multi_match());

    assert_eq!(matcher.try_match_first("System error occurred").unwrap(), Some(0));
    assert_eq!(matcher.try_match_first("warning: disk nearly full").unwrap(), Some(1));
    assert_eq!(matcher.try_match_first("critical error").unwrap(), Some(0));
    assert_eq!(matcher.try_match_first("all good").unwrap(), None);
}

#[test]
fn test_match_all_degrades_to_first_match() {
    let runtime = runtime();
    let matcher = runtime
        .compile_matcher(&literal_matcher(), &patterns(&["error", "fail"]))
        .unwrap();

    assert_eq!(matcher.match_all("error and fail"), vec![0]);
    assert_eq!(matcher.match_all("nothing"), Vec::<usize>::new());
}

#[test]
fn test_agrees_with_sequential_on_literals() {
    let set = patterns(&["foo", "bar", "baz qux", "héllo"]);
    let runtime = runtime();
    let guest = runtime.compile_matcher(&literal_matcher(), &set).unwrap();
    let native = SequentialMatcher::compile(&set, &MatcherConfig::default()).unwrap();

    for input in [
        "foo",
        "a bar b",
        "baz qux",
        "baz  qux",
        "say héllo",
        "hello",
        "barfoo",
        "",
        "ba",
    ] {
        assert_eq!(
            guest.try_match_first(input).unwrap(),
            native.try_match_first(input).unwrap(),
            "input {input:?}"
        );
    }
}

#[test]
fn test_invalid_pattern_reports_index_and_code() {
    init_tracing();
    let runtime = runtime();

    let err = runtime
        .compile_matcher(&literal_matcher(), &patterns(&["[invalid"]))
        .unwrap_err();
    match err {
        Error::CompileError {
            backend,
            pattern_index,
            code,
            ref message,
        } => {
            assert_eq!(backend, Backend::Guest);
            assert_eq!(pattern_index, Some(0));
            assert_eq!(code, Some(-4));
            assert_eq!(message, "unterminated character class");
        }
        other => panic!("expected compile error, got {other}"),
    }

    let err = runtime
        .compile_matcher(&literal_matcher(), &patterns(&["ok", "fine", "[bad"]))
        .unwrap_err();
    assert_eq!(err.pattern_index(), Some(2));
}

#[test]
fn test_unrepresentable_patterns_rejected_before_guest() {
    let runtime = runtime();
    let err = runtime
        .compile_matcher(&literal_matcher(), &patterns(&["a", "b\nc"]))
        .unwrap_err();
    assert!(err.is_compile_error());
    assert_eq!(err.pattern_index(), Some(1));
}

#[test]
fn test_empty_input_skips_guest() {
    let runtime = runtime();
    let matcher = runtime
        .compile_matcher(&literal_matcher(), &patterns(&["x"]))
        .unwrap();

    let calls_before = matcher.bridge_stats().guest_calls;
    assert_eq!(matcher.try_match_first("").unwrap(), None);
    assert_eq!(matcher.bridge_stats().guest_calls, calls_before);
}

#[test]
fn test_large_input_grows_guest_memory() {
    let runtime = runtime();
    let matcher = runtime
        .compile_matcher(&literal_matcher(), &patterns(&["needle"]))
        .unwrap();

    let mut input = "hay".repeat(100_000);
    assert_eq!(matcher.try_match_first(&input).unwrap(), None);
    input.push_str("needle");
    assert_eq!(matcher.try_match_first(&input).unwrap(), Some(0));
    assert_eq!(matcher.bridge_stats().outstanding_buffers(), 0);
}

#[test]
fn test_close_is_idempotent_and_final() {
    let runtime = runtime();
    let matcher = runtime
        .compile_matcher(&literal_matcher(), &patterns(&["x"]))
        .unwrap();

    matcher.close();
    matcher.close();

    assert_eq!(matcher.state(), MatcherState::Closed);
    assert_eq!(matcher.pattern_count(), 0);
    assert!(matcher.try_match_first("x").unwrap_err().is_invalid_state());
    assert_eq!(matcher.match_first("x"), None);
    assert!(matcher.check_platform().unwrap_err().is_invalid_state());
    assert_eq!(matcher.last_error(), "");
}

#[test]
fn test_platform_probe_and_diagnostics_when_ready() {
    let runtime = runtime();
    let matcher = runtime
        .compile_matcher(&literal_matcher(), &patterns(&["x"]))
        .unwrap();

    assert_eq!(matcher.check_platform().unwrap(), Some(0));
    assert_eq!(matcher.last_error(), "");
    assert_eq!(matcher.patterns().get(0), Some("x"));
}

#[test]
fn test_stats_track_matches_and_buffers() {
    let runtime = runtime();
    let matcher = runtime
        .compile_matcher(&literal_matcher(), &patterns(&["hit"]))
        .unwrap();

    for input in ["hit", "miss", "a hit", "nope"] {
        let _ = matcher.try_match_first(input).unwrap();
    }

    let snapshot = matcher.capture_stats();
    assert_eq!(snapshot.backend(), Backend::Guest);
    assert_eq!(snapshot.state(), MatcherState::Ready);
    assert_eq!(snapshot.pattern_count(), 1);

    let bridge = snapshot.bridge().unwrap();
    assert_eq!(bridge.matches, 4);
    assert_eq!(bridge.hits, 2);
    assert_eq!(bridge.hit_rate(), Some(0.5));
    assert_eq!(bridge.guest_traps, 0);
    assert_eq!(bridge.outstanding_buffers(), 0);
    // one payload plus four inputs
    assert_eq!(bridge.allocations, 5);
}

#[test]
fn test_compiled_module_is_reused() {
    let runtime = runtime();
    let wasm = literal_matcher();

    let first = runtime.compile_matcher(&wasm, &patterns(&["a"])).unwrap();
    let second = runtime.compile_matcher(&wasm, &patterns(&["b"])).unwrap();

    assert_eq!(runtime.module_cache().len(), 1);
    assert_eq!(runtime.module_cache().hits(), 1);

    // separate instances keep separate pattern tables
    assert_eq!(first.try_match_first("a").unwrap(), Some(0));
    assert_eq!(first.try_match_first("b").unwrap(), None);
    assert_eq!(second.try_match_first("b").unwrap(), Some(0));
}

#[test]
fn test_concurrent_matching_is_serialized_and_consistent() {
    init_tracing();
    let runtime = runtime();
    let set = patterns(&["alpha", "beta", "gamma"]);
    let matcher = Arc::new(runtime.compile_matcher(&literal_matcher(), &set).unwrap());

    let inputs: Vec<String> = (0..1000)
        .map(|i| match i % 4 {
            0 => format!("{i} alpha"),
            1 => format!("beta {i}"),
            2 => format!("x{i}gamma"),
            _ => format!("none {i}"),
        })
        .collect();
    let inputs = Arc::new(inputs);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let matcher = Arc::clone(&matcher);
            let inputs = Arc::clone(&inputs);
            thread::spawn(move || {
                for (i, input) in inputs.iter().enumerate().skip(t).step_by(8) {
                    let expected = match i % 4 {
                        3 => None,
                        n => Some(n),
                    };
                    assert_eq!(matcher.try_match_first(input).unwrap(), expected, "{input}");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = matcher.bridge_stats();
    assert_eq!(stats.matches, 1000);
    assert_eq!(stats.hits, 750);
    assert_eq!(stats.outstanding_buffers(), 0);
}

#[test]
fn test_matcher_works_as_trait_object() {
    let runtime = runtime();
    let matcher: Box<dyn Matcher> = Box::new(
        runtime
            .compile_matcher(&literal_matcher(), &patterns(&["dyn"]))
            .unwrap(),
    );
    assert_eq!(matcher.match_first("dyn dispatch"), Some(0));
}

#[test]
fn test_raw_bridge_buffer_round_trip() {
    let runtime = runtime();
    let mut bridge = runtime.instantiate(&literal_matcher()).unwrap();
    bridge.initialize().unwrap();

    let buffer = bridge.allocate(5).unwrap();
    assert_eq!(buffer.len(), 5);
    assert!(buffer.offset() >= 65536);
    bridge.write(&buffer, b"hello").unwrap();
    assert_eq!(bridge.read(buffer.offset(), 5).unwrap(), b"hello");

    let too_long = bridge.write(&buffer, b"hello world").unwrap_err();
    assert!(too_long.is_memory_error());

    bridge.free(buffer).unwrap();
    assert_eq!(bridge.monitor().snapshot().outstanding_buffers(), 0);
    assert!(bridge.allocate(0).unwrap_err().is_memory_error());
}

#[test]
fn test_inspect_reports_conforming_guest() {
    let runtime = runtime();
    let report = runtime.inspect(&literal_matcher()).unwrap();

    assert!(report.conforms);
    assert!(report.imports.is_empty());
    assert_eq!(report.violations().count(), 0);
    assert!(report.exports.iter().any(|e| e.name == "live_allocations"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["conforms"], true);
}
