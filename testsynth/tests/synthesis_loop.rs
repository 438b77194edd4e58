//! End-to-end scenarios for the synthesis loop over a temp repository.

use testsynth::core::types::FunctionOutcome;
use testsynth::looping::run_scan;
use testsynth::run::SynthesisEvent;
use testsynth::test_support::{ScriptedHarness, ScriptedSynthesizer, TestWorkspace};

/// Module with `add` and `sub`; `add` passes on attempt 1, `sub` fails all
/// three attempts. Both test files exist afterwards, the run completes, and
/// the summary shows one passed and one exhausted outcome.
#[test]
fn mixed_pass_and_exhausted_outcomes() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write_module(
            "mathmod.py",
            "def add(a, b):\n    return a + b\n\ndef sub(a, b):\n    return a - b\n",
        )
        .expect("write module");

    let synthesizer = ScriptedSynthesizer::always_ok("assert True\n");
    let harness = ScriptedHarness::new(vec![true, false, false, false]);
    let mut events = Vec::new();

    let summary = run_scan(
        &workspace.config(),
        workspace.root(),
        &synthesizer,
        &harness,
        |event| events.push(event.clone()),
    )
    .expect("run does not abort");

    assert_eq!(summary.reports.len(), 2);
    assert_eq!(summary.count(FunctionOutcome::Passed), 1);
    assert_eq!(summary.count(FunctionOutcome::Exhausted), 1);

    let add = summary.reports.iter().find(|r| r.name == "add").expect("add");
    assert_eq!(add.outcome, FunctionOutcome::Passed);
    assert_eq!(add.attempts, 1);
    let sub = summary.reports.iter().find(|r| r.name == "sub").expect("sub");
    assert_eq!(sub.outcome, FunctionOutcome::Exhausted);
    assert_eq!(sub.attempts, 3);

    assert!(workspace.tests_dir().join("test_add.py").exists());
    assert!(workspace.tests_dir().join("test_sub.py").exists());
    assert!(workspace.tests_dir().join("__init__.py").exists());

    assert!(events.contains(&SynthesisEvent::AttemptPassed {
        name: "add".to_string(),
        attempt: 1
    }));
    assert!(events.contains(&SynthesisEvent::Exhausted {
        name: "sub".to_string(),
        attempts: 3
    }));
}

/// A function whose exact-match test file already exists triggers zero
/// synthesis calls.
#[test]
fn covered_function_makes_no_synthesis_call() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write_module("mathmod.py", "def add(a, b):\n    return a + b\n")
        .expect("write module");
    workspace
        .write_test("test_add.py", "from mathmod import add\n")
        .expect("write test");

    let synthesizer = ScriptedSynthesizer::new(Vec::new());
    let harness = ScriptedHarness::new(Vec::new());

    let summary = run_scan(
        &workspace.config(),
        workspace.root(),
        &synthesizer,
        &harness,
        |_| {},
    )
    .expect("run");

    assert_eq!(synthesizer.calls(), 0);
    assert_eq!(harness.runs(), 0);
    assert_eq!(summary.count(FunctionOutcome::Skipped), 1);
}

/// The ledger is exact-match: `test_add_all.py` does not cover `add`.
#[test]
fn substring_test_file_does_not_suppress_synthesis() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write_module("mathmod.py", "def add(a, b):\n    return a + b\n")
        .expect("write module");
    workspace
        .write_test("test_add_all.py", "assert True\n")
        .expect("write test");

    let synthesizer = ScriptedSynthesizer::always_ok("assert True\n");
    let harness = ScriptedHarness::new(vec![true]);

    let summary = run_scan(
        &workspace.config(),
        workspace.root(),
        &synthesizer,
        &harness,
        |_| {},
    )
    .expect("run");

    assert_eq!(synthesizer.calls(), 1);
    assert_eq!(summary.count(FunctionOutcome::Passed), 1);
}

/// Running the scan twice with no source changes performs zero synthesis
/// calls on the second run.
#[test]
fn second_scan_is_idempotent() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write_module(
            "mathmod.py",
            "def add(a, b):\n    return a + b\n\ndef sub(a, b):\n    return a - b\n",
        )
        .expect("write module");

    let first_synth = ScriptedSynthesizer::always_ok("assert True\n");
    let first_harness = ScriptedHarness::new(vec![true, true]);
    run_scan(
        &workspace.config(),
        workspace.root(),
        &first_synth,
        &first_harness,
        |_| {},
    )
    .expect("first run");
    assert_eq!(first_synth.calls(), 2);

    let second_synth = ScriptedSynthesizer::new(Vec::new());
    let second_harness = ScriptedHarness::new(Vec::new());
    let summary = run_scan(
        &workspace.config(),
        workspace.root(),
        &second_synth,
        &second_harness,
        |_| {},
    )
    .expect("second run");

    assert_eq!(second_synth.calls(), 0);
    assert_eq!(summary.count(FunctionOutcome::Skipped), 2);
}

/// A synthesis failure for one function does not abort the scan; later
/// functions are still processed.
#[test]
fn synthesis_failure_does_not_abort_scan() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write_module(
            "mathmod.py",
            "def add(a, b):\n    return a + b\n\ndef sub(a, b):\n    return a - b\n",
        )
        .expect("write module");

    let synthesizer = ScriptedSynthesizer::new(vec![
        Err("service unreachable".to_string()),
        Ok("assert True\n".to_string()),
    ]);
    let harness = ScriptedHarness::new(vec![true]);
    let mut events = Vec::new();

    let summary = run_scan(
        &workspace.config(),
        workspace.root(),
        &synthesizer,
        &harness,
        |event| events.push(event.clone()),
    )
    .expect("run");

    assert_eq!(summary.count(FunctionOutcome::SynthesisFailed), 1);
    assert_eq!(summary.count(FunctionOutcome::Passed), 1);
    assert!(events.iter().any(|event| matches!(
        event,
        SynthesisEvent::SynthesisFailed { name, .. } if name == "add"
    )));
}

/// An exhausted chain leaves its last failing artifact on disk, which then
/// satisfies the coverage predicate on the next run.
#[test]
fn exhausted_artifact_poisons_next_run() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write_module("mathmod.py", "def add(a, b):\n    return a + b\n")
        .expect("write module");

    let synthesizer = ScriptedSynthesizer::always_ok("assert False\n");
    let harness = ScriptedHarness::new(vec![false, false, false]);
    let summary = run_scan(
        &workspace.config(),
        workspace.root(),
        &synthesizer,
        &harness,
        |_| {},
    )
    .expect("first run");
    assert_eq!(summary.count(FunctionOutcome::Exhausted), 1);

    let second_synth = ScriptedSynthesizer::new(Vec::new());
    let second_harness = ScriptedHarness::new(Vec::new());
    let summary = run_scan(
        &workspace.config(),
        workspace.root(),
        &second_synth,
        &second_harness,
        |_| {},
    )
    .expect("second run");

    assert_eq!(second_synth.calls(), 0);
    assert_eq!(summary.count(FunctionOutcome::Skipped), 1);
}
