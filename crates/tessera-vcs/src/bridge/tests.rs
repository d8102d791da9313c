//! Unit tests for the bridge orchestrator.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use rstest::{fixture, rstest};
use tessera_buffer::BufferError;

use super::*;
use crate::classify::Classification;
use crate::pending::MAX_PENDING_COMMANDS;
use crate::tests::{MockRunner, STATUS_SAMPLE, ScriptedRunner, tool_failure};
use crate::vfs::STATUS_PATH;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[fixture]
fn settings() -> BridgeSettings {
    BridgeSettings::new("jj", "/work/repo")
}

#[fixture]
fn bridge(settings: BridgeSettings) -> VcsBridge<ScriptedRunner> {
    VcsBridge::new(settings, ScriptedRunner::always(STATUS_SAMPLE))
}

fn append(bridge: &mut VcsBridge<ScriptedRunner>, path: &str, text: &[u8]) {
    let file = bridge.file_mut(path).expect("file exists");
    let end = file.text().len();
    file.insert(end, text).expect("append user text");
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[rstest]
fn status_generation_protects_four_ranges(mut bridge: VcsBridge<ScriptedRunner>) {
    let path = bridge.generate_status().expect("generate status");
    assert_eq!(path.as_str(), STATUS_PATH);

    let file = bridge.file(STATUS_PATH).expect("status file");
    assert_eq!(file.text(), STATUS_SAMPLE.as_bytes());
    let classes: Vec<_> = file
        .readonly_ranges()
        .map(|range| range.classification())
        .collect();
    assert_eq!(
        classes,
        [
            Classification::Header,
            Classification::FilePath,
            Classification::CommitId,
            Classification::ParentId,
        ]
    );
}

#[rstest]
fn status_generation_invokes_the_configured_tool(settings: BridgeSettings) {
    let mut runner = MockRunner::new();
    runner
        .expect_run()
        .withf(|invocation| {
            invocation.program() == "jj"
                && invocation.working_dir() == Path::new("/work/repo")
                && invocation.args().as_slice() == ["status"]
        })
        .times(1)
        .returning(|_| Ok(CapturedOutput::new(STATUS_SAMPLE.as_bytes().to_vec())));

    let mut bridge = VcsBridge::new(settings, runner);
    bridge.generate_status().expect("generate status");
    assert_eq!(bridge.len(), 1);
}

#[rstest]
fn revision_generation_uses_diff_and_header_rules(settings: BridgeSettings) {
    let mut runner = MockRunner::new();
    runner
        .expect_run()
        .withf(|invocation| invocation.args().as_slice() == ["diff", "-r", "abc123"])
        .times(1)
        .returning(|_| {
            Ok(CapturedOutput::new(
                b"diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1 +1 @@\n-old\n+new\n".to_vec(),
            ))
        });

    let mut bridge = VcsBridge::new(settings, runner);
    let path = bridge.generate_revision("abc123").expect("generate revision");
    assert_eq!(path.as_str(), "tessera://revision/abc123");

    let file = bridge.file(path.as_str()).expect("revision file");
    assert_eq!(file.readonly_ranges().count(), 4);
    assert!(!file.is_watched());
    assert_eq!(
        file.kind(),
        &ViewKind::Revision {
            revision: "abc123".to_owned()
        }
    );
}

#[rstest]
fn invalid_revision_never_reaches_the_tool(settings: BridgeSettings) {
    let mut runner = MockRunner::new();
    runner.expect_run().never();

    let mut bridge = VcsBridge::new(settings, runner);
    let err = bridge
        .generate_revision("--help")
        .expect_err("flag-like revision is rejected");
    assert!(matches!(err, BridgeError::InvalidRevision { .. }));
    assert!(bridge.is_empty());
}

#[rstest]
fn tool_failure_propagates_and_leaves_state(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_status().expect("first generation");
    append(&mut bridge, STATUS_PATH, b"draft message\n");
    let before = bridge.file(STATUS_PATH).cloned();

    bridge.runner().then_reply(Err(tool_failure()));
    let err = bridge.generate_status().expect_err("tool fails");
    assert!(matches!(
        err,
        BridgeError::ExternalCommand(CommandError::NonZeroExit { status: 1, .. })
    ));
    assert_eq!(bridge.file(STATUS_PATH).cloned(), before);
}

#[rstest]
fn too_many_protected_regions_fail_generation(mut bridge: VcsBridge<ScriptedRunner>) {
    let crowded: String = (0..65).map(|index| format!("Commit: c{index}\n")).collect();
    bridge
        .runner()
        .then_reply(Ok(CapturedOutput::new(crowded.into_bytes())));
    let err = bridge.generate_status().expect_err("65 ranges overflow");
    assert!(matches!(
        err,
        BridgeError::Buffer(BufferError::CapacityExceeded { limit: 64 })
    ));
    assert!(bridge.is_empty());
}

#[rstest]
fn regeneration_replaces_without_using_capacity(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_status().expect("first");
    append(&mut bridge, STATUS_PATH, b"stale edit\n");
    bridge.unwatch(STATUS_PATH).expect("unwatch");

    bridge.generate_status().expect("second");
    assert_eq!(bridge.len(), 1);
    let file = bridge.file(STATUS_PATH).expect("status file");
    assert_eq!(file.text(), STATUS_SAMPLE.as_bytes());
    assert!(!file.is_watched(), "watch flag survives regeneration");
}

#[rstest]
fn thousand_and_first_file_is_rejected(mut bridge: VcsBridge<ScriptedRunner>) {
    for index in 0..MAX_VIRTUAL_FILES {
        bridge
            .generate_revision(&format!("r{index}"))
            .expect("within capacity");
    }
    let calls_before = bridge.runner().seen().len();

    let err = bridge
        .generate_revision("overflow")
        .expect_err("capacity reached");
    assert!(matches!(
        err,
        BridgeError::CapacityExceeded {
            resource: Resource::VirtualFiles,
            limit: MAX_VIRTUAL_FILES,
        }
    ));
    assert_eq!(bridge.len(), MAX_VIRTUAL_FILES);
    assert!(bridge.file("tessera://revision/overflow").is_none());
    assert_eq!(bridge.runner().seen().len(), calls_before, "tool not run");

    bridge
        .generate_revision("r0")
        .expect("regenerating an existing path still works");
}

#[rstest]
fn discard_frees_a_slot(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_status().expect("generate");
    assert!(bridge.discard(STATUS_PATH).is_some());
    assert!(bridge.is_empty());
    assert!(bridge.discard(STATUS_PATH).is_none());
}

#[rstest]
fn paths_are_sorted(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_revision("b").expect("b");
    bridge.generate_status().expect("status");
    bridge.generate_revision("a").expect("a");
    let paths: Vec<_> = bridge.paths().map(VfsPath::as_str).collect();
    assert_eq!(
        paths,
        [
            "tessera://revision/a",
            "tessera://revision/b",
            "tessera://status",
        ]
    );
}

// ---------------------------------------------------------------------------
// Edit scanning and dispatch
// ---------------------------------------------------------------------------

#[rstest]
fn untouched_output_queues_nothing(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_status().expect("generate");
    assert_eq!(bridge.scan_edits().expect("scan"), 0);
    assert!(bridge.pending().is_empty());
}

#[rstest]
fn user_text_queues_one_commit(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_status().expect("generate");
    append(&mut bridge, STATUS_PATH, b"Fix the parser\n");

    assert_eq!(bridge.scan_edits().expect("scan"), 1);
    let pending = bridge.drain_pending();
    let command = pending.first().expect("one command");
    assert_eq!(command.origin().as_str(), STATUS_PATH);
    assert_eq!(
        command.invocation().args().as_slice(),
        ["commit", "--message", "Fix the parser"]
    );
    assert_eq!(command.invocation().working_dir(), Path::new("/work/repo"));
}

#[rstest]
fn whitespace_only_line_queues_one_commit(settings: BridgeSettings) {
    let runner = ScriptedRunner::always("Working copy changes:\n   \nCommit: abc\n");
    let mut bridge = VcsBridge::new(settings, runner);
    bridge.generate_status().expect("generate");

    assert_eq!(bridge.scan_edits().expect("scan"), 1);
    let pending = bridge.drain_pending();
    let command = pending.first().expect("one command");
    assert_eq!(command.invocation().args().as_slice(), ["commit", "--message", ""]);
}

#[rstest]
fn repeated_scans_queue_again(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_status().expect("generate");
    append(&mut bridge, STATUS_PATH, b"message\n");
    bridge.scan_edits().expect("first scan");
    bridge.scan_edits().expect("second scan");
    assert_eq!(bridge.pending().len(), 2);
}

#[rstest]
fn unwatched_files_are_skipped(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_status().expect("generate");
    append(&mut bridge, STATUS_PATH, b"message\n");
    bridge.unwatch(STATUS_PATH).expect("unwatch");
    assert_eq!(bridge.scan_edits().expect("scan"), 0);

    bridge.watch(STATUS_PATH).expect("watch");
    assert_eq!(bridge.scan_edits().expect("scan"), 1);
}

#[rstest]
fn watching_unknown_file_fails(mut bridge: VcsBridge<ScriptedRunner>) {
    let err = bridge.watch("tessera://missing").expect_err("no such file");
    assert!(matches!(err, BridgeError::UnknownFile { ref path } if path == "tessera://missing"));
}

#[rstest]
fn full_queue_stops_the_scan(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_status().expect("generate");
    append(&mut bridge, STATUS_PATH, b"message\n");
    for _ in 0..MAX_PENDING_COMMANDS {
        bridge.scan_edits().expect("within capacity");
    }

    let err = bridge.scan_edits().expect_err("queue is full");
    assert!(matches!(
        err,
        BridgeError::CapacityExceeded {
            resource: Resource::PendingCommands,
            limit: MAX_PENDING_COMMANDS,
        }
    ));
    assert_eq!(bridge.pending().len(), MAX_PENDING_COMMANDS);
}

#[rstest]
fn dispatch_runs_in_order_and_reports_failures(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_status().expect("generate");
    bridge.generate_revision("abc").expect("revision");
    bridge.watch("tessera://revision/abc").expect("watch revision");
    append(&mut bridge, "tessera://revision/abc", b"first\n");
    append(&mut bridge, STATUS_PATH, b"second\n");
    assert_eq!(bridge.scan_edits().expect("scan"), 2);

    bridge.runner().then_reply(Err(tool_failure()));
    let outcomes = bridge.dispatch_pending();

    assert_eq!(outcomes.len(), 2);
    assert!(bridge.pending().is_empty());
    let origins: Vec<_> = outcomes
        .iter()
        .map(|outcome| outcome.command().origin().as_str())
        .collect();
    assert_eq!(origins, ["tessera://revision/abc", STATUS_PATH]);
    assert!(!outcomes.first().expect("first").is_success());
    assert!(outcomes.get(1).expect("second").is_success());

    let dispatched: Vec<_> = bridge
        .runner()
        .seen()
        .iter()
        .filter_map(|invocation| invocation.subcommand().map(str::to_owned))
        .collect();
    assert_eq!(dispatched, ["status", "diff", "commit", "commit"]);
}

#[rstest]
fn dispatch_of_empty_queue_runs_nothing(settings: BridgeSettings) {
    let mut runner = MockRunner::new();
    runner.expect_run().never();
    let mut bridge = VcsBridge::new(settings, runner);
    assert!(bridge.dispatch_pending().is_empty());
}

// ---------------------------------------------------------------------------
// Privileged refresh
// ---------------------------------------------------------------------------

#[rstest]
fn refresh_rewrites_a_protected_range(mut bridge: VcsBridge<ScriptedRunner>) {
    bridge.generate_status().expect("generate");
    bridge
        .refresh_protected(STATUS_PATH, 2, b"def456")
        .expect("same-length refresh");
    let file = bridge.file(STATUS_PATH).expect("status file");
    assert_eq!(
        file.text(),
        b"Working copy changes:\n  modified: src/main\nCommit: def456\nParent: xyz789\n"
    );
}

#[rstest]
fn refresh_of_unknown_file_fails(mut bridge: VcsBridge<ScriptedRunner>) {
    let err = bridge
        .refresh_protected(STATUS_PATH, 0, b"x")
        .expect_err("nothing generated yet");
    assert!(matches!(err, BridgeError::UnknownFile { .. }));
}

// ---------------------------------------------------------------------------
// Configuration and sharing
// ---------------------------------------------------------------------------

#[test]
fn settings_follow_configuration() {
    let config = Config {
        vcs_program: "sl".to_owned(),
        repository: "/srv/repo".into(),
        command_timeout_secs: Some(5),
        ..Config::default()
    };
    let bridge = VcsBridge::from_config(&config);
    assert_eq!(bridge.settings().program(), "sl");
    assert_eq!(bridge.settings().repository(), Path::new("/srv/repo"));
    assert_eq!(
        bridge.runner().timeout(),
        Some(std::time::Duration::from_secs(5))
    );
}

#[test]
fn shared_bridge_serialises_access() {
    struct Fixed;

    impl CommandRunner for Fixed {
        fn run(&self, _: &CommandInvocation) -> Result<CapturedOutput, CommandError> {
            Ok(CapturedOutput::new(b"Commit: abc\n".to_vec()))
        }
    }

    let shared = Arc::new(SharedBridge::new(VcsBridge::new(
        BridgeSettings::new("jj", "."),
        Fixed,
    )));
    let handles: Vec<_> = (0..4)
        .map(|index| {
            let bridge = Arc::clone(&shared);
            thread::spawn(move || {
                bridge.with(|inner| inner.generate_revision(&format!("r{index}")).map(|_| ()))
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread").expect("generate");
    }

    let bridge = Arc::try_unwrap(shared)
        .unwrap_or_else(|_| panic!("threads released the bridge"))
        .into_inner();
    assert_eq!(bridge.len(), 4);
}
