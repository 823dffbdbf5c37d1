use log::{Level, Log, Record};
use ranklog::logs::{LogBridge, LogBuffer};
use ranklog::{
    LogError, RankIdentity, RankLogger, Severity, SharedSink, StreamSlot, VerbosityTable,
};
use std::sync::Arc;

fn captured(rank: usize, size: usize) -> (RankLogger, LogBuffer, LogBuffer) {
    let out = LogBuffer::new(1000);
    let err = LogBuffer::new(1000);
    let logger = RankLogger::new(
        RankIdentity::new(rank, size),
        StreamSlot::new(SharedSink::new(out.clone())),
        StreamSlot::new(SharedSink::new(err.clone())),
    );
    (logger, out, err)
}

#[test]
fn test_rank_of_follows_documented_order() {
    let table = VerbosityTable::new(0);
    let expected = [
        ("debug", 0),
        ("extra", 10),
        ("info", 20),
        ("important", 25),
        ("prompt", 27),
        ("warning", 30),
        ("error", 50),
        ("header", 100),
    ];
    for (name, rank) in expected {
        assert_eq!(table.rank_of(name).unwrap().0, rank, "rank of {}", name);
    }
    assert!(matches!(table.rank_of("taco"), Err(LogError::UnknownLevel(..))));
    assert!(matches!(table.rank_of("INFO"), Err(LogError::UnknownLevel(..))));
}

#[test]
fn test_unknown_severity_name_is_fatal() {
    let (logger, out, _) = captured(0, 1);
    let res = logger.standard_emit("critical", "oops", false, None);
    assert!(matches!(res, Err(LogError::UnknownLevel(..))));
    assert!(out.is_empty());
}

#[test]
fn test_set_verbosity_from_integer_and_string() {
    let (logger, _, _) = captured(0, 1);

    logger.set_verbosity(0u32).unwrap();
    assert_eq!(logger.verbosity(), 0);

    logger.set_verbosity("warning").unwrap();
    assert_eq!(logger.verbosity(), 30);

    logger.set_verbosity(Severity::Important).unwrap();
    assert_eq!(logger.verbosity(), 25);
}

#[test]
fn test_invalid_verbosity_is_rejected() {
    let (logger, _, _) = captured(0, 1);
    assert!(matches!(
        logger.set_verbosity(5000u32),
        Err(LogError::InvalidVerbosity(..))
    ));
    assert!(matches!(
        logger.set_verbosity(15u32),
        Err(LogError::InvalidVerbosity(..))
    ));
    assert!(matches!(
        logger.set_verbosity("taco"),
        Err(LogError::InvalidVerbosity(..))
    ));
    // Unchanged
    assert_eq!(logger.verbosity(), 20);
}

#[test]
fn test_debug_verbosity_emits_everything() {
    let (logger, out, _) = captured(0, 1);
    logger.set_verbosity("debug").unwrap();

    logger.debug("one");
    logger.info("two");
    logger.warning("three");

    assert_eq!(
        out.get_lines(),
        vec!["[dbug] one", "[info] two", "[warn] three"]
    );
}

#[test]
fn test_warning_verbosity_hides_info() {
    let (logger, out, _) = captured(0, 1);
    logger.set_verbosity(30u32).unwrap();

    logger.info("hidden");
    logger.warning("shown");
    logger.error("also shown");

    assert_eq!(out.get_lines(), vec!["[warn] shown", "[err ] also shown"]);
}

#[test]
fn test_raw_ignores_verbosity() {
    let (logger, out, _) = captured(0, 1);
    logger.set_verbosity("error").unwrap();

    logger.raw("=== BANNER ===");
    logger.warning("hidden");

    assert_eq!(out.get_lines(), vec!["=== BANNER ==="]);
}

#[test]
fn test_single_emit_idempotence() {
    let (logger, out, _) = captured(0, 1);

    logger.warning_single("X", None);
    logger.warning_single("X", None);
    assert_eq!(out.get_lines().len(), 1);

    logger.warning_single("same text", Some("label-a"));
    logger.warning_single("same text", Some("label-b"));
    assert_eq!(out.get_lines().len(), 3);
}

#[test]
fn test_single_emit_classes_do_not_interfere() {
    let (logger, out, _) = captured(0, 1);

    logger.warning_single("disk nearly full", Some("disk"));
    logger.info_single("disk nearly full", Some("disk"));
    logger.error_single("disk nearly full", Some("disk"));

    assert_eq!(
        out.get_lines(),
        vec!["[warn] disk nearly full", "[info] disk nearly full"]
    );
}

#[test]
fn test_below_threshold_does_not_consume_dedup_state() {
    let (logger, out, _) = captured(0, 1);
    logger.set_verbosity("warning").unwrap();
    logger.info_single("first sighting", None);

    logger.set_verbosity("debug").unwrap();
    logger.info_single("first sighting", None);

    assert_eq!(out.get_lines(), vec!["[info] first sighting"]);
}

#[test]
fn test_clear_single_warnings_resurfaces_messages() {
    let (logger, out, _) = captured(0, 1);
    logger.warning_single("again", None);
    logger.clear_single_warnings();
    logger.warning_single("again", None);

    assert_eq!(out.get_lines().len(), 2);
    assert_eq!(logger.warning_counts(), vec![(1, "again".to_string())]);
}

#[test]
fn test_multiline_message_aligns_under_prefix() {
    let (logger, out, _) = captured(0, 1);
    logger.important("a\nb\n\n  ");

    let pad = " ".repeat("[dbug] ".len());
    assert_eq!(
        out.get_lines(),
        vec!["[impt] a".to_string(), format!("{}b", pad)]
    );
}

#[test]
fn test_worker_prefix_carries_rank() {
    let (logger, out, _) = captured(12, 16);
    logger.warning("x\ny");

    let pad = " ".repeat("[dbug-012] ".len());
    assert_eq!(logger.table().pad(), pad.len());
    assert_eq!(logger.table().prefix(Severity::Warning), "[warn-012] ");
    assert_eq!(
        out.get_lines(),
        vec!["[warn-012] x".to_string(), format!("{}y", pad)]
    );
}

#[test]
fn test_warning_report_sorted_by_count() {
    let (logger, out, _) = captured(0, 1);
    for _ in 0..5 {
        logger.warning_single("bbb", Some("B"));
    }
    for _ in 0..2 {
        logger.warning_single("aaa", Some("A"));
    }
    assert_eq!(
        logger.warning_counts(),
        vec![(2, "A".to_string()), (5, "B".to_string())]
    );

    logger.warning_report();
    let lines = out.get_lines();

    assert!(lines.contains(&"[info] ----- Final Warning Count --------".to_string()));
    let a = lines
        .iter()
        .position(|l| l == "[info]            2   A")
        .expect("row for A");
    let b = lines
        .iter()
        .position(|l| l == "[info]            5   B")
        .expect("row for B");
    assert!(a < b);
    assert_eq!(lines.last().unwrap(), "[info] ------------------------------------");
}

#[test]
fn test_write_err_goes_to_error_channel() {
    let (logger, out, err) = captured(0, 1);
    logger.write_err("Traceback\n").unwrap();
    assert!(out.is_empty());
    assert_eq!(err.get_lines(), vec!["Traceback"]);
}

#[test]
fn test_log_bridge_maps_levels_and_obeys_verbosity() {
    let (logger, out, _) = captured(0, 1);
    let logger = Arc::new(logger);
    let bridge = LogBridge::new(logger.clone());

    bridge.log(
        &Record::builder()
            .args(format_args!("disk full"))
            .level(Level::Warn)
            .target("ranklog::coordinator")
            .build(),
    );
    bridge.log(
        &Record::builder()
            .args(format_args!("noise"))
            .level(Level::Debug)
            .target("hyper::proto")
            .build(),
    );

    assert_eq!(out.get_lines(), vec!["[warn] coordinator: disk full"]);
}

/// Output target whose device has gone away.
struct BrokenPipe;

impl std::io::Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_log_bridge_falls_back_to_error_channel() {
    let err = LogBuffer::new(100);
    let logger = Arc::new(RankLogger::new(
        RankIdentity::solo(),
        StreamSlot::new(SharedSink::new(BrokenPipe)),
        StreamSlot::new(SharedSink::new(err.clone())),
    ));
    let bridge = LogBridge::new(logger);

    bridge.log(
        &Record::builder()
            .args(format_args!("lost otherwise"))
            .level(Level::Error)
            .target("ranklog::group::file")
            .build(),
    );

    let lines = err.get_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("ranklog: output target failed"));
    assert_eq!(lines[1], "[err ] file: lost otherwise");
}
