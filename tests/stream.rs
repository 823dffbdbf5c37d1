use ranklog::logs::LogBuffer;
use ranklog::{SharedSink, StreamController, StreamSlot};
use std::fs;
use tempfile::TempDir;

fn buffer_sink() -> (SharedSink, LogBuffer) {
    let buf = LogBuffer::new(100);
    (SharedSink::new(buf.clone()), buf)
}

#[test]
fn test_redirect_and_restore() {
    let (console, console_buf) = buffer_sink();
    let (file, file_buf) = buffer_sink();
    let slot = StreamSlot::new(console.clone());

    let mut ctl = StreamController::new(slot.clone());
    ctl.redirect(file);
    assert!(ctl.is_redirected());
    slot.write_str("to file\n").unwrap();

    assert!(ctl.restore());
    assert!(slot.current().same(&console));
    slot.write_str("to console\n").unwrap();

    assert_eq!(file_buf.get_lines(), vec!["to file"]);
    assert_eq!(console_buf.get_lines(), vec!["to console"]);
}

#[test]
fn test_restore_is_idempotent() {
    let (console, _) = buffer_sink();
    let (file, _) = buffer_sink();
    let slot = StreamSlot::new(console.clone());

    let mut ctl = StreamController::new(slot.clone());
    assert!(!ctl.restore());

    ctl.redirect(file);
    assert!(ctl.restore());
    assert!(!ctl.restore());
    assert!(slot.current().same(&console));
}

#[test]
fn test_restore_leaves_foreign_redirection_alone() {
    let (console, _) = buffer_sink();
    let (a, _) = buffer_sink();
    let (b, _) = buffer_sink();
    let slot = StreamSlot::new(console.clone());

    let mut first = StreamController::new(slot.clone());
    let mut second = StreamController::new(slot.clone());
    first.redirect(a.clone());
    second.redirect(b.clone());

    // `first` no longer owns the target
    assert!(!first.restore());
    assert!(slot.current().same(&b));

    assert!(second.restore());
    assert!(slot.current().same(&a));
}

#[test]
fn test_drop_restores_target() {
    let (console, _) = buffer_sink();
    let (file, _) = buffer_sink();
    let slot = StreamSlot::new(console.clone());

    {
        let mut ctl = StreamController::new(slot.clone());
        ctl.redirect(file.clone());
        assert!(slot.current().same(&file));
    }
    assert!(slot.current().same(&console));
}

#[test]
fn test_file_sink_close_flushes() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("run.0001.stderr");
    let slot = StreamSlot::new(SharedSink::null());

    let mut ctl = StreamController::new(slot.clone());
    ctl.redirect(SharedSink::create_file(&path).unwrap());
    slot.write_str("partial line without newline").unwrap();
    ctl.close().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "partial line without newline"
    );
    assert!(!ctl.is_redirected());
}
