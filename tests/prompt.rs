use ranklog::logs::LogBuffer;
use ranklog::prompt::parse_choices;
use ranklog::{
    Choice, ConsoleResponder, DialogResponder, LogError, RankIdentity, RankLogger, Responder,
    RunMode, SharedSink, StreamSlot,
};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

fn captured(identity: RankIdentity) -> (RankLogger, LogBuffer) {
    let out = LogBuffer::new(1000);
    let logger = RankLogger::new(
        identity,
        StreamSlot::new(SharedSink::new(out.clone())),
        StreamSlot::new(SharedSink::null()),
    );
    (logger, out)
}

fn console(input: &str) -> ConsoleResponder<Cursor<Vec<u8>>> {
    ConsoleResponder::new(Cursor::new(input.as_bytes().to_vec()))
}

#[test]
fn test_choices_expand_yes_no() {
    assert_eq!(
        parse_choices(&["YES_NO", "CANCEL", "BOGUS"]).unwrap(),
        vec![Choice::Yes, Choice::No, Choice::Cancel]
    );
    assert!(matches!(
        parse_choices(&["MAYBE"]),
        Err(LogError::NoPromptChoices(_))
    ));
}

#[test]
fn test_console_loops_until_recognized_answer() {
    let (logger, out) = captured(RankIdentity::solo());
    let mut responder = console("maybe\n  y \n");

    let answer = logger
        .prompt(
            Some(&mut responder),
            "Output files already exist.",
            "Overwrite?",
            &["YES_NO"],
        )
        .unwrap();
    assert!(answer);

    let lines = out.get_lines();
    assert_eq!(
        lines,
        vec![
            "[prmt] Output files already exist.",
            "[prmt] Overwrite? (YES, NO, Y, N):",
            "[prmt] Output files already exist.",
            "[prmt] Overwrite? (YES, NO, Y, N):",
        ]
    );
}

#[test]
fn test_console_negative_and_ok_answers() {
    let (logger, _) = captured(RankIdentity::solo());

    let mut no = console("n\n");
    assert!(!logger.prompt(Some(&mut no), "s", "q", &["YES_NO"]).unwrap());

    let mut ok = console("ok\n");
    assert!(logger.prompt(Some(&mut ok), "s", "q", &["OK", "CANCEL"]).unwrap());
}

#[test]
fn test_console_cancel_propagates() {
    let (logger, _) = captured(RankIdentity::solo());
    let mut responder = console("Cancel\n");

    let res = logger.prompt(Some(&mut responder), "s", "q", &["YES_NO", "CANCEL"]);
    assert!(matches!(res, Err(LogError::PromptCancelled(_))));
}

#[test]
fn test_console_shorthand_requires_matching_choice() {
    let (logger, _) = captured(RankIdentity::solo());
    // "Y" is not valid when only OK/CANCEL are offered; input then runs out
    let mut responder = console("y\n");

    let res = logger.prompt(Some(&mut responder), "s", "q", &["OK", "CANCEL"]);
    assert!(matches!(res, Err(LogError::PromptUnresolvable(_))));
}

#[test]
fn test_prompt_unresolvable_when_distributed() {
    let (logger, out) = captured(RankIdentity::new(0, 4));
    let mut responder = console("yes\n");

    let res = logger.prompt(Some(&mut responder), "s", "q", &["YES_NO"]);
    assert!(matches!(res, Err(LogError::PromptUnresolvable(_))));
    assert!(out.is_empty());
}

#[test]
fn test_prompt_unresolvable_in_batch_mode() {
    let (logger, _) = captured(RankIdentity::solo());
    assert!(RunMode::Batch.responder(None).is_none());

    let res = logger.prompt(None, "s", "q", &["YES_NO"]);
    assert!(matches!(res, Err(LogError::PromptUnresolvable(_))));
}

#[test]
fn test_dialog_responder() {
    let (logger, out) = captured(RankIdentity::solo());
    let seen = Arc::new(Mutex::new(String::new()));

    let seen_in_dialog = seen.clone();
    let mut yes = DialogResponder::new(move |msg: &str, choices: &[Choice]| {
        *seen_in_dialog.lock().unwrap() = msg.to_string();
        assert_eq!(choices, &[Choice::Yes, Choice::No]);
        Some(Choice::Yes)
    });
    assert!(logger
        .prompt(Some(&mut yes), "Statement", "Question?", &["YES_NO"])
        .unwrap());
    assert_eq!(*seen.lock().unwrap(), "Statement\n\n\nQuestion?");
    // Dialogs do not echo to the log
    assert!(out.is_empty());

    let mut dismissed = DialogResponder::new(|_: &str, _: &[Choice]| None);
    let res = logger.prompt(Some(&mut dismissed), "s", "q", &["OK"]);
    assert!(matches!(res, Err(LogError::PromptCancelled(_))));
}

#[test]
fn test_gui_mode_uses_supplied_dialog() {
    let (logger, _) = captured(RankIdentity::solo());
    let dialog = DialogResponder::new(|_: &str, _: &[Choice]| Some(Choice::No));

    let mut responder = RunMode::Gui.responder(Some(dialog)).unwrap();
    let answer = responder.ask(&logger, "s", "q", &[Choice::Yes, Choice::No]).unwrap();
    assert_eq!(answer, Choice::No);
}
