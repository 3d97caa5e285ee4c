mod common;

use common::{Log, RecordingShell, config};
use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;
use std::time::Instant;
use steptrace::TraceError;
use steptrace::demos;
use steptrace::driver::Phase;
use steptrace::shell::{Progress, Shell};
use steptrace::terminal::{ConsoleShell, Session, Writer};

fn console(exercise: &str, script: &str) -> (Progress, String) {
    let registry = demos::registry(&config(6));
    let writer = Rc::new(RefCell::new(Writer::new(Vec::new()).with_styling(false)));
    let shell = ConsoleShell::new(writer.clone()).with_interactive(false);
    let driver = registry
        .driver(exercise, Box::new(shell))
        .expect("known exercise");
    let progress = Session::new(driver, writer.clone())
        .run(Cursor::new(script.to_string()))
        .expect("session runs");
    let output = String::from_utf8(writer.borrow().get_ref().clone()).expect("utf-8");
    (progress, output)
}

#[test]
fn console_session_scores_button_clicks() {
    let (progress, output) = console("linked-list", "b Remove\nb Insert\nquit\n");
    assert_eq!(progress.correct, 1);
    assert_eq!(progress.errors, 1);
    // the pause after the click runs out before the next command
    assert_eq!(progress.last_step, 1);
    assert!(output.contains("Click the operation that adds a node."));
}

#[test]
fn console_reports_bad_commands_and_keeps_going() {
    let (progress, output) = console("linked-list", "jump\nplay\nb Insert\n");
    assert!(output.contains("unknown command `jump`"));
    assert!(output.contains("expected finished"));
    assert_eq!(progress.correct, 1);
}

#[test]
fn unknown_exercise_is_an_error() {
    let registry = demos::registry(&config(6));
    let log = Rc::new(RefCell::new(Log::default()));
    let shell = RecordingShell::new(log, None);
    let result = registry.driver("bubble-sort", Box::new(shell));
    assert!(matches!(result, Err(TraceError::UnknownExercise(id)) if id == "bubble-sort"));
}

#[test]
fn registry_restores_each_exercise_from_its_shell() {
    let registry = demos::registry(&config(6));
    let saved = Progress {
        data: Some(serde_json::json!({ "values": [4, 5], "inserted": 12 })),
        last_step: 0,
        correct: 1,
        errors: 0,
    };
    let drivers = registry
        .initialize(Instant::now(), |id| {
            let saved = (id == "linked-list").then(|| saved.clone());
            Box::new(RecordingShell::new(Rc::new(RefCell::new(Log::default())), saved))
                as Box<dyn Shell>
        })
        .expect("initialized");
    let phases: Vec<_> = drivers
        .iter()
        .map(|driver| (driver.id().to_string(), driver.phase()))
        .collect();
    assert_eq!(
        phases,
        vec![
            ("linked-list".to_string(), Phase::Running),
            ("largest".to_string(), Phase::Unstarted),
        ]
    );
    assert_eq!(drivers[0].step_index(), 1);
    assert_eq!(drivers[0].progress().correct, 1);
}
