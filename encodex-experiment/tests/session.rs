use encodex_core::{Category, KeyPress, TrialDescriptor};
use encodex_experiment::{StudyConfig, StudyStateMachine};
use encodex_session::{
    OutputStore, SessionError, SessionInfo, ensure_fresh, load_conditions, read_results,
    select_trials,
};
use encodex_timing::{AbortToken, ManualTimer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// What the participant does during one stimulus window
enum Answer {
    Key(char, Duration),
    Nothing,
}

fn write_conditions(dir: &Path, rows: usize) -> std::path::PathBuf {
    let path = dir.join("conditions.csv");
    let mut text = String::from("Image,Degredation\n");
    for i in 0..rows {
        text.push_str(&format!("obj{i}.png,level{}\n", i % 3));
    }
    fs::write(&path, text).unwrap();
    path
}

fn run_session(
    trials: Vec<TrialDescriptor>,
    store: OutputStore,
    timeout_ms: Option<u64>,
    answers: &[Answer],
) -> StudyStateMachine<ManualTimer, OutputStore> {
    let config = StudyConfig {
        response_timeout_ms: timeout_ms,
        ..StudyConfig::default()
    };
    let timer = ManualTimer::new();
    let mut sm = StudyStateMachine::new(config, trials, timer.clone(), store, AbortToken::new());

    for _ in 0..3 {
        sm.handle_key(KeyPress::Char(' ')).unwrap();
    }

    for answer in answers {
        // Fixation
        timer.advance(Duration::from_secs(1));
        sm.update().unwrap();
        match answer {
            Answer::Key(c, latency) => {
                timer.advance(*latency);
                sm.handle_key(KeyPress::Char(*c)).unwrap();
            }
            Answer::Nothing => {
                timer.advance(Duration::from_millis(timeout_ms.unwrap_or(0)));
                sm.update().unwrap();
            }
        }
        // Feedback
        timer.advance(Duration::from_millis(1500));
        sm.update().unwrap();
    }

    timer.advance(Duration::from_secs(2));
    sm.update().unwrap();
    sm
}

#[test]
fn five_trial_scenario_writes_expected_rows() {
    let dir = tempfile::tempdir().unwrap();
    let conditions = load_conditions(write_conditions(dir.path(), 5)).unwrap();
    let trials = select_trials(&conditions, Some(5), &mut StdRng::seed_from_u64(2024)).unwrap();

    let info = SessionInfo::new("7", "1").unwrap();
    let path = info.output_path(&dir.path().join("data"), "PS6");
    ensure_fresh(&path).unwrap();
    let store = OutputStore::create(&path).unwrap();

    let answers = [
        Answer::Key('1', Duration::from_millis(420)),
        Answer::Nothing,
        Answer::Key('2', Duration::from_millis(1100)),
        Answer::Key('1', Duration::from_millis(800)),
        Answer::Key('2', Duration::from_millis(650)),
    ];
    let sm = run_session(trials.clone(), store, Some(3000), &answers);
    assert!(sm.is_done());
    assert!(!sm.was_aborted());

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 6);

    let rows = read_results(&path).unwrap();
    let indices: Vec<usize> = rows.iter().map(|r| r.trial).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);

    let categories: Vec<Category> = rows.iter().map(|r| r.category).collect();
    assert_eq!(
        categories,
        vec![
            Category::Indoor,
            Category::NotAvailable,
            Category::Outdoor,
            Category::Indoor,
            Category::Outdoor
        ]
    );
    let responses: Vec<&str> = rows
        .iter()
        .map(|r| r.response.as_deref().unwrap_or(""))
        .collect();
    assert_eq!(responses, vec!["1", "", "2", "1", "2"]);
    assert_eq!(rows[0].rt, Some(0.42));
    assert_eq!(rows[1].rt, None);
    assert_eq!(rows[2].rt, Some(1.1));

    // Rows follow the shuffled trial order.
    for (row, trial) in rows.iter().zip(&trials) {
        assert_eq!(row.image, trial.image);
        assert_eq!(row.degradation, trial.degradation);
    }
    assert_eq!(sm.results(), rows.as_slice());
}

#[test]
fn second_run_for_same_session_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let info = SessionInfo::new("3", "2").unwrap();
    let path = info.output_path(dir.path(), "PS6");

    let conditions = load_conditions(write_conditions(dir.path(), 3)).unwrap();
    let store = OutputStore::create(&path).unwrap();
    run_session(
        conditions,
        store,
        None,
        &[
            Answer::Key('1', Duration::from_millis(300)),
            Answer::Key('2', Duration::from_millis(300)),
            Answer::Key('1', Duration::from_millis(300)),
        ],
    );
    let first = fs::read_to_string(&path).unwrap();

    assert!(matches!(
        ensure_fresh(&path),
        Err(SessionError::OutputExists { .. })
    ));
    assert!(matches!(
        OutputStore::create(&path),
        Err(SessionError::OutputExists { .. })
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn abort_keeps_only_completed_trials_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let conditions = load_conditions(write_conditions(dir.path(), 4)).unwrap();
    let path = dir.path().join("out.csv");
    let store = OutputStore::create(&path).unwrap();

    let timer = ManualTimer::new();
    let abort = AbortToken::new();
    let mut sm = StudyStateMachine::new(
        StudyConfig::default(),
        conditions,
        timer.clone(),
        store,
        abort.clone(),
    );
    for _ in 0..3 {
        sm.handle_key(KeyPress::Other).unwrap();
    }
    for _ in 0..2 {
        timer.advance(Duration::from_secs(1));
        sm.update().unwrap();
        timer.advance(Duration::from_millis(400));
        sm.handle_key(KeyPress::Char('1')).unwrap();
        timer.advance(Duration::from_millis(1500));
        sm.update().unwrap();
    }
    // Third trial is mid-stimulus when the operator aborts.
    timer.advance(Duration::from_secs(1));
    sm.update().unwrap();
    abort.cancel();
    sm.update().unwrap();

    assert!(sm.was_aborted());
    assert_eq!(sm.sink().rows(), 2);
    let rows = read_results(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].trial, 2);
}

#[test]
fn different_seeds_reorder_the_same_list() {
    let dir = tempfile::tempdir().unwrap();
    let conditions = load_conditions(write_conditions(dir.path(), 40)).unwrap();
    let a = select_trials(&conditions, None, &mut StdRng::seed_from_u64(1)).unwrap();
    let b = select_trials(&conditions, None, &mut StdRng::seed_from_u64(2)).unwrap();
    assert_eq!(a.len(), b.len());
    assert_ne!(a, b);
    for row in &a {
        assert!(b.contains(row));
    }
}
