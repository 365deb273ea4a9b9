// Full result-consumer flow: finish a session and feed the payload through
// the history sink, the way the binary does on session end.

use examr::catalog::mock_contest;
use examr::clock::FakeClock;
use examr::contest::Label;
use examr::exam::ExamSession;
use examr::history::{append_result_log, HistoryDb, ResultSink};
use examr::store::MemorySessionStore;
use examr::timer::default_thresholds;

fn finished_result(attempted: u32) -> examr::exam::ExamResult {
    let clock = FakeClock::at(0);
    let mut session = ExamSession::open(
        mock_contest(),
        Box::new(clock.clone()),
        Box::new(MemorySessionStore::new()),
        default_thresholds(),
    );
    for q in 1..=attempted {
        session.goto(q);
        session.select_draft(q, Label::C);
        session.submit(q);
    }
    clock.advance_secs(1_234);
    session.terminate().unwrap()
}

#[test]
fn history_records_finished_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = HistoryDb::open_at(&dir.path().join("history.db")).unwrap();

    db.record(&finished_result(3)).unwrap();
    db.record(&finished_result(7)).unwrap();

    let attempts = db.attempts_for("jee-mock-12").unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].total_questions, 90);
    assert_eq!(attempts[0].elapsed_secs, 1_234);
    let mut counts: Vec<u32> = attempts.iter().map(|a| a.attempted).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![3, 7]);
}

#[test]
fn history_is_scoped_by_contest() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = HistoryDb::open_at(&dir.path().join("history.db")).unwrap();
    db.record(&finished_result(1)).unwrap();

    assert!(db.attempts_for("demo").unwrap().is_empty());
    assert_eq!(db.attempt_count("jee-mock-12").unwrap(), 1);
}

#[test]
fn csv_log_accumulates_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");

    append_result_log(&path, &finished_result(2)).unwrap();
    append_result_log(&path, &finished_result(5)).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 3); // header + two rows
    assert!(contents.lines().nth(1).unwrap().contains("jee-mock-12"));
}
