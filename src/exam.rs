use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use crate::clock::Clock;
use crate::contest::{Contest, Label, Question};
use crate::session::{QuestionState, SessionState, StatusCounts};
use crate::store::{
    SessionStore, KEY_ANSWERS, KEY_CURRENT, KEY_START_TIME, KEY_SUBMITTED, KEY_VISITED,
};
use crate::timer::{Threshold, Timer, TimerEvent};

/// Final payload handed to the result consumer when a session ends. Contains
/// only locked-in answers; drafts never leave the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamResult {
    pub contest_id: String,
    pub contest_name: String,
    pub total_questions: u32,
    pub submitted: BTreeMap<u32, Label>,
    pub elapsed_secs: u64,
    pub auto_submitted: bool,
    pub finished_at: DateTime<Local>,
}

impl ExamResult {
    pub fn attempted(&self) -> u32 {
        self.submitted.len() as u32
    }
}

/// What a tick produced. After `Expired` the caller must stop ticking; the
/// session has already transitioned to its terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Running {
        remaining_secs: u64,
        warnings: Vec<String>,
    },
    Expired(ExamResult),
}

/// Top-level session orchestrator. Owns the clock, the durable store, the
/// timer, and the session state; every mutation goes through here and is
/// mirrored into the store before the call returns. Runs on a single event
/// loop, so there is no locking discipline beyond serialized calls.
pub struct ExamSession {
    contest: Contest,
    state: SessionState,
    timer: Timer,
    clock: Box<dyn Clock>,
    store: Box<dyn SessionStore>,
    resumed: bool,
    finished: bool,
    last_write_failed: bool,
}

impl ExamSession {
    /// Open a session for a contest: rehydrate from the store when entries
    /// exist, otherwise seed a fresh session and persist the start timestamp
    /// immediately (write-once).
    pub fn open(
        contest: Contest,
        clock: Box<dyn Clock>,
        store: Box<dyn SessionStore>,
        thresholds: Vec<Threshold>,
    ) -> Self {
        let saved_start = store
            .read(&contest.id, KEY_START_TIME)
            .and_then(|s| s.trim().parse::<i64>().ok());

        let (state, resumed) = match saved_start {
            Some(started_at_ms) => {
                let current = store
                    .read(&contest.id, KEY_CURRENT)
                    .and_then(|s| s.trim().parse::<u32>().ok())
                    .filter(|&q| q >= 1 && q <= contest.total_questions);
                let state = SessionState::rehydrate(
                    started_at_ms,
                    store.read(&contest.id, KEY_ANSWERS).as_deref(),
                    store.read(&contest.id, KEY_SUBMITTED).as_deref(),
                    store.read(&contest.id, KEY_VISITED).as_deref(),
                    current,
                );
                (state, true)
            }
            // Missing or corrupt start timestamp voids the whole resume.
            None => (SessionState::new(clock.now_ms()), false),
        };

        let timer = Timer::new(contest.duration_secs, state.started_at_ms, thresholds);
        let mut session = Self {
            contest,
            state,
            timer,
            clock,
            store,
            resumed,
            finished: false,
            last_write_failed: false,
        };
        if !resumed {
            let start = session.state.started_at_ms.to_string();
            session.persist(KEY_START_TIME, start);
            session.persist_navigation();
        }
        session
    }

    pub fn contest(&self) -> &Contest {
        &self.contest
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// True when this open picked up a persisted session instead of seeding
    /// a fresh one.
    pub fn resumed(&self) -> bool {
        self.resumed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True while the latest store write has failed: the session keeps
    /// operating in memory, but reload recovery is not guaranteed until a
    /// write succeeds again. Surfaced as a non-fatal warning, never a crash.
    pub fn persistence_degraded(&self) -> bool {
        self.last_write_failed
    }

    pub fn remaining_secs(&self) -> u64 {
        self.timer.remaining_secs(self.clock.now_ms())
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs(self.clock.now_ms())
    }

    pub fn current_question(&self) -> &Question {
        // current is maintained within [1, total] by every mutation path
        self.contest
            .question(self.state.current)
            .expect("current question in range")
    }

    pub fn current_subject(&self) -> &str {
        self.contest.subject_of(self.state.current).unwrap_or("")
    }

    pub fn question_state(&self, question: u32) -> QuestionState {
        self.state.question_state(question)
    }

    pub fn overall_counts(&self) -> StatusCounts {
        self.state.overall_counts(self.contest.total_questions)
    }

    pub fn unanswered_count(&self) -> u32 {
        self.state.unanswered_count(self.contest.total_questions)
    }

    /// Jump to any question, visited or not; there is no sequential-access
    /// restriction. Invalid targets are ignored without error.
    pub fn goto(&mut self, question: u32) {
        if self.finished {
            return;
        }
        if self.state.goto(question, self.contest.total_questions) {
            self.persist_navigation();
        }
    }

    pub fn next(&mut self) {
        if self.finished {
            return;
        }
        if self.state.next(self.contest.total_questions) {
            self.persist_navigation();
        }
    }

    pub fn previous(&mut self) {
        if self.finished {
            return;
        }
        if self.state.previous() {
            self.persist_navigation();
        }
    }

    /// Record a draft selection for a question. No-op when the question is
    /// already locked.
    pub fn select_draft(&mut self, question: u32, label: Label) {
        if self.finished {
            return;
        }
        if self.state.select_draft(question, label) {
            self.persist(KEY_ANSWERS, self.state.encode_answers());
        }
    }

    /// Lock in the draft for a question. The only operation that makes an
    /// answer final. Idempotent; returns whether this call did the locking.
    pub fn submit(&mut self, question: u32) -> bool {
        if self.finished {
            return false;
        }
        if self.state.submit(question) {
            self.persist(KEY_ANSWERS, self.state.encode_answers());
            self.persist(KEY_SUBMITTED, self.state.encode_submitted());
            true
        } else {
            false
        }
    }

    /// Advance the timer. Threshold warnings are momentary presentation
    /// events; the session stays running. Expiry auto-submits and is
    /// terminal.
    pub fn tick(&mut self) -> TickOutcome {
        if self.finished {
            return TickOutcome::Running {
                remaining_secs: 0,
                warnings: Vec::new(),
            };
        }
        let now = self.clock.now_ms();
        let events = self.timer.tick(now);
        let mut warnings = Vec::new();
        for event in events {
            match event {
                TimerEvent::Warning(message) => warnings.push(message),
                TimerEvent::Expired => return TickOutcome::Expired(self.finish(true)),
            }
        }
        TickOutcome::Running {
            remaining_secs: self.timer.remaining_secs(now),
            warnings,
        }
    }

    /// Explicit user-initiated termination, after the caller has confirmed
    /// the unanswered count with the user. `None` when already terminal.
    pub fn terminate(&mut self) -> Option<ExamResult> {
        if self.finished {
            return None;
        }
        Some(self.finish(false))
    }

    fn finish(&mut self, auto_submitted: bool) -> ExamResult {
        self.finished = true;
        // The contest id cannot be resumed after this; a fresh open starts a
        // brand-new session.
        let _ = self.store.clear(&self.contest.id);
        let elapsed = self.elapsed_secs().min(self.contest.duration_secs);
        ExamResult {
            contest_id: self.contest.id.clone(),
            contest_name: self.contest.name.clone(),
            total_questions: self.contest.total_questions,
            submitted: self.state.submitted.clone(),
            elapsed_secs: elapsed,
            auto_submitted,
            finished_at: Local::now(),
        }
    }

    fn persist_navigation(&mut self) {
        self.persist(KEY_VISITED, self.state.encode_visited());
        self.persist(KEY_CURRENT, self.state.current.to_string());
    }

    fn persist(&mut self, key: &str, value: String) {
        match self.store.write(&self.contest.id, key, &value) {
            Ok(()) => self.last_write_failed = false,
            Err(_) => self.last_write_failed = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::mock_contest;
    use crate::clock::FakeClock;
    use crate::store::{MemorySessionStore, SessionStore, KEY_START_TIME};
    use crate::timer::default_thresholds;

    fn open_session(clock: &FakeClock) -> ExamSession {
        ExamSession::open(
            mock_contest(),
            Box::new(clock.clone()),
            Box::new(MemorySessionStore::new()),
            default_thresholds(),
        )
    }

    #[test]
    fn fresh_open_seeds_start_time() {
        let clock = FakeClock::at(5_000);
        let session = open_session(&clock);
        assert!(!session.resumed());
        assert_eq!(session.state().started_at_ms, 5_000);
        assert_eq!(session.remaining_secs(), 3 * 3600);
    }

    #[test]
    fn finished_session_ignores_commands() {
        let clock = FakeClock::at(0);
        let mut session = open_session(&clock);
        session.select_draft(1, Label::A);
        let result = session.terminate().unwrap();
        assert_eq!(result.attempted(), 0);

        session.goto(5);
        session.select_draft(2, Label::B);
        assert!(!session.submit(2));
        assert_eq!(session.state().current, 1);
        assert!(session.terminate().is_none());
    }

    #[test]
    fn degraded_store_keeps_session_running() {
        let clock = FakeClock::at(0);
        let mut store = MemorySessionStore::new();
        store.fail_writes = true;
        let mut session = ExamSession::open(
            mock_contest(),
            Box::new(clock.clone()),
            Box::new(store),
            default_thresholds(),
        );
        assert!(session.persistence_degraded());

        // everything still works in memory
        session.goto(10);
        session.select_draft(10, Label::C);
        assert!(session.submit(10));
        assert_eq!(session.state().submitted[&10], Label::C);
        assert!(session.persistence_degraded());
    }

    #[test]
    fn corrupt_start_time_seeds_fresh_session() {
        let clock = FakeClock::at(77_000);
        let mut store = MemorySessionStore::new();
        store.write("jee-mock-12", KEY_START_TIME, "garbage").unwrap();
        let session = ExamSession::open(
            mock_contest(),
            Box::new(clock.clone()),
            Box::new(store),
            default_thresholds(),
        );
        assert!(!session.resumed());
        assert_eq!(session.state().started_at_ms, 77_000);
    }
}
