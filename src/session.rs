use std::collections::{BTreeMap, BTreeSet};

use crate::contest::{Label, SubjectRange};

/// Derived display state of a question number. Precedence when several
/// apply: answered > current > visited > unvisited, so a submitted question
/// keeps reading as answered even while it is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionState {
    Answered,
    Current,
    Visited,
    Unvisited,
}

/// Attempted / visited-only / unvisited tallies for a subject or the whole
/// paper. Always derived from session state, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub attempted: u32,
    pub visited: u32,
    pub unvisited: u32,
}

/// The mutable heart of one exam session. Pure in-memory; the lifecycle
/// controller mirrors it into the durable store after each mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Wall-clock instant the session began (epoch ms). Set once.
    pub started_at_ms: i64,
    /// Draft selections, freely revisable until the question is submitted.
    pub answers: BTreeMap<u32, Label>,
    /// Locked-in answers. Write-once per question.
    pub submitted: BTreeMap<u32, Label>,
    /// Every question that has ever been current. Grows monotonically.
    pub visited: BTreeSet<u32>,
    /// Question on display; always within [1, total] and always visited.
    pub current: u32,
}

impl SessionState {
    pub fn new(started_at_ms: i64) -> Self {
        Self {
            started_at_ms,
            answers: BTreeMap::new(),
            submitted: BTreeMap::new(),
            visited: BTreeSet::from([1]),
            current: 1,
        }
    }

    /// Rebuild from persisted entries. A corrupt map/set entry degrades to
    /// empty rather than failing the load; the caller has already vetted
    /// `started_at_ms`.
    pub fn rehydrate(
        started_at_ms: i64,
        answers_json: Option<&str>,
        submitted_json: Option<&str>,
        visited_json: Option<&str>,
        current: Option<u32>,
    ) -> Self {
        let answers = answers_json.and_then(decode_answer_map).unwrap_or_default();
        let submitted = submitted_json.and_then(decode_answer_map).unwrap_or_default();
        let mut visited: BTreeSet<u32> = visited_json
            .and_then(|s| serde_json::from_str::<Vec<u32>>(s).ok())
            .map(|v| v.into_iter().collect())
            .unwrap_or_default();
        let current = current.unwrap_or(1);
        visited.insert(current);
        Self {
            started_at_ms,
            answers,
            submitted,
            visited,
            current,
        }
    }

    /// Display state for a question number, with the fixed precedence rule.
    /// This is the single source of truth for every rendering surface.
    pub fn question_state(&self, question: u32) -> QuestionState {
        if self.submitted.contains_key(&question) {
            QuestionState::Answered
        } else if question == self.current {
            QuestionState::Current
        } else if self.visited.contains(&question) {
            QuestionState::Visited
        } else {
            QuestionState::Unvisited
        }
    }

    /// Jump to any question in range. Marks it visited. Out-of-range targets
    /// are rejected without state change.
    pub fn goto(&mut self, question: u32, total: u32) -> bool {
        if question == 0 || question > total {
            return false;
        }
        self.current = question;
        self.visited.insert(question);
        true
    }

    /// Step forward, clamped at the last question (no-op at the boundary).
    pub fn next(&mut self, total: u32) -> bool {
        if self.current < total {
            self.goto(self.current + 1, total)
        } else {
            false
        }
    }

    /// Step back, clamped at question 1.
    pub fn previous(&mut self) -> bool {
        if self.current > 1 {
            let target = self.current - 1;
            self.current = target;
            self.visited.insert(target);
            true
        } else {
            false
        }
    }

    /// Record a draft selection. Silent no-op once the question is locked;
    /// the one-shot rule lives here, not in the presentation layer.
    pub fn select_draft(&mut self, question: u32, label: Label) -> bool {
        if self.submitted.contains_key(&question) {
            return false;
        }
        self.answers.insert(question, label);
        true
    }

    /// Lock in the current draft for a question. Requires a draft; repeat
    /// calls are no-ops so duplicate UI events cannot double-fire.
    pub fn submit(&mut self, question: u32) -> bool {
        if self.submitted.contains_key(&question) {
            return false;
        }
        match self.answers.get(&question) {
            Some(&label) => {
                self.submitted.insert(question, label);
                true
            }
            None => false,
        }
    }

    pub fn subject_counts(&self, range: &SubjectRange) -> StatusCounts {
        self.counts_over(range.start, range.end)
    }

    pub fn overall_counts(&self, total: u32) -> StatusCounts {
        self.counts_over(1, total)
    }

    fn counts_over(&self, start: u32, end: u32) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for q in start..=end {
            if self.submitted.contains_key(&q) {
                counts.attempted += 1;
            } else if self.visited.contains(&q) {
                counts.visited += 1;
            } else {
                counts.unvisited += 1;
            }
        }
        counts
    }

    /// Questions with no locked-in answer; shown in the end-test
    /// confirmation.
    pub fn unanswered_count(&self, total: u32) -> u32 {
        total - self.submitted.len() as u32
    }

    // Persisted encodings. Maps serialize with stringified number keys and
    // the visited set as a plain array, matching the store layout.

    pub fn encode_answers(&self) -> String {
        encode_answer_map(&self.answers)
    }

    pub fn encode_submitted(&self) -> String {
        encode_answer_map(&self.submitted)
    }

    pub fn encode_visited(&self) -> String {
        let numbers: Vec<u32> = self.visited.iter().copied().collect();
        serde_json::to_string(&numbers).unwrap_or_else(|_| "[]".to_string())
    }
}

fn encode_answer_map(map: &BTreeMap<u32, Label>) -> String {
    serde_json::to_string(map).unwrap_or_else(|_| "{}".to_string())
}

fn decode_answer_map(json: &str) -> Option<BTreeMap<u32, Label>> {
    serde_json::from_str(json).ok()
}
