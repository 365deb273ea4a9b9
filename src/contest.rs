use serde::{Deserialize, Serialize};

/// The four answer labels every question carries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
pub enum Label {
    A,
    B,
    C,
    D,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::A, Label::B, Label::C, Label::D];

    pub fn from_char(c: char) -> Option<Label> {
        match c.to_ascii_uppercase() {
            'A' => Some(Label::A),
            'B' => Some(Label::B),
            'C' => Some(Label::C),
            'D' => Some(Label::D),
            _ => None,
        }
    }

    /// Label for a zero-based choice index ('1' key selects A, etc).
    pub fn from_index(idx: usize) -> Option<Label> {
        Label::ALL.get(idx).copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub label: Label,
    pub text: String,
}

/// A single multiple-choice question, identified by its 1-indexed position.
/// Read-only for the engine; the subject is derived from the range it falls
/// in, not stored per question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub number: u32,
    pub prompt: String,
    pub choices: Vec<Choice>,
}

impl Question {
    pub fn choice(&self, label: Label) -> Option<&Choice> {
        self.choices.iter().find(|c| c.label == label)
    }
}

/// A named, contiguous, 1-indexed inclusive interval of question numbers
/// belonging to one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRange {
    pub name: String,
    pub start: u32,
    pub end: u32,
}

impl SubjectRange {
    pub fn contains(&self, question: u32) -> bool {
        self.start <= question && question <= self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// One timed, multi-question exam instance. Immutable for the lifetime of a
/// session; supplied by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contest {
    pub id: String,
    pub name: String,
    pub total_questions: u32,
    pub duration_secs: u64,
    pub subject_ranges: Vec<SubjectRange>,
    pub questions: Vec<Question>,
}

impl Contest {
    /// Subject name a question number belongs to. Ranges partition the
    /// question space, so any valid number resolves to exactly one subject.
    pub fn subject_of(&self, question: u32) -> Option<&str> {
        self.subject_ranges
            .iter()
            .find(|r| r.contains(question))
            .map(|r| r.name.as_str())
    }

    pub fn question(&self, number: u32) -> Option<&Question> {
        if number == 0 || number > self.total_questions {
            return None;
        }
        self.questions.get(number as usize - 1)
    }

    /// Structural checks: ranges partition [1, total] exactly, questions are
    /// numbered densely in order, and every question has choices A..D.
    pub fn validate(&self) -> Result<(), String> {
        if self.total_questions == 0 {
            return Err("contest has no questions".into());
        }
        if self.questions.len() as u32 != self.total_questions {
            return Err(format!(
                "contest declares {} questions but carries {}",
                self.total_questions,
                self.questions.len()
            ));
        }
        for (idx, q) in self.questions.iter().enumerate() {
            let expected = idx as u32 + 1;
            if q.number != expected {
                return Err(format!(
                    "question at position {} is numbered {}",
                    expected, q.number
                ));
            }
            let labels: Vec<Label> = q.choices.iter().map(|c| c.label).collect();
            if labels != Label::ALL {
                return Err(format!("question {} must carry choices A..D", q.number));
            }
        }
        let mut expected_start = 1;
        for range in &self.subject_ranges {
            if range.is_empty() {
                return Err(format!("subject range {} is empty", range.name));
            }
            if range.start != expected_start {
                return Err(format!(
                    "subject range {} starts at {}, expected {}",
                    range.name, range.start, expected_start
                ));
            }
            expected_start = range.end + 1;
        }
        if expected_start != self.total_questions + 1 {
            return Err(format!(
                "subject ranges cover [1, {}], contest has {} questions",
                expected_start - 1,
                self.total_questions
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_subject_contest() -> Contest {
        let questions = (1..=90)
            .map(|number| Question {
                number,
                prompt: format!("Question {}", number),
                choices: Label::ALL
                    .iter()
                    .map(|&label| Choice {
                        label,
                        text: format!("Option {}", label),
                    })
                    .collect(),
            })
            .collect();
        Contest {
            id: "mock".into(),
            name: "Mock Test".into(),
            total_questions: 90,
            duration_secs: 3 * 60 * 60,
            subject_ranges: vec![
                SubjectRange {
                    name: "Physics".into(),
                    start: 1,
                    end: 30,
                },
                SubjectRange {
                    name: "Chemistry".into(),
                    start: 31,
                    end: 60,
                },
                SubjectRange {
                    name: "Mathematics".into(),
                    start: 61,
                    end: 90,
                },
            ],
            questions,
        }
    }

    #[test]
    fn test_label_from_char() {
        assert_eq!(Label::from_char('a'), Some(Label::A));
        assert_eq!(Label::from_char('D'), Some(Label::D));
        assert_eq!(Label::from_char('e'), None);
    }

    #[test]
    fn test_label_from_index() {
        assert_eq!(Label::from_index(0), Some(Label::A));
        assert_eq!(Label::from_index(3), Some(Label::D));
        assert_eq!(Label::from_index(4), None);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::B.to_string(), "B");
    }

    #[test]
    fn test_label_serde_roundtrip() {
        let json = serde_json::to_string(&Label::C).unwrap();
        assert_eq!(json, "\"C\"");
        let back: Label = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Label::C);
    }

    #[test]
    fn test_subject_of_middle_range() {
        let contest = three_subject_contest();
        assert_eq!(contest.subject_of(45), Some("Chemistry"));
        assert_eq!(contest.subject_of(1), Some("Physics"));
        assert_eq!(contest.subject_of(30), Some("Physics"));
        assert_eq!(contest.subject_of(31), Some("Chemistry"));
        assert_eq!(contest.subject_of(90), Some("Mathematics"));
        assert_eq!(contest.subject_of(91), None);
        assert_eq!(contest.subject_of(0), None);
    }

    #[test]
    fn test_question_lookup() {
        let contest = three_subject_contest();
        assert_eq!(contest.question(1).unwrap().number, 1);
        assert_eq!(contest.question(90).unwrap().number, 90);
        assert!(contest.question(0).is_none());
        assert!(contest.question(91).is_none());
    }

    #[test]
    fn test_validate_ok() {
        assert!(three_subject_contest().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_gap_in_ranges() {
        let mut contest = three_subject_contest();
        contest.subject_ranges[1].start = 32;
        assert!(contest.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_coverage() {
        let mut contest = three_subject_contest();
        contest.subject_ranges[2].end = 89;
        assert!(contest.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_question_count_mismatch() {
        let mut contest = three_subject_contest();
        contest.questions.pop();
        assert!(contest.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_choices() {
        let mut contest = three_subject_contest();
        contest.questions[4].choices.pop();
        assert!(contest.validate().is_err());
    }
}
