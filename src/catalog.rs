use include_dir::{include_dir, Dir};
use std::error::Error;
use std::path::Path;

use crate::contest::{Choice, Contest, Label, Question, SubjectRange};

static CONTEST_DIR: Dir = include_dir!("src/contests");

/// Identifier served by the generated mock paper rather than a bundled file.
pub const MOCK_CONTEST_ID: &str = "jee-mock-12";

/// Supplies contests by identifier. The engine only ever consumes the
/// returned `Contest`; where the content comes from is the catalog's
/// business.
pub trait ContestCatalog {
    fn contest_ids(&self) -> Vec<String>;
    fn fetch_contest(&self, id: &str) -> Result<Contest, Box<dyn Error>>;
}

/// Catalog of contests compiled into the binary, plus the generated
/// three-subject mock paper.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCatalog;

impl ContestCatalog for BundledCatalog {
    fn contest_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = CONTEST_DIR
            .files()
            .filter_map(|f| {
                let name = f.path().file_name()?.to_str()?;
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        ids.push(MOCK_CONTEST_ID.to_string());
        ids.sort();
        ids
    }

    fn fetch_contest(&self, id: &str) -> Result<Contest, Box<dyn Error>> {
        if id == MOCK_CONTEST_ID {
            return Ok(mock_contest());
        }
        let file = CONTEST_DIR
            .get_file(format!("{id}.json"))
            .ok_or_else(|| format!("unknown contest '{id}'"))?;
        let text = file
            .contents_utf8()
            .ok_or_else(|| format!("contest '{id}' is not valid utf-8"))?;
        let contest: Contest = serde_json::from_str(text)?;
        contest.validate()?;
        Ok(contest)
    }
}

/// Load a contest definition from a JSON file on disk (`--contest-file`).
pub fn load_contest_file(path: &Path) -> Result<Contest, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let contest: Contest = serde_json::from_str(&text)?;
    contest.validate()?;
    Ok(contest)
}

/// The 90-question, three-hour mock paper: Physics 1-30, Chemistry 31-60,
/// Mathematics 61-90, with placeholder prompts.
pub fn mock_contest() -> Contest {
    let subject_ranges = vec![
        SubjectRange {
            name: "Physics".to_string(),
            start: 1,
            end: 30,
        },
        SubjectRange {
            name: "Chemistry".to_string(),
            start: 31,
            end: 60,
        },
        SubjectRange {
            name: "Mathematics".to_string(),
            start: 61,
            end: 90,
        },
    ];
    let questions = (1..=90)
        .map(|number| {
            let subject = subject_ranges
                .iter()
                .find(|r| r.contains(number))
                .map(|r| r.name.as_str())
                .unwrap_or("General");
            Question {
                number,
                prompt: format!(
                    "Sample question {} for {}. This is a placeholder problem statement.",
                    number, subject
                ),
                choices: Label::ALL
                    .iter()
                    .map(|&label| Choice {
                        label,
                        text: format!("Option {} for question {}", label, number),
                    })
                    .collect(),
            }
        })
        .collect();
    Contest {
        id: MOCK_CONTEST_ID.to_string(),
        name: "JEE Mock Test #12".to_string(),
        total_questions: 90,
        duration_secs: 3 * 60 * 60,
        subject_ranges,
        questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_lists_demo_and_mock() {
        let ids = BundledCatalog.contest_ids();
        assert!(ids.contains(&"demo".to_string()));
        assert!(ids.contains(&MOCK_CONTEST_ID.to_string()));
    }

    #[test]
    fn fetch_demo_contest() {
        let contest = BundledCatalog.fetch_contest("demo").unwrap();
        assert_eq!(contest.id, "demo");
        assert_eq!(contest.total_questions, 12);
        assert_eq!(contest.subject_ranges.len(), 3);
        assert!(contest.validate().is_ok());
    }

    #[test]
    fn fetch_unknown_contest_fails() {
        assert!(BundledCatalog.fetch_contest("nope").is_err());
    }

    #[test]
    fn mock_contest_is_valid() {
        let contest = mock_contest();
        assert_eq!(contest.total_questions, 90);
        assert_eq!(contest.duration_secs, 10_800);
        assert!(contest.validate().is_ok());
        assert_eq!(contest.subject_of(45), Some("Chemistry"));
    }

    #[test]
    fn fetch_mock_by_id() {
        let contest = BundledCatalog.fetch_contest(MOCK_CONTEST_ID).unwrap();
        assert_eq!(contest.name, "JEE Mock Test #12");
    }

    #[test]
    fn load_contest_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let contest = mock_contest();
        std::fs::write(&path, serde_json::to_string(&contest).unwrap()).unwrap();

        let loaded = load_contest_file(&path).unwrap();
        assert_eq!(loaded.id, contest.id);
        assert_eq!(loaded.total_questions, 90);
    }

    #[test]
    fn load_contest_file_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let mut contest = mock_contest();
        contest.subject_ranges[0].start = 2;
        std::fs::write(&path, serde_json::to_string(&contest).unwrap()).unwrap();
        assert!(load_contest_file(&path).is_err());
    }
}
