use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Store entry suffixes, one per persisted piece of session state.
/// All entries for a contest are written/removed together so a resume
/// always sees a consistent snapshot.
pub const KEY_START_TIME: &str = "start_time";
pub const KEY_ANSWERS: &str = "answers";
pub const KEY_SUBMITTED: &str = "submitted_answers";
pub const KEY_VISITED: &str = "visited_questions";
pub const KEY_CURRENT: &str = "current_question";

/// Every entry suffix the engine persists, in clear order.
pub const ALL_KEYS: [&str; 5] = [
    KEY_START_TIME,
    KEY_ANSWERS,
    KEY_SUBMITTED,
    KEY_VISITED,
    KEY_CURRENT,
];

/// Durable key-value persistence scoped by contest identifier. Survives
/// process restarts but not explicit session termination. Values are opaque
/// strings; encoding is the caller's concern.
pub trait SessionStore {
    fn read(&self, contest_id: &str, key: &str) -> Option<String>;
    fn write(&mut self, contest_id: &str, key: &str, value: &str) -> io::Result<()>;
    fn remove(&mut self, contest_id: &str, key: &str) -> io::Result<()>;

    /// Drop every entry for a contest. Used at session end; the contest id
    /// cannot be resumed afterwards.
    fn clear(&mut self, contest_id: &str) -> io::Result<()> {
        for key in ALL_KEYS {
            self.remove(contest_id, key)?;
        }
        Ok(())
    }
}

fn entry_name(contest_id: &str, key: &str) -> String {
    // Contest ids come from catalog files; defang anything path-hostile.
    let safe: String = contest_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("contest_{}_{}", safe, key)
}

/// One file per entry under a sessions directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn entry_path(&self, contest_id: &str, key: &str) -> PathBuf {
        self.dir.join(entry_name(contest_id, key))
    }
}

impl SessionStore for FileSessionStore {
    fn read(&self, contest_id: &str, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(contest_id, key)).ok()
    }

    fn write(&mut self, contest_id: &str, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry_path(contest_id, key), value)
    }

    fn remove(&mut self, contest_id: &str, key: &str) -> io::Result<()> {
        match fs::remove_file(self.entry_path(contest_id, key)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// In-memory store for tests. `fail_writes` simulates a full/broken backing
/// store so degraded-mode behavior can be exercised.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: HashMap<String, String>,
    pub fail_writes: bool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self, contest_id: &str, key: &str) -> Option<String> {
        self.entries.get(&entry_name(contest_id, key)).cloned()
    }

    fn write(&mut self, contest_id: &str, key: &str, value: &str) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "store write failed"));
        }
        self.entries
            .insert(entry_name(contest_id, key), value.to_string());
        Ok(())
    }

    fn remove(&mut self, contest_id: &str, key: &str) -> io::Result<()> {
        self.entries.remove(&entry_name(contest_id, key));
        Ok(())
    }
}
