mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use examr::{
    app_dirs::AppDirs,
    catalog::{load_contest_file, BundledCatalog, ContestCatalog},
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    contest::{Contest, Label},
    exam::{ExamResult, ExamSession, TickOutcome},
    history::{append_result_log, AttemptRecord, HistoryDb, ResultSink},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    store::{FileSessionStore, SessionStore},
    TICK_RATE_MS,
};

/// timed exam-session tui with crash-safe resume and locked-in answers
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed multi-subject exam TUI: navigate freely, lock in answers one at a \
                  time, get warned as the clock runs down, and resume exactly where you left \
                  off after a crash or restart."
)]
pub struct Cli {
    /// contest to take (see --list)
    #[clap(default_value = "demo")]
    contest: String,

    /// list available contests and exit
    #[clap(long)]
    list: bool,

    /// load the contest definition from a JSON file instead of the bundle
    #[clap(short = 'f', long)]
    contest_file: Option<PathBuf>,

    /// override the contest duration in seconds
    #[clap(short = 'd', long)]
    duration_secs: Option<u64>,

    /// directory for in-flight session state (defaults to the platform state dir)
    #[clap(long)]
    storage_dir: Option<PathBuf>,

    /// discard any saved session for this contest and start over
    #[clap(long)]
    fresh: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Taking,
    ConfirmEnd,
    Summary,
}

pub struct App {
    pub exam: ExamSession,
    pub state: AppState,
    pub config: Config,
    /// Active time-warning overlay; any key dismisses it.
    pub warning: Option<String>,
    /// Digits typed so far for a direct question jump.
    pub jump_input: Option<String>,
    pub result: Option<ExamResult>,
    pub past_attempts: Vec<AttemptRecord>,
}

impl App {
    pub fn new(exam: ExamSession, config: Config) -> Self {
        Self {
            exam,
            state: AppState::Taking,
            config,
            warning: None,
            jump_input: None,
            result: None,
            past_attempts: Vec::new(),
        }
    }

    /// Hand the final payload to the result consumers and switch to the
    /// summary screen. Reporting failures never block the summary.
    fn finish(&mut self, result: ExamResult, history: &mut Option<HistoryDb>) {
        if let Some(db) = history {
            let _ = db.record(&result);
            self.past_attempts = db.attempts_for(&result.contest_id).unwrap_or_default();
        }
        if let Some(log_path) = AppDirs::results_log_path() {
            let _ = append_result_log(&log_path, &result);
        }
        self.result = Some(result);
        self.warning = None;
        self.jump_input = None;
        self.state = AppState::Summary;
    }
}

fn resolve_contest(cli: &Cli) -> Result<Contest, Box<dyn Error>> {
    let mut contest = match &cli.contest_file {
        Some(path) => load_contest_file(path)?,
        None => BundledCatalog.fetch_contest(&cli.contest)?,
    };
    if let Some(secs) = cli.duration_secs {
        contest.duration_secs = secs;
    }
    Ok(contest)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list {
        for id in BundledCatalog.contest_ids() {
            match BundledCatalog.fetch_contest(&id) {
                Ok(c) => println!(
                    "{:<14} {} ({} questions, {})",
                    id,
                    c.name,
                    c.total_questions,
                    examr::util::format_hms(c.duration_secs)
                ),
                Err(_) => println!("{}", id),
            }
        }
        return Ok(());
    }

    let contest = match resolve_contest(&cli) {
        Ok(contest) => contest,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let sessions_dir = cli
        .storage_dir
        .clone()
        .or_else(AppDirs::sessions_dir)
        .unwrap_or_else(|| PathBuf::from(".examr_sessions"));
    let mut store = FileSessionStore::new(&sessions_dir);
    if cli.fresh {
        store.clear(&contest.id)?;
    }

    let config = FileConfigStore::new().load();
    let mut history = HistoryDb::new().ok();

    let exam = ExamSession::open(
        contest,
        Box::new(SystemClock),
        Box::new(store),
        config.thresholds(),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(exam, config);
    let run = start_tui(&mut terminal, &mut app, &mut history);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    run
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    history: &mut Option<HistoryDb>,
) -> Result<(), Box<dyn Error>> {
    let events = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match events.step() {
            AppEvent::Tick => {
                if !app.exam.is_finished() {
                    match app.exam.tick() {
                        TickOutcome::Running { warnings, .. } => {
                            if let Some(message) = warnings.into_iter().last() {
                                app.warning = Some(message);
                            }
                        }
                        TickOutcome::Expired(result) => app.finish(result, history),
                    }
                }
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if handle_key(app, key, history) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Apply one key press. Returns true when the app should exit. Quitting
/// mid-exam leaves the persisted session behind, so a later open resumes it.
fn handle_key(app: &mut App, key: KeyEvent, history: &mut Option<HistoryDb>) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    // A warning overlay swallows the next key press
    if app.warning.take().is_some() {
        return false;
    }

    match app.state {
        AppState::Taking => handle_taking_key(app, key),
        AppState::ConfirmEnd => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    if let Some(result) = app.exam.terminate() {
                        app.finish(result, history);
                    }
                }
                _ => app.state = AppState::Taking,
            }
            false
        }
        AppState::Summary => matches!(
            key.code,
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter
        ),
    }
}

fn handle_taking_key(app: &mut App, key: KeyEvent) -> bool {
    // Direct-jump entry mode: collect digits until Enter
    if let Some(buffer) = &mut app.jump_input {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => buffer.push(c),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Enter => {
                if let Ok(question) = buffer.parse::<u32>() {
                    app.exam.goto(question);
                }
                app.jump_input = None;
            }
            KeyCode::Esc => app.jump_input = None,
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Left => app.exam.previous(),
        KeyCode::Right => app.exam.next(),
        KeyCode::Enter => {
            let current = app.exam.state().current;
            app.exam.submit(current);
        }
        KeyCode::Char('g') => app.jump_input = Some(String::new()),
        KeyCode::Char('e') => app.state = AppState::ConfirmEnd,
        KeyCode::Char(c) => {
            let label = Label::from_char(c).or_else(|| {
                c.to_digit(10)
                    .and_then(|d| (d as usize).checked_sub(1))
                    .and_then(Label::from_index)
            });
            if let Some(label) = label {
                let current = app.exam.state().current;
                app.exam.select_draft(current, label);
            }
        }
        _ => {}
    }
    false
}
