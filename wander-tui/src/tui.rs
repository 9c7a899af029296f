use crate::{
    command::{Command, parse_command, parse_key},
    feeders,
    view::{self, Screen},
};
use anyhow::{Context, Result};
use crossterm::{
    event::{Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{self, Stdout},
    time::Duration,
};
use tokio::{sync::mpsc, time};
use wander_session::{Action, SessionView, Wanderer};

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK: Duration = Duration::from_millis(80);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Single keys trigger actions.
    #[default]
    Keys,
    /// Typing into the jump box.
    Search,
}

/// Input line, mode and transient notices. Holds no terminal so key
/// handling can be driven directly.
#[derive(Debug, Default)]
pub struct UiState {
    pub mode: Mode,
    pub input: String,
    pub input_cursor: usize,
    pub notice: Option<String>,
    pub show_help: bool,
    busy: bool,
    spin_idx: usize,
}

impl UiState {
    fn cursor_left(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        while self.input_cursor > 0 && !self.input.is_char_boundary(self.input_cursor) {
            self.input_cursor -= 1;
        }
    }

    fn cursor_right(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        self.input_cursor += 1;
        while self.input_cursor < self.input.len()
            && !self.input.is_char_boundary(self.input_cursor)
        {
            self.input_cursor += 1;
        }
    }

    fn insert_char(&mut self, ch: char) {
        self.input.insert(self.input_cursor, ch);
        self.input_cursor += ch.len_utf8();
    }

    fn backspace(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        let mut prev = self.input_cursor.saturating_sub(1);
        while prev > 0 && !self.input.is_char_boundary(prev) {
            prev -= 1;
        }
        self.input.drain(prev..self.input_cursor);
        self.input_cursor = prev;
    }

    fn delete(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        let start = self.input_cursor;
        let mut end = start + 1;
        while end < self.input.len() && !self.input.is_char_boundary(end) {
            end += 1;
        }
        self.input.drain(start..end);
    }

    fn leave_search(&mut self) {
        self.mode = Mode::Keys;
        self.input.clear();
        self.input_cursor = 0;
    }

    fn spinner(&self) -> &'static str {
        if self.busy {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    /// Map one key press to a command. Editing keys in the jump box are
    /// consumed here and yield `None`.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
            return Some(Command::Quit);
        }
        self.notice = None;

        let cmd = match self.mode {
            Mode::Keys => match key.code {
                KeyCode::Esc => {
                    self.show_help = false;
                    None
                }
                KeyCode::Char(ch) => parse_key(ch),
                _ => None,
            },
            Mode::Search => match key.code {
                KeyCode::Enter => {
                    let line = std::mem::take(&mut self.input);
                    self.leave_search();
                    Some(line)
                        .filter(|l| !l.trim().is_empty())
                        .map(|l| parse_command(&l))
                }
                code => {
                    match code {
                        KeyCode::Esc => self.leave_search(),
                        KeyCode::Left => self.cursor_left(),
                        KeyCode::Right => self.cursor_right(),
                        KeyCode::Home => self.input_cursor = 0,
                        KeyCode::End => self.input_cursor = self.input.len(),
                        KeyCode::Backspace => self.backspace(),
                        KeyCode::Delete => self.delete(),
                        KeyCode::Char(ch) => self.insert_char(ch),
                        _ => {}
                    }
                    None
                }
            },
        };

        match cmd {
            Some(Command::Search) => {
                self.mode = Mode::Search;
                self.show_help = false;
                None
            }
            Some(Command::Help) => {
                self.show_help = !self.show_help;
                None
            }
            Some(Command::Unknown(s)) => {
                self.notice = Some(format!("Unknown command: {s}. Press ? for keys."));
                None
            }
            other => other,
        }
    }
}

struct Tui {
    term: Terminal<CrosstermBackend<Stdout>>,
    state: UiState,
}

impl Tui {
    fn enter() -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;
        term.clear()?;
        Ok(Self {
            term,
            state: UiState::default(),
        })
    }

    fn draw(&mut self, view: &SessionView) -> Result<()> {
        let screen = Screen {
            view,
            mode: self.state.mode,
            input: &self.state.input,
            input_cursor: self.state.input_cursor,
            notice: self.state.notice.as_deref(),
            show_help: self.state.show_help,
            busy: self.state.busy,
            spinner: self.state.spinner(),
        };
        view::draw(&mut self.term, &screen)
    }

    /// Run one action to completion, animating the spinner over the last
    /// frame while the request is in flight.
    async fn perform(&mut self, wanderer: &mut Wanderer, action: Action) -> Result<()> {
        let before = wanderer.view();
        self.state.busy = true;
        self.state.show_help = false;
        let mut ticker = time::interval(TICK);

        let fut = wanderer.apply(action);
        tokio::pin!(fut);
        loop {
            tokio::select! {
                res = &mut fut => {
                    if let Err(e) = res {
                        tracing::debug!(target: "tui", error = %e, "tui.action_failed");
                    }
                    break;
                }
                _ = ticker.tick() => {
                    self.state.spin_idx = (self.state.spin_idx + 1) % BRAILLE_FRAMES.len();
                    self.draw(&before)?;
                }
            }
        }

        self.state.busy = false;
        Ok(())
    }

    async fn event_loop(&mut self, wanderer: &mut Wanderer, start: Option<String>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(64);
        let feeder = feeders::spawn_input_feeder(tx);

        if let Some(title) = start {
            self.perform(wanderer, Action::Jump(title)).await?;
        }
        if wanderer.current().is_none() {
            // keep the jump failure visible if the random start succeeds
            let status = wanderer.view().status;
            self.perform(wanderer, Action::RandomStart).await?;
            if wanderer.view().status.is_none() {
                self.state.notice = status;
            }
        }

        loop {
            self.draw(&wanderer.view())?;
            let Some(ev) = rx.recv().await else { break };
            let ev = ev.context("reading terminal input")?;
            let CtEvent::Key(key) = ev else { continue };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match self.state.handle_key(key) {
                Some(Command::Quit) => break,
                Some(Command::Act(action)) => self.perform(wanderer, action).await?,
                _ => {}
            }
        }

        drop(rx);
        let _ = feeder.await;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        disable_raw_mode().ok();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = self.term.show_cursor();
    }
}

/// Take over the terminal and wander until the user quits.
///
/// With `start`, the first article is looked up like a jump; otherwise (or
/// when that lookup fails) a random article opens.
pub async fn run(wanderer: &mut Wanderer, start: Option<String>) -> Result<()> {
    let mut tui = Tui::enter()?;
    let result = tui.event_loop(wanderer, start).await;
    drop(tui);
    if let Err(e) = &result {
        tracing::error!(target: "tui", error = %e, "tui.exit_with_error");
    }
    result
}
