use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, KeyCode};
use ratatui::{
    DefaultTerminal,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph},
};
use tokio::sync::broadcast::{self, error::TryRecvError};

use kinetic::backend::Backend;
use kinetic::session::{
    Exercise, RunningState, SessionEvent, WorkoutSessionManager, format_elapsed,
};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const HELP: &str =
    "j/k: move | space: done | w/r: weight/reps | a/x: add/remove set | e: exercise | p: pause | s: save | d: discard | q: quit";

enum InputMode {
    Normal,
    EditingWeight,
    EditingReps,
    AddingExercise,
}

/// How the screen was left.
pub enum WorkoutOutcome {
    Saved(i64),
    Discarded,
    Quit,
}

enum Row {
    Exercise(usize),
    Set(usize, usize),
}

struct WorkoutScreen<'a, B: Backend> {
    manager: WorkoutSessionManager,
    backend: &'a B,
    events: broadcast::Receiver<SessionEvent>,
    selected: usize,
    status_message: String,
    input_mode: InputMode,
    input_buffer: String,
    confirm_quit: bool,
}

impl<'a, B: Backend> WorkoutScreen<'a, B> {
    fn new(manager: WorkoutSessionManager, backend: &'a B) -> Self {
        let events = manager.subscribe();
        Self {
            manager,
            backend,
            events,
            selected: 0,
            status_message: HELP.to_string(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            confirm_quit: false,
        }
    }

    fn rows(exercises: &[Exercise]) -> Vec<Row> {
        let mut rows = Vec::new();
        for (ei, exercise) in exercises.iter().enumerate() {
            rows.push(Row::Exercise(ei));
            for si in 0..exercise.logged_sets.len() {
                rows.push(Row::Set(ei, si));
            }
        }
        rows
    }

    /// Exercise and set under the cursor.
    fn cursor(&self) -> (Option<usize>, Option<usize>) {
        let rows = Self::rows(&self.manager.logged_exercises());
        match rows.get(self.selected) {
            Some(Row::Exercise(ei)) => (Some(*ei), None),
            Some(Row::Set(ei, si)) => (Some(*ei), Some(*si)),
            None => (None, None),
        }
    }

    fn scroll_down(&mut self) {
        let len = Self::rows(&self.manager.logged_exercises()).len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
        }
    }

    fn scroll_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = Self::rows(&self.manager.logged_exercises()).len();
        if self.selected >= len && len > 0 {
            self.selected = len - 1;
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::RestFinished) => {
                    self.status_message = "Rest over, next set!".to_string();
                }
                Ok(SessionEvent::RestStarted { seconds, .. }) => {
                    self.status_message = format!("Resting {}s (n: skip, +: add 30s)", seconds);
                }
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn toggle_selected(&mut self) {
        let (Some(ei), Some(si)) = self.cursor() else {
            self.status_message = "Select a set first".to_string();
            return;
        };
        self.status_message = match self.manager.toggle_set_completion(ei, si) {
            Ok(toggle) if toggle.completed && toggle.backfilled => {
                "Set done (filled from last time)".to_string()
            }
            Ok(toggle) if toggle.completed => "Set done".to_string(),
            Ok(_) => "Set reopened".to_string(),
            Err(e) => format!("Error: {}", e),
        };
    }

    fn enter_edit(&mut self, mode: InputMode) {
        if let (Some(_), Some(_)) = self.cursor() {
            self.input_buffer.clear();
            self.input_mode = mode;
            self.status_message = "Enter a value, Esc to cancel".to_string();
        } else {
            self.status_message = "Select a set first".to_string();
        }
    }

    fn commit_input(&mut self) {
        let value = std::mem::take(&mut self.input_buffer);
        let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
        let result = match (mode, self.cursor()) {
            (InputMode::EditingWeight, (Some(ei), Some(si))) => {
                self.manager.update_set_values(ei, si, Some(value), None)
            }
            (InputMode::EditingReps, (Some(ei), Some(si))) => {
                self.manager.update_set_values(ei, si, None, Some(value))
            }
            (InputMode::AddingExercise, _) if !value.trim().is_empty() => self
                .manager
                .add_exercise(Exercise::new(value.trim(), vec![], None))
                .map(|_| ()),
            _ => Ok(()),
        };
        self.status_message = match result {
            Ok(()) => HELP.to_string(),
            Err(e) => format!("Error: {}", e),
        };
    }

    fn add_set(&mut self) {
        let exercise = self.cursor().0.or_else(|| {
            (!self.manager.logged_exercises().is_empty()).then_some(0)
        });
        self.status_message = match exercise.map(|ei| self.manager.add_set(ei)) {
            Some(Ok(_)) => "Set added".to_string(),
            Some(Err(e)) => format!("Error: {}", e),
            None => "Add an exercise first (e)".to_string(),
        };
    }

    fn remove_selected(&mut self) {
        let result = match self.cursor() {
            (Some(ei), Some(si)) => self.manager.remove_set(ei, si).map(|_| ()),
            (Some(ei), None) => self.manager.remove_exercise(ei).map(|_| ()),
            _ => Ok(()),
        };
        if let Err(e) = result {
            self.status_message = format!("Error: {}", e);
        }
        self.clamp_selection();
    }

    fn toggle_pause(&mut self) {
        match self.manager.running_state() {
            RunningState::Running => self.manager.pause_workout(),
            RunningState::Paused => self.manager.resume_workout(),
            RunningState::Idle => {}
        }
    }

    async fn save(&mut self) -> Option<i64> {
        self.status_message = "Saving...".to_string();
        match self.manager.save_workout(self.backend).await {
            Ok(id) => Some(id),
            Err(e) => {
                self.status_message = format!("Save failed: {}", e);
                None
            }
        }
    }

    fn draw(&self, terminal: &mut DefaultTerminal) -> Result<()> {
        let snapshot = self.manager.snapshot();
        let metrics = self.manager.metrics();
        let rows = Self::rows(&snapshot.logged_exercises);

        terminal.draw(|frame| {
            let chunks = Layout::vertical([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

            // Header
            let name = snapshot
                .active_routine
                .as_ref()
                .map(|r| r.name.as_str())
                .unwrap_or("Workout");
            let state = match snapshot.running_state {
                RunningState::Running => "running",
                RunningState::Paused => "PAUSED",
                RunningState::Idle => "idle",
            };
            let rest = snapshot
                .rest
                .as_ref()
                .map(|r| format!(" | rest {}", format_elapsed(u64::from(r.remaining_seconds))))
                .unwrap_or_default();
            let header = Paragraph::new(format!(
                "{} - {} {}{} | volume {:.0}",
                name,
                format_elapsed(snapshot.elapsed_seconds),
                state,
                rest,
                metrics.total_volume
            ))
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(header, chunks[0]);

            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::ALL).title("Progress"))
                .gauge_style(Style::default().fg(Color::Green))
                .label(format!(
                    "{}/{} sets",
                    metrics.sets_performed, metrics.planned_sets
                ))
                .percent(metrics.progress_percentage.min(100) as u16);
            frame.render_widget(gauge, chunks[1]);

            // Exercises and sets, or the input prompt
            match self.input_mode {
                InputMode::Normal => {
                    let items: Vec<ListItem> = rows
                        .iter()
                        .enumerate()
                        .map(|(idx, row)| {
                            let line = match row {
                                Row::Exercise(ei) => {
                                    let exercise = &snapshot.logged_exercises[*ei];
                                    Line::from(exercise.name.clone()).style(
                                        Style::default().add_modifier(Modifier::BOLD),
                                    )
                                }
                                Row::Set(ei, si) => {
                                    let set = &snapshot.logged_exercises[*ei].logged_sets[*si];
                                    let shown = |logged: &Option<String>, planned: &str| {
                                        match logged.as_deref() {
                                            Some(v) if !v.is_empty() => v.to_string(),
                                            _ if planned.is_empty() => "-".to_string(),
                                            _ => format!("({})", planned),
                                        }
                                    };
                                    Line::from(format!(
                                        "  [{}] {}: {} kg x {}",
                                        if set.completed { "x" } else { " " },
                                        si + 1,
                                        shown(&set.logged_weight, &set.planned_weight),
                                        shown(&set.logged_reps, &set.planned_reps),
                                    ))
                                }
                            };
                            let style = if idx == self.selected {
                                Style::default()
                                    .fg(Color::Black)
                                    .bg(Color::Cyan)
                                    .add_modifier(Modifier::BOLD)
                            } else {
                                Style::default()
                            };
                            ListItem::new(line).style(style)
                        })
                        .collect();

                    let list = List::new(items).block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(format!("Exercises ({})", snapshot.logged_exercises.len())),
                    );
                    let mut list_state = ListState::default();
                    list_state.select(Some(self.selected));
                    frame.render_stateful_widget(list, chunks[2], &mut list_state);
                }
                _ => {
                    let title = match self.input_mode {
                        InputMode::EditingWeight => "Weight",
                        InputMode::EditingReps => "Reps",
                        _ => "New Exercise",
                    };
                    let input_widget = Paragraph::new(self.input_buffer.as_str())
                        .style(Style::default().fg(Color::Yellow))
                        .block(Block::default().borders(Borders::ALL).title(title));
                    frame.render_widget(input_widget, chunks[2]);
                }
            }

            // Footer with status
            let footer = Paragraph::new(self.status_message.as_str())
                .style(Style::default().fg(Color::White))
                .block(Block::default().borders(Borders::ALL).title("Status"));
            frame.render_widget(footer, chunks[3]);
        })?;
        Ok(())
    }
}

/// Drives the active workout until it is saved, discarded or the user quits.
pub async fn run_workout_screen<B: Backend>(
    mut terminal: DefaultTerminal,
    manager: WorkoutSessionManager,
    backend: &B,
) -> Result<WorkoutOutcome> {
    let mut screen = WorkoutScreen::new(manager, backend);

    loop {
        screen.drain_events();
        screen.draw(&mut terminal)?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let event::Event::Key(key) = event::read()? else {
            continue;
        };

        match screen.input_mode {
            InputMode::Normal => {
                if !matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
                    screen.confirm_quit = false;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => {
                        if screen.confirm_quit || screen.manager.metrics().sets_performed == 0 {
                            return Ok(WorkoutOutcome::Quit);
                        }
                        screen.confirm_quit = true;
                        screen.status_message =
                            "Unsaved sets will be lost. Press q again to quit, s to save".to_string();
                    }
                    KeyCode::Char('j') | KeyCode::Down => screen.scroll_down(),
                    KeyCode::Char('k') | KeyCode::Up => screen.scroll_up(),
                    KeyCode::Char(' ') | KeyCode::Enter => screen.toggle_selected(),
                    KeyCode::Char('w') => screen.enter_edit(InputMode::EditingWeight),
                    KeyCode::Char('r') => screen.enter_edit(InputMode::EditingReps),
                    KeyCode::Char('a') => screen.add_set(),
                    KeyCode::Char('x') => screen.remove_selected(),
                    KeyCode::Char('e') => {
                        screen.input_buffer.clear();
                        screen.input_mode = InputMode::AddingExercise;
                        screen.status_message = "Exercise name, Enter to add".to_string();
                    }
                    KeyCode::Char('p') => screen.toggle_pause(),
                    KeyCode::Char('n') => {
                        if screen.manager.skip_rest() {
                            screen.status_message = "Rest skipped".to_string();
                        }
                    }
                    KeyCode::Char('+') => {
                        if let Some(left) = screen.manager.extend_rest(30) {
                            screen.status_message = format!("Rest extended, {}s left", left);
                        }
                    }
                    KeyCode::Char('s') => {
                        if let Some(id) = screen.save().await {
                            return Ok(WorkoutOutcome::Saved(id));
                        }
                    }
                    KeyCode::Char('d') => {
                        screen.manager.discard_workout();
                        return Ok(WorkoutOutcome::Discarded);
                    }
                    _ => {}
                }
            }
            _ => match key.code {
                KeyCode::Enter => screen.commit_input(),
                KeyCode::Esc => {
                    screen.input_mode = InputMode::Normal;
                    screen.input_buffer.clear();
                    screen.status_message = HELP.to_string();
                }
                KeyCode::Char(c) => screen.input_buffer.push(c),
                KeyCode::Backspace => {
                    screen.input_buffer.pop();
                }
                _ => {}
            },
        }
    }
}
