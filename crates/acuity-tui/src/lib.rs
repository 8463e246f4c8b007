//! Acuity TUI -- interactive terminal front end for the staircase test.
//!
//! # Overview
//!
//! One screen, three panels:
//! - **Optotype**: the Landolt C at its calibrated size in terminal cells.
//!   When the hardest level would be illegible the whole ladder is
//!   magnified by one factor, so sizes still shrink level by level.
//! - **Trial log** (Tab toggles): the current eye's audit trail.
//! - **Status HUD**: eye, distance, level, size, mode, undo availability.
//!
//! A narration line between them shows the latest cue, notices such as
//! failed saves, and the typed-answer prompt.
//!
//! # Architecture
//!
//! ```text
//! key -> App::handle_key -> SessionDriver -> StaircaseEngine
//!                              │ advance()
//!                              └──────────> ResultSink::save_result
//! ```
//!
//! The screen never mutates engine state directly; every change goes
//! through the driver. A failed save is shown on the narration line and
//! recorded in the [`SessionSummary`]; the session carries on.

mod optotype_view;
mod status_hud;
mod trial_log;
mod visual_tone;

use acuity_core::calibration::Calibration;
use acuity_core::direction::{DirectionSource, ScriptedDirections};
use acuity_core::engine::{AnswerOutcome, IgnoreReason};
use acuity_core::error::{EngineError, SessionError};
use acuity_core::input::{direction_from_key, direction_from_transcript};
use acuity_core::narration::TranscriptNarrator;
use acuity_core::optotype::{Direction, DistanceCategory};
use acuity_core::session::{EyeResult, SessionDriver};
use acuity_core::store::{MeasurementRecord, ResultSink, ResultStore};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use optotype_view::{ladder_scale, PanelContent};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use status_hud::HudView;
use std::io::{self, stdout};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Settings for one interactive session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOptions {
    pub distance: DistanceCategory,
    pub calibration: Calibration,
    /// Display pixels per terminal column.
    pub cell_px: f64,
}

/// What happened during an interactive session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    /// Records written by the result sink, in save order.
    pub saved: Vec<MeasurementRecord>,
    /// Human-readable save failures. The matching results were still shown.
    pub save_failures: Vec<String>,
    /// Both eyes were handed over.
    pub completed: bool,
}

/// Transient line shown instead of the latest narration cue.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Notice {
    Info(String),
    Error(String),
}

/// Application state for the test screen.
struct App {
    driver: SessionDriver<Box<dyn DirectionSource>, TranscriptNarrator>,
    sink: Box<dyn ResultSink>,
    options: TestOptions,
    /// Results handed over by the driver, whether or not they were saved.
    finished: Vec<EyeResult>,
    summary: SessionSummary,
    show_log: bool,
    /// Typed-answer buffer while the `/` prompt is open.
    typed: Option<String>,
    notice: Option<Notice>,
    should_quit: bool,
}

impl App {
    fn new(
        directions: Box<dyn DirectionSource>,
        sink: Box<dyn ResultSink>,
        options: TestOptions,
    ) -> Self {
        App {
            driver: SessionDriver::new(directions, TranscriptNarrator::new(), options.distance),
            sink,
            options,
            finished: Vec::new(),
            summary: SessionSummary::default(),
            show_log: true,
            typed: None,
            notice: None,
            should_quit: false,
        }
    }

    /// Handle a key event. Accepts the full KeyEvent to support Ctrl-C.
    fn handle_key(&mut self, key: KeyEvent) {
        // Raw mode delivers Ctrl-C as a key event, not SIGINT.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if self.typed.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        self.notice = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.show_log = !self.show_log,
            KeyCode::Enter => self.advance_eye(),
            KeyCode::Char('u') => self.undo(),
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                if !self.driver.is_complete() {
                    self.driver.toggle_pause();
                }
            }
            KeyCode::Char('/') if !self.driver.is_complete() => self.typed = Some(String::new()),
            KeyCode::Up => self.answer(Direction::Up),
            KeyCode::Down => self.answer(Direction::Down),
            KeyCode::Left => self.answer(Direction::Left),
            KeyCode::Right => self.answer(Direction::Right),
            KeyCode::Char(c) => {
                if let Some(direction) = direction_from_key(c) {
                    self.answer(direction);
                }
            }
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.typed = None,
            KeyCode::Enter => {
                let text = self.typed.take().unwrap_or_default();
                match direction_from_transcript(&text) {
                    Some(direction) => self.answer(direction),
                    None => {
                        self.notice = Some(Notice::Info(format!(
                            "Not recognized: {text:?}. Say up, down, left or right."
                        )))
                    }
                }
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.typed.as_mut() {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = self.typed.as_mut() {
                    buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn answer(&mut self, direction: Direction) {
        if self.driver.is_complete() {
            return;
        }
        if let AnswerOutcome::Ignored { reason } = self.driver.answer(direction) {
            let hint = match reason {
                IgnoreReason::Paused => "Paused. Press p to resume.",
                IgnoreReason::Finished => "This eye is finished. Press Enter to save and continue.",
            };
            self.notice = Some(Notice::Info(hint.to_string()));
        }
    }

    fn undo(&mut self) {
        if self.driver.is_complete() {
            return;
        }
        if let Err(EngineError::NothingToUndo) = self.driver.undo() {
            self.notice = Some(Notice::Info("Nothing to undo.".to_string()));
        }
    }

    fn advance_eye(&mut self) {
        if self.driver.is_complete() {
            self.should_quit = true;
            return;
        }
        match self.driver.advance() {
            Ok(progress) => {
                let completed = progress.completed().clone();
                self.save(&completed);
                self.finished.push(completed);
                self.summary.completed = self.driver.is_complete();
            }
            Err(SessionError::EyeNotFinished(_)) => {
                self.notice = Some(Notice::Info(
                    "Keep answering until this eye is finished.".to_string(),
                ));
            }
            Err(SessionError::SessionComplete) => self.should_quit = true,
        }
    }

    fn save(&mut self, result: &EyeResult) {
        match self.sink.save_result(result) {
            Ok(record) => {
                info!(id = record.id, eye = %record.eye, "result saved");
                self.notice = Some(Notice::Info(format!(
                    "Saved {} eye: {} (#{})",
                    record.eye,
                    record.acuity_label(),
                    record.id
                )));
                self.summary.saved.push(record);
            }
            Err(err) => {
                warn!(eye = %result.eye, error = %err, "result save failed");
                let message = format!("Could not save {} eye result: {err}", result.eye);
                self.notice = Some(Notice::Error(message.clone()));
                self.summary.save_failures.push(message);
            }
        }
    }

    /// Calibrated size of the current optotype and the ladder
    /// magnification it is drawn with.
    fn optotype_size(&self) -> (Option<f64>, f64) {
        let state = self.driver.state();
        let size_px = self
            .options
            .calibration
            .size_for_level(state.level(), self.options.distance)
            .ok();
        let scale = ladder_scale(
            &self.options.calibration,
            self.options.distance,
            self.options.cell_px,
        );
        (size_px, scale)
    }

    fn narration_line(&self) -> Line<'static> {
        if let Some(text) = &self.typed {
            return Line::from(vec![
                Span::styled(" Answer: ", visual_tone::label()),
                Span::raw(text.clone()),
                Span::styled("▏", visual_tone::muted()),
            ]);
        }
        match &self.notice {
            Some(Notice::Info(text)) => Line::from(Span::styled(format!(" {text}"), visual_tone::info())),
            Some(Notice::Error(text)) => {
                Line::from(Span::styled(format!(" {text}"), visual_tone::error()))
            }
            None => Line::from(Span::raw(format!(
                " {}",
                self.driver
                    .narrator()
                    .latest()
                    .map(|cue| cue.message())
                    .unwrap_or_default()
            ))),
        }
    }

    fn panel_content(&self) -> PanelContent<'static> {
        let state = self.driver.state();
        if self.driver.is_complete() {
            let mut lines = vec![
                Line::from(Span::styled("Test complete", visual_tone::success())),
                Line::from(""),
            ];
            lines.extend(self.finished.iter().map(|r| {
                Line::from(vec![
                    Span::styled(format!("{} eye: ", r.eye), visual_tone::label()),
                    Span::styled(r.result.label(), visual_tone::result(r.result)),
                ])
            }));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Press Enter or q to quit",
                visual_tone::muted(),
            )));
            return PanelContent::Message(lines);
        }
        if let (true, Some(result)) = (state.is_finished, state.result) {
            return PanelContent::Message(vec![
                Line::from(vec![
                    Span::styled(format!("{} eye: ", state.eye), visual_tone::label()),
                    Span::styled(result.label(), visual_tone::result(result)),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter to save and continue, u to undo the last answer",
                    visual_tone::muted(),
                )),
            ]);
        }
        if state.is_paused {
            return PanelContent::Message(vec![
                Line::from(Span::styled("Paused", visual_tone::warning())),
                Line::from(Span::styled("Press p to resume", visual_tone::muted())),
            ]);
        }
        PanelContent::Optotype {
            direction: self.driver.engine().current_target(),
            level: state.level(),
            distance: self.options.distance,
        }
    }
}

/// Render the application to a frame.
fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Min(6),
        Constraint::Length(3),
        Constraint::Length(4),
    ])
    .split(frame.area());
    let (main_area, narration_area, hud_area) = (chunks[0], chunks[1], chunks[2]);

    let (optotype_area, log_area) = if app.show_log && main_area.width >= 60 {
        let columns =
            Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
                .split(main_area);
        (columns[0], Some(columns[1]))
    } else {
        (main_area, None)
    };

    optotype_view::render_optotype_panel(
        frame,
        optotype_area,
        app.panel_content(),
        &app.options.calibration,
        app.options.cell_px,
    );
    if let Some(area) = log_area {
        trial_log::render_trial_log(frame, area, &app.driver.state().history);
    }

    render_narration(frame, narration_area, app.narration_line());

    let (size_px, scale) = app.optotype_size();
    let hud = HudView::from_state(
        app.driver.state(),
        app.options.distance,
        size_px,
        scale,
        app.driver.engine().can_undo(),
        app.driver.is_complete(),
    );
    status_hud::render_status_hud(frame, hud_area, &hud);
}

fn render_narration(frame: &mut Frame, area: Rect, line: Line<'static>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(visual_tone::panel_border());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(line), inner);
}

/// Run the interactive test. Blocks until the user quits.
pub fn run_test_session(
    directions: Box<dyn DirectionSource>,
    sink: Box<dyn ResultSink>,
    options: TestOptions,
) -> io::Result<SessionSummary> {
    // Restore the terminal if anything panics while it is in raw mode.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(directions, sink, options);
    info!(distance = %options.distance, "interactive session started");

    let outcome = run_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    outcome?;

    info!(
        saved = app.summary.saved.len(),
        failed = app.summary.save_failures.len(),
        completed = app.summary.completed,
        "interactive session ended"
    );
    Ok(app.summary)
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn infallible_to_io(err: std::convert::Infallible) -> io::Error {
    match err {}
}

/// Drive a session with scripted targets and keys, then render it.
///
/// Results go to a real [`ResultStore`] at `results_path`. Returns the
/// screen text (rows joined with newlines) and the session summary. Used by
/// integration tests.
#[doc(hidden)]
pub fn render_scripted_session(
    script: Vec<Direction>,
    keys: &[KeyEvent],
    options: TestOptions,
    results_path: &Path,
    width: u16,
    height: u16,
) -> io::Result<(String, SessionSummary)> {
    let store = ResultStore::open(results_path).map_err(io::Error::other)?;
    let mut app = App::new(
        Box::new(ScriptedDirections::new(script)),
        Box::new(store),
        options,
    );
    for key in keys {
        app.handle_key(*key);
    }

    let backend = ratatui::backend::TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).map_err(infallible_to_io)?;
    terminal
        .draw(|frame| render(frame, &app))
        .map_err(infallible_to_io)?;

    let buf = terminal.backend().buffer();
    let mut text = String::new();
    for y in 0..height {
        for x in 0..width {
            text.push(buf[(x, y)].symbol().chars().next().unwrap_or(' '));
        }
        if y + 1 < height {
            text.push('\n');
        }
    }
    Ok((text, app.summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use acuity_core::narration::Cue;
    use acuity_core::optotype::Eye;
    use acuity_core::staircase::AcuityResult;
    use acuity_core::store::StoreError;
    use ratatui::backend::TestBackend;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// In-memory sink; shares its records with the test.
    #[derive(Clone, Default)]
    struct MemorySink {
        records: Rc<RefCell<Vec<MeasurementRecord>>>,
        fail: bool,
    }

    impl ResultSink for MemorySink {
        fn save_result(&mut self, result: &EyeResult) -> Result<MeasurementRecord, StoreError> {
            if self.fail {
                return Err(StoreError::Io(io::Error::other("disk full")));
            }
            let mut records = self.records.borrow_mut();
            let record = MeasurementRecord {
                id: records.len() as u64 + 1,
                recorded_at: chrono::Utc::now(),
                eye: result.eye,
                distance: result.distance,
                visual_acuity: result.result.value(),
                below_floor: result.result.is_below_floor(),
                trials: result.trials.len(),
                trial_digest: None,
            };
            records.push(record.clone());
            Ok(record)
        }

        fn list_results(&self) -> Result<Vec<MeasurementRecord>, StoreError> {
            Ok(self.records.borrow().clone())
        }
    }

    fn options() -> TestOptions {
        TestOptions {
            distance: DistanceCategory::Far3M,
            calibration: Calibration::default(),
            cell_px: 8.0,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn ctrl_key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Targets are always Up, so `k`/Up is correct and `l`/Right is wrong.
    fn test_app(sink: MemorySink) -> App {
        App::new(
            Box::new(ScriptedDirections::new(vec![Direction::Up])),
            Box::new(sink),
            options(),
        )
    }

    fn screen(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buf = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..height {
            for x in 0..width {
                text.push(buf[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn quit_keys() {
        for k in [key(KeyCode::Char('q')), key(KeyCode::Esc), ctrl_key('c')] {
            let mut app = test_app(MemorySink::default());
            app.handle_key(k);
            assert!(app.should_quit);
        }
    }

    #[test]
    fn arrows_vi_and_wasd_answer() {
        let mut app = test_app(MemorySink::default());
        app.handle_key(key(KeyCode::Up));
        app.handle_key(key(KeyCode::Char('k')));
        app.handle_key(key(KeyCode::Char('w')));
        assert_eq!(app.driver.state().level_index, 3);
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.driver.state().consecutive_wrong, 1);
    }

    #[test]
    fn undo_key_restores_and_reports_empty_stack() {
        let mut app = test_app(MemorySink::default());
        app.handle_key(key(KeyCode::Char('u')));
        assert_eq!(app.notice, Some(Notice::Info("Nothing to undo.".to_string())));
        app.handle_key(key(KeyCode::Up));
        app.handle_key(key(KeyCode::Char('u')));
        assert_eq!(app.driver.state().level_index, 0);
        assert!(app.driver.state().history.is_empty());
        assert!(app.notice.is_none());
    }

    #[test]
    fn pause_blocks_answers_until_resumed() {
        let mut app = test_app(MemorySink::default());
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.driver.state().is_paused);
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.driver.state().level_index, 0);
        assert!(matches!(app.notice, Some(Notice::Info(ref t)) if t.contains("Paused")));
        app.handle_key(key(KeyCode::Char('p')));
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.driver.state().level_index, 1);
    }

    #[test]
    fn typed_prompt_maps_transcripts() {
        let mut app = test_app(MemorySink::default());
        app.handle_key(key(KeyCode::Char('/')));
        for c in "うえ".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert!(app.typed.is_none());
        assert_eq!(app.driver.state().level_index, 1);

        app.handle_key(key(KeyCode::Char('/')));
        for c in "maybe".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.driver.state().history.len(), 1, "unrecognized is dropped");
        assert!(matches!(app.notice, Some(Notice::Info(ref t)) if t.contains("Not recognized")));
    }

    #[test]
    fn typed_prompt_captures_command_keys() {
        let mut app = test_app(MemorySink::default());
        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Char('q')));
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Char('u')));
        assert!(!app.should_quit);
        assert_eq!(app.typed.as_deref(), Some("u"));
        app.handle_key(key(KeyCode::Esc));
        assert!(app.typed.is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn enter_saves_each_eye_and_completes() {
        let sink = MemorySink::default();
        let mut app = test_app(sink.clone());

        app.handle_key(key(KeyCode::Enter));
        assert!(matches!(app.notice, Some(Notice::Info(ref t)) if t.contains("Keep answering")));

        for _ in 0..7 {
            app.handle_key(key(KeyCode::Up));
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.driver.current_eye(), Eye::Left);

        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Enter));

        let records = sink.records.borrow();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].eye, Eye::Right);
        assert_eq!(records[0].visual_acuity, 1.2);
        assert_eq!(records[1].eye, Eye::Left);
        assert!(records[1].below_floor);
        assert!(app.summary.completed);
        assert_eq!(app.summary.saved.len(), 2);

        assert!(!app.should_quit);
        app.handle_key(key(KeyCode::Enter));
        assert!(app.should_quit);
    }

    #[test]
    fn failed_save_is_reported_and_session_continues() {
        let sink = MemorySink {
            fail: true,
            ..MemorySink::default()
        };
        let mut app = test_app(sink);
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Enter));

        assert!(matches!(app.notice, Some(Notice::Error(ref t)) if t.contains("disk full")));
        assert_eq!(app.summary.save_failures.len(), 1);
        assert_eq!(app.finished[0].result, AcuityResult::BelowFloor);
        assert_eq!(app.driver.current_eye(), Eye::Left);
        assert_eq!(
            app.driver.narrator().latest(),
            Some(&Cue::TestStarted(Eye::Left))
        );
    }

    #[test]
    fn tab_hides_trial_log() {
        let mut app = test_app(MemorySink::default());
        assert!(screen(&app, 100, 20).contains("Trials"));
        app.handle_key(key(KeyCode::Tab));
        assert!(!screen(&app, 100, 20).contains("Trials"));
    }

    #[test]
    fn screen_shows_optotype_hud_and_narration() {
        let app = test_app(MemorySink::default());
        let text = screen(&app, 100, 24);
        assert!(text.contains('█'), "optotype must be drawn");
        assert!(text.contains("Eye: right"));
        assert!(text.contains("Level: 0.5"));
        assert!(text.contains("Starting the test with your right eye"));
    }

    #[test]
    fn paused_screen_hides_optotype() {
        let mut app = test_app(MemorySink::default());
        app.handle_key(key(KeyCode::Char('p')));
        let text = screen(&app, 100, 24);
        assert!(!text.contains('█'));
        assert!(text.contains("Press p to resume"));
        assert!(text.contains("Mode: PAUSED"));
    }

    #[test]
    fn near_distance_reports_ladder_magnification() {
        let mut app = test_app(MemorySink::default());
        app.options.distance = DistanceCategory::Near30Cm;
        let (size, scale) = app.optotype_size();
        assert!(size.is_some());
        assert!(scale > 16.0 && scale < 17.0, "got {scale}");
        assert!(screen(&app, 100, 24).contains("11.3px (x16.9)"));
    }

    fn ring_width(text: &str) -> usize {
        text.lines()
            .map(|line| {
                let first = line.find('█');
                let last = line.rfind('█');
                match (first, last) {
                    (Some(a), Some(b)) => line[a..b].chars().count() + 1,
                    _ => 0,
                }
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn optotype_shrinks_as_level_rises() {
        let mut app = test_app(MemorySink::default());
        app.options.distance = DistanceCategory::Near30Cm;
        let mut widths = vec![ring_width(&screen(&app, 100, 40))];
        for _ in 0..3 {
            app.handle_key(key(KeyCode::Up));
            widths.push(ring_width(&screen(&app, 100, 40)));
        }
        assert!(widths.windows(2).all(|w| w[0] > w[1]), "{widths:?}");
    }
}
