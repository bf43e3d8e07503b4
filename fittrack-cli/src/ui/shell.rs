use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fittrack::services::{DashboardView, SessionState};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

use super::app::{App, Screen};
use super::widgets;

/// Owns the terminal while the interactive client runs
pub struct Shell {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    app: App,
    tick_rate: Duration,
}

impl Shell {
    pub fn new(app: App, tick_rate: Duration) -> Result<Self> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture).context("Failed to setup terminal")?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal")?;

        Ok(Self {
            terminal,
            app,
            tick_rate,
        })
    }

    /// Run the event loop until the user quits
    pub async fn run(&mut self) -> Result<()> {
        self.app.start();

        loop {
            self.app.process_events();

            let app = &self.app;
            self.terminal.draw(|f| render(f, app))?;

            let tick_rate = self.tick_rate;
            let ready = tokio::task::block_in_place(|| event::poll(tick_rate))?;
            if ready {
                if let Event::Key(key) = event::read()? {
                    if key.kind == event::KeyEventKind::Press {
                        self.app.handle_key(key).await?;
                    }
                }
            }

            if self.app.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Cleanup terminal on exit
    pub fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
            .context("Failed to restore terminal")?;
        self.terminal.show_cursor().context("Failed to show cursor")?;

        Ok(())
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Draw the current screen
pub fn render(f: &mut Frame, app: &App) {
    let size = f.area();

    // Main layout: top area + status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(size);

    let mut message = None;

    match &app.screen {
        Screen::Loading => widgets::render_loading(main_chunks[0], f.buffer_mut()),
        Screen::Onboarding(screen) => {
            let area = centered_rect(60, 80, main_chunks[0]);
            widgets::render_onboarding(area, f.buffer_mut(), screen);
        }
        Screen::Dashboard(screen) => {
            message = screen.message.as_deref();
            let state = &screen.state;
            let session = app.session();

            match state.view() {
                DashboardView::Profile => {
                    widgets::render_summary(
                        main_chunks[0],
                        f.buffer_mut(),
                        screen,
                        &state.greeting(session.identity.as_ref()),
                    );
                    let area = centered_rect(50, 60, main_chunks[0]);
                    widgets::render_profile(area, f.buffer_mut(), state.profile());
                }
                DashboardView::RatingPrompt | DashboardView::Exercise => match state.session().state() {
                    SessionState::RatingPrompt(progress) => {
                        let area = centered_rect(50, 50, main_chunks[0]);
                        widgets::render_rating_prompt(area, f.buffer_mut(), &progress.plan().name);
                    }
                    SessionState::ExerciseBrowsing(progress) => {
                        let area = centered_rect(70, 70, main_chunks[0]);
                        widgets::render_exercise(area, f.buffer_mut(), progress);
                    }
                    SessionState::Inactive => {}
                },
                DashboardView::Summary => {
                    widgets::render_summary(
                        main_chunks[0],
                        f.buffer_mut(),
                        screen,
                        &state.greeting(session.identity.as_ref()),
                    );
                }
            }
        }
    }

    // Render status bar
    let warning = app.storage_warning();
    widgets::render_status_bar(
        main_chunks[1],
        f.buffer_mut(),
        &app.session(),
        message,
        warning.as_deref(),
    );

    // Render help overlay if active
    if app.show_help {
        let help_area = centered_rect(60, 80, size);
        widgets::render_help_overlay(help_area, f.buffer_mut());
    }
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
