use fittrack::auth::SessionSnapshot;
use fittrack::models::{UserProfile, WeeklyActivity, WeightLog, WorkoutPlan, WorkoutProgress};
use fittrack::services::OnboardingStep;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset, Gauge, GraphType, List, ListItem, Paragraph, Widget, Wrap,
    },
};

use super::app::{fields_for, options_for, DashboardScreen, OnboardingScreen};

fn panel(title: &str, highlighted: bool) -> Block<'_> {
    let border_style = if highlighted {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };

    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style)
}

fn hint(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

/// Shown while the identity session is being restored
pub fn render_loading(area: Rect, buf: &mut Buffer) {
    let block = panel(" FitTrack ", false);
    let inner = block.inner(area);
    block.render(area, buf);

    Paragraph::new("Loading...")
        .style(Style::default().fg(Color::Gray))
        .render(inner, buf);
}

/// Render the current onboarding step
pub fn render_onboarding(area: Rect, buf: &mut Buffer, screen: &OnboardingScreen) {
    let step = screen.flow.step();
    let title = match step.index() {
        Some(index) if !step.is_auth_step() => format!(" 📝 Step {} of 4: {} ", index - 1, step.title()),
        _ => format!(" 🏋 {} ", step.title()),
    };

    let block = panel(&title, true);
    let inner = block.inner(area);
    block.render(area, buf);

    let mut lines = Vec::new();

    let fields = fields_for(step);
    for (idx, field) in fields.iter().enumerate() {
        let value = screen.field_value(*field);
        let shown = if field.is_secret() {
            "•".repeat(value.chars().count())
        } else {
            value
        };
        let focused = idx == screen.focus;
        let value_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", field.label()), Style::default().fg(Color::Gray)),
            Span::styled(shown, value_style),
            Span::styled(if focused { "▏" } else { "" }, Style::default().fg(Color::Yellow)),
        ]));
    }

    for (idx, option) in options_for(step).iter().enumerate() {
        let style = if idx == screen.cursor {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(format!("  {}  ", option), style)));
    }

    if step == OnboardingStep::BiometricsInput {
        if let Some(bmi) = screen.flow.profile().derived_bmi() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Last saved BMI: {:.1}", bmi),
                Style::default().fg(Color::Cyan),
            )));
        }
    }

    lines.push(Line::from(""));
    if screen.flow.is_auth_in_flight() {
        lines.push(Line::from(Span::styled(
            "Signing in...",
            Style::default().fg(Color::Yellow),
        )));
    }
    if let Some(error) = screen.flow.error() {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    lines.push(Line::from(""));
    match step {
        OnboardingStep::LoginPrompt => {
            lines.push(hint("Enter: Login   Ctrl+G: Sign in with Google"));
            lines.push(hint("Ctrl+S: Don't have an account? Sign up"));
        }
        OnboardingStep::SignupPrompt => {
            lines.push(hint("Enter: Sign up   Ctrl+G: Sign in with Google"));
            lines.push(hint("Ctrl+S: Already have an account? Login"));
        }
        OnboardingStep::BiometricsInput => lines.push(hint("Tab: Next field   Enter: Next")),
        OnboardingStep::DurationSelection => lines.push(hint("↑/↓: Choose   Enter: Complete Setup")),
        OnboardingStep::Completed => lines.push(hint("Enter: Go to dashboard")),
        _ => lines.push(hint("↑/↓: Choose   Enter: Next")),
    }
    lines.push(hint("Esc: Quit"));

    Paragraph::new(lines).wrap(Wrap { trim: false }).render(inner, buf);
}

/// Greeting, weekly progress and plan list
pub fn render_summary(area: Rect, buf: &mut Buffer, screen: &DashboardScreen, greeting: &str) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(5), Constraint::Min(6)])
        .split(area);

    let block = panel(" 👋 FitTrack ", false);
    let inner = block.inner(rows[0]);
    block.render(rows[0], buf);
    Paragraph::new(vec![
        Line::from(Span::styled(
            greeting.to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            screen.state.encouragement(),
            Style::default().fg(Color::Green),
        )),
    ])
    .render(inner, buf);

    render_weekly_progress(rows[1], buf, screen.state.activity());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[2]);

    render_plans(columns[0], buf, screen.state.plans(), screen.selected_plan);
    render_weight_chart(columns[1], buf, screen.state.weights(), screen.weight_input.as_deref());
}

/// Streak and this week's progress towards the goal
pub fn render_weekly_progress(area: Rect, buf: &mut Buffer, activity: &WeeklyActivity) {
    let block = panel(" 🔥 This Week ", false);
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    Paragraph::new(Line::from(vec![
        Span::styled("Weekly streak: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{} weeks", activity.weekly_streak()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled("   Workouts: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{}/{}", activity.completed_this_week(), activity.weekly_goal()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ]))
    .render(rows[0], buf);

    let percent = activity.progress_percentage().round().clamp(0.0, 100.0) as u16;
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Green).bg(Color::DarkGray))
        .percent(percent)
        .render(rows[1], buf);
}

pub fn render_plans(area: Rect, buf: &mut Buffer, plans: &[WorkoutPlan], selected: usize) {
    let block = panel(" 💪 Workout Plans ", true);
    let inner = block.inner(area);
    block.render(area, buf);

    let mut items: Vec<ListItem> = Vec::new();
    for (idx, plan) in plans.iter().enumerate() {
        let style = if idx == selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let marker = if idx == selected { "▶" } else { " " };
        items.push(ListItem::new(Line::from(Span::styled(
            format!("{} {}", marker, plan.name),
            style,
        ))));
        for exercise in &plan.exercises {
            items.push(ListItem::new(Line::from(Span::styled(
                format!("    {} ({})", exercise.name, exercise.prescription()),
                Style::default().fg(Color::Gray),
            ))));
        }
    }

    List::new(items).render(inner, buf);
}

/// Weight over weeks, with the entry box when it is open
pub fn render_weight_chart(area: Rect, buf: &mut Buffer, log: &WeightLog, input: Option<&str>) {
    let block = panel(" 📈 Weight Progress ", input.is_some());
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    let entry = match input {
        Some(text) => Line::from(vec![
            Span::styled("New weight (kg): ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}▏", text),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]),
        None => hint("W: Add weight"),
    };
    Paragraph::new(entry).render(rows[1], buf);

    let Some((low, high)) = log.bounds() else {
        Paragraph::new("No weight recorded yet")
            .style(Style::default().fg(Color::Gray))
            .render(rows[0], buf);
        return;
    };

    let points: Vec<(f64, f64)> = log
        .samples()
        .iter()
        .map(|s| (s.week_index as f64, s.weight))
        .collect();
    let last_week = log.latest().map(|s| s.week_index).unwrap_or(1).max(2) as f64;
    let (y_min, y_max) = ((low - 1.0).floor(), (high + 1.0).ceil());

    let dataset = Dataset::default()
        .name("kg")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .title("Week")
                .style(Style::default().fg(Color::Gray))
                .bounds([1.0, last_week])
                .labels(vec![Span::raw("1"), Span::raw(format!("{}", last_week as u32))]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.0}", y_min)),
                    Span::raw(format!("{:.0}", y_max)),
                ]),
        )
        .render(rows[0], buf);
}

/// The exercise currently being performed
pub fn render_exercise(area: Rect, buf: &mut Buffer, progress: &WorkoutProgress) {
    let title = format!(" 🏋 {} ", progress.plan().name);
    let block = panel(&title, true);
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(4), Constraint::Length(2)])
        .split(inner);

    Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
        .percent(progress.progress_percentage().round().clamp(0.0, 100.0) as u16)
        .label(format!(
            "Exercise {} of {}",
            progress.current_exercise_index() + 1,
            progress.plan().len()
        ))
        .render(rows[0], buf);

    let exercise = progress.current_exercise();
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            exercise.name.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(exercise.prescription(), Style::default().fg(Color::Yellow))),
        Line::from(Span::styled(
            exercise.illustration_ref.clone(),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .render(rows[1], buf);

    let next_label = if progress.is_last_exercise() { "Finish" } else { "Next" };
    let keys = format!("←: Previous   →: {}   Esc: Cancel workout", next_label);
    Paragraph::new(hint(&keys)).render(rows[2], buf);
}

pub fn render_rating_prompt(area: Rect, buf: &mut Buffer, plan_name: &str) {
    let block = panel(" ⭐ How was your workout? ", true);
    let inner = block.inner(area);
    block.render(area, buf);

    Paragraph::new(vec![
        Line::from(Span::styled(
            format!("You finished {}!", plan_name),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("  [1] 😓 Tough"),
        Line::from("  [2] 🙂 Okay"),
        Line::from("  [3] 💪 Great"),
        Line::from(""),
        hint("Esc: Discard workout"),
    ])
    .render(inner, buf);
}

/// Profile details overlay
pub fn render_profile(area: Rect, buf: &mut Buffer, profile: &UserProfile) {
    let block = panel(" 👤 Profile ", true).style(Style::default().bg(Color::Black));
    let inner = block.inner(area);
    Clear.render(area, buf);
    block.render(area, buf);

    fn row<'a>(label: &'a str, value: String) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("{:<12}", label), Style::default().fg(Color::Gray)),
            Span::styled(value, Style::default().fg(Color::White)),
        ])
    }

    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

    let lines = vec![
        row("Name", profile.display_name().to_string()),
        row("Email", if profile.email.is_empty() { "-".to_string() } else { profile.email.clone() }),
        row("Age", or_dash(profile.age.map(|a| a.to_string()))),
        row("Height", or_dash(profile.height.map(|h| format!("{} cm", h)))),
        row("Weight", or_dash(profile.weight.map(|w| format!("{} kg", w)))),
        row("BMI", or_dash(profile.bmi.or_else(|| profile.derived_bmi()).map(|b| format!("{:.1}", b)))),
        row("Goal", or_dash(profile.goal.map(|g| g.label().to_string()))),
        row("Plan", or_dash(profile.workout_plan.map(|p| p.label().to_string()))),
        row("Duration", or_dash(profile.workout_duration.map(|d| d.label()))),
        Line::from(""),
        hint("Esc: Close   O: Logout"),
    ];

    Paragraph::new(lines).render(inner, buf);
}

/// Render help overlay
pub fn render_help_overlay(area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" ❓ Help ")
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(area);
    Clear.render(area, buf);
    block.render(area, buf);

    let heading = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(Color::Cyan)));

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Dashboard:"),
        Line::from("  ↑/k ↓/j  - Choose plan"),
        Line::from("  Enter/s  - Start workout"),
        Line::from("  w        - Add weight"),
        Line::from("  p        - Profile"),
        Line::from("  o        - Logout"),
        Line::from(""),
        heading("Workout:"),
        Line::from("  →/n      - Next exercise"),
        Line::from("  ←/b      - Previous exercise"),
        Line::from("  1/2/3    - Rate when finished"),
        Line::from("  Esc      - Cancel workout"),
        Line::from(""),
        heading("Other:"),
        Line::from("  ?        - Toggle this help"),
        Line::from("  q        - Quit"),
        Line::from(""),
        hint("Press ? or ESC to close"),
    ];

    Paragraph::new(help_text).render(inner, buf);
}

/// Render status bar at bottom
pub fn render_status_bar(
    area: Rect,
    buf: &mut Buffer,
    session: &SessionSnapshot,
    message: Option<&str>,
    warning: Option<&str>,
) {
    let identity = match (&session.identity, session.loading) {
        (_, true) => Span::styled(" ⏳ Restoring session ", Style::default().fg(Color::Yellow).bg(Color::DarkGray)),
        (Some(identity), false) => Span::styled(
            format!(" ✓ {} ", identity.email.as_deref().unwrap_or(&identity.uid)),
            Style::default().fg(Color::Green).bg(Color::DarkGray),
        ),
        (None, false) => Span::styled(" Signed out ", Style::default().fg(Color::Gray).bg(Color::DarkGray)),
    };

    let mut spans = vec![identity];
    if let Some(warning) = warning {
        spans.push(Span::styled(
            format!(" ⚠ {} ", warning),
            Style::default().fg(Color::Red).bg(Color::DarkGray),
        ));
    }
    if let Some(message) = message {
        spans.push(Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        " Press ? for help ",
        Style::default().fg(Color::Gray).bg(Color::DarkGray),
    ));

    Paragraph::new(Line::from(spans)).render(area, buf);
}
