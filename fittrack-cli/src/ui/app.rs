use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fittrack::auth::{self, AuthError, Identity, SessionSnapshot, SessionStore};
use fittrack::models::{CompletionRating, FitnessGoal, PlanTier, ProgramDuration, WeeklyActivity, WeightLog};
use fittrack::services::{
    guard, initial_route, AuthMethod, DashboardState, DashboardView, Navigation, OnboardingFlow, OnboardingStep,
    Route, RouteDecision,
};
use fittrack::storage::ProfileRepository;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::storage::{ProfileCache, Storage};

/// Results of background work, delivered back to the event loop
#[derive(Debug)]
pub enum AppEvent {
    SessionRestored(SessionSnapshot),
    Authenticated(Result<Identity, AuthError>),
}

/// Text fields on the onboarding steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Password,
    Height,
    Weight,
    Age,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Password => "Password",
            Field::Height => "Height (cm)",
            Field::Weight => "Weight (kg)",
            Field::Age => "Age (optional)",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, Field::Password)
    }
}

/// Text fields shown on a step, in focus order
pub fn fields_for(step: OnboardingStep) -> &'static [Field] {
    match step {
        OnboardingStep::LoginPrompt => &[Field::Email, Field::Password],
        OnboardingStep::SignupPrompt => &[Field::Name, Field::Email, Field::Password],
        OnboardingStep::BiometricsInput => &[Field::Height, Field::Weight, Field::Age],
        _ => &[],
    }
}

/// Labels of the choices on a selection step
pub fn options_for(step: OnboardingStep) -> Vec<String> {
    match step {
        OnboardingStep::GoalSelection => FitnessGoal::ALL.iter().map(|g| g.label().to_string()).collect(),
        OnboardingStep::PlanSelection => PlanTier::ALL.iter().map(|p| p.label().to_string()).collect(),
        OnboardingStep::DurationSelection => ProgramDuration::ALL.iter().map(|d| d.label()).collect(),
        _ => Vec::new(),
    }
}

pub struct OnboardingScreen {
    pub flow: OnboardingFlow,
    /// Focused text field
    pub focus: usize,
    /// Highlighted option on selection steps
    pub cursor: usize,
}

impl OnboardingScreen {
    fn new(flow: OnboardingFlow) -> Self {
        let mut screen = Self {
            flow,
            focus: 0,
            cursor: 0,
        };
        screen.reset_cursor();
        screen
    }

    pub fn field_value(&self, field: Field) -> String {
        let flow = &self.flow;
        match field {
            Field::Name => flow.draft().name.clone(),
            Field::Email => flow.credentials().email.clone(),
            Field::Password => flow.credentials().password.clone(),
            Field::Height => flow.draft().height.clone(),
            Field::Weight => flow.draft().weight.clone(),
            Field::Age => flow.draft().age.clone(),
        }
    }

    fn set_field(&mut self, field: Field, value: &str) {
        let result = match field {
            Field::Name => self.flow.set_name(value),
            Field::Email => self.flow.set_email(value),
            Field::Password => self.flow.set_password(value),
            Field::Height => self.flow.set_height(value),
            Field::Weight => self.flow.set_weight(value),
            Field::Age => self.flow.set_age(value),
        };
        if let Err(e) = result {
            tracing::debug!("Ignored edit: {}", e);
        }
    }

    fn focused_field(&self) -> Option<Field> {
        fields_for(self.flow.step()).get(self.focus).copied()
    }

    /// Put focus and cursor back at the top, pre-selecting a remembered choice
    fn reset_cursor(&mut self) {
        self.focus = 0;
        let draft = self.flow.draft();
        self.cursor = match self.flow.step() {
            OnboardingStep::GoalSelection => draft
                .goal
                .and_then(|g| FitnessGoal::ALL.iter().position(|x| *x == g)),
            OnboardingStep::PlanSelection => draft
                .plan
                .and_then(|p| PlanTier::ALL.iter().position(|x| *x == p)),
            OnboardingStep::DurationSelection => draft
                .duration
                .and_then(|d| ProgramDuration::ALL.iter().position(|x| *x == d)),
            _ => None,
        }
        .unwrap_or(0);
    }

    fn select_highlighted(&mut self) {
        let result = match self.flow.step() {
            OnboardingStep::GoalSelection => FitnessGoal::ALL
                .get(self.cursor)
                .map(|g| self.flow.select_goal(*g)),
            OnboardingStep::PlanSelection => PlanTier::ALL.get(self.cursor).map(|p| self.flow.select_plan(*p)),
            OnboardingStep::DurationSelection => ProgramDuration::ALL
                .get(self.cursor)
                .map(|d| self.flow.select_duration(*d)),
            _ => None,
        };
        if let Some(Err(e)) = result {
            tracing::debug!("Ignored selection: {}", e);
        }
    }
}

pub struct DashboardScreen {
    pub state: DashboardState,
    /// Highlighted plan on the summary view
    pub selected_plan: usize,
    /// Weight being typed, when the entry box is open
    pub weight_input: Option<String>,
    pub message: Option<String>,
}

pub enum Screen {
    Loading,
    Onboarding(OnboardingScreen),
    Dashboard(DashboardScreen),
}

/// Application state for the terminal client
pub struct App {
    /// Should the application quit?
    pub should_quit: bool,
    /// Show help overlay
    pub show_help: bool,
    pub screen: Screen,
    session: Arc<SessionStore>,
    profiles: Arc<ProfileCache>,
    storage: Option<Arc<Storage>>,
    weekly_goal: u32,
    runtime: Handle,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
    /// Route requested while the session was still restoring
    pending_route: Option<Route>,
}

impl App {
    /// Must be called from within a tokio runtime
    pub fn new(
        session: Arc<SessionStore>,
        profiles: Arc<ProfileCache>,
        storage: Option<Arc<Storage>>,
        weekly_goal: u32,
    ) -> Result<Self> {
        let runtime = Handle::try_current().context("The terminal client needs a tokio runtime")?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            should_quit: false,
            show_help: false,
            screen: Screen::Loading,
            session,
            profiles,
            storage,
            weekly_goal,
            runtime,
            events_tx,
            events_rx,
            pending_route: None,
        })
    }

    /// Restore the identity session in the background and show the first screen
    pub fn start(&mut self) {
        let session = Arc::clone(&self.session);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let snapshot = session.restore().await;
            let _ = tx.send(AppEvent::SessionRestored(snapshot));
        });

        let cached = self.cached_profile();
        self.navigate(initial_route(cached.as_ref()));
    }

    pub fn session(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Storage problem to show in the status bar
    pub fn storage_warning(&self) -> Option<String> {
        self.profiles.warning()
    }

    fn cached_profile(&self) -> Option<fittrack::models::UserProfile> {
        match self.profiles.load() {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Could not read cached profile: {}", e);
                None
            }
        }
    }

    /// Enter a route, applying the access rules
    pub fn navigate(&mut self, requested: Route) {
        let cached = self.cached_profile();
        let decision = guard(requested, &self.session.snapshot(), cached.as_ref());
        tracing::debug!("Route {} -> {:?}", requested, decision);

        match decision {
            RouteDecision::Loading => {
                self.pending_route = Some(requested);
                self.screen = Screen::Loading;
            }
            RouteDecision::Redirect(route) => self.navigate(route),
            RouteDecision::Show(Route::Dashboard) => {
                self.pending_route = None;
                let profile = cached.unwrap_or_default();
                self.screen = Screen::Dashboard(self.open_dashboard(profile));
            }
            RouteDecision::Show(Route::Entry) => {
                self.pending_route = None;
                let repo: Arc<dyn ProfileRepository> = self.profiles.clone();
                let completed = cached.map(|p| p.onboarding_completed).unwrap_or(false);
                let flow = if completed {
                    OnboardingFlow::reauthenticate(repo)
                } else {
                    OnboardingFlow::resume(repo)
                };
                self.screen = Screen::Onboarding(OnboardingScreen::new(flow));
            }
            RouteDecision::Show(Route::Signup) => {
                self.pending_route = None;
                let repo: Arc<dyn ProfileRepository> = self.profiles.clone();
                self.screen = Screen::Onboarding(OnboardingScreen::new(OnboardingFlow::resume_at_signup(repo)));
            }
        }
    }

    fn open_dashboard(&self, profile: fittrack::models::UserProfile) -> DashboardScreen {
        let (activity, weights) = match &self.storage {
            Some(storage) => {
                let activity = storage.load_activity(self.weekly_goal).unwrap_or_else(|e| {
                    tracing::warn!("Could not load weekly activity: {:#}", e);
                    WeeklyActivity::with_goal(self.weekly_goal)
                });
                let weights = storage.load_weights().unwrap_or_else(|e| {
                    tracing::warn!("Could not load weight history: {:#}", e);
                    WeightLog::new()
                });
                (activity, weights)
            }
            None => (WeeklyActivity::with_goal(self.weekly_goal), WeightLog::new()),
        };

        let was_empty = weights.is_empty();
        let state = DashboardState::new(profile, activity, weights);
        if was_empty && !state.weights().is_empty() {
            self.persist(|s| s.save_weights(state.weights()));
        }

        DashboardScreen {
            state,
            selected_plan: 0,
            weight_input: None,
            message: None,
        }
    }

    fn persist(&self, write: impl FnOnce(&Storage) -> Result<()>) {
        if let Some(storage) = &self.storage {
            if let Err(e) = write(storage) {
                tracing::warn!("Failed to persist progress: {:#}", e);
            }
        }
    }

    // Background events

    /// Apply every event that has already arrived
    pub fn process_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    /// Wait for the next background event and apply it
    pub async fn wait_for_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::SessionRestored(snapshot) => {
                tracing::debug!("Session restored (signed in: {})", snapshot.is_authenticated());
                if let Some(route) = self.pending_route.take() {
                    self.navigate(route);
                }
            }
            AppEvent::Authenticated(result) => {
                let Screen::Onboarding(screen) = &mut self.screen else {
                    tracing::debug!("Authentication result arrived after leaving onboarding");
                    return;
                };
                let identity = result.as_ref().ok().cloned();
                if screen.flow.finish_authentication(result).is_err() {
                    return;
                }
                if let Some(identity) = identity {
                    self.session.set_identity(identity);
                }
                self.after_onboarding_step();
            }
        }
    }

    fn after_onboarding_step(&mut self) {
        let Screen::Onboarding(screen) = &mut self.screen else {
            return;
        };
        screen.reset_cursor();
        if screen.flow.is_complete() {
            self.navigate(Route::Dashboard);
        }
    }

    fn start_authentication(&mut self, method: AuthMethod) {
        let Screen::Onboarding(screen) = &mut self.screen else {
            return;
        };
        let request = match screen.flow.begin_authentication(method) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("Authentication not started: {}", e);
                return;
            }
        };

        let gateway = self.session.gateway();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = auth::authenticate(gateway.as_ref(), &request).await;
            let _ = tx.send(AppEvent::Authenticated(result));
        });
    }

    // Keyboard input

    /// Handle keyboard input
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        // Help overlay takes precedence
        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help = false;
            }
            return Ok(());
        }

        match self.screen {
            Screen::Loading => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    self.should_quit = true;
                }
            }
            Screen::Onboarding(_) => self.handle_onboarding_key(key),
            Screen::Dashboard(_) => self.handle_dashboard_key(key).await?,
        }
        Ok(())
    }

    fn handle_onboarding_key(&mut self, key: KeyEvent) {
        let Screen::Onboarding(screen) = &mut self.screen else {
            return;
        };
        let step = screen.flow.step();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.should_quit = true,

            KeyCode::Char('s') if ctrl && step.is_auth_step() => {
                if screen.flow.toggle_auth_mode().is_ok() {
                    screen.reset_cursor();
                }
            }
            KeyCode::Char('g') if ctrl && step.is_auth_step() => {
                self.start_authentication(AuthMethod::SocialProvider);
            }

            KeyCode::Tab | KeyCode::Down => {
                let fields = fields_for(step).len();
                if fields > 0 {
                    screen.focus = (screen.focus + 1) % fields;
                } else {
                    let options = options_for(step).len();
                    if screen.cursor + 1 < options {
                        screen.cursor += 1;
                    }
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                let fields = fields_for(step).len();
                if fields > 0 {
                    screen.focus = (screen.focus + fields - 1) % fields;
                } else {
                    screen.cursor = screen.cursor.saturating_sub(1);
                }
            }

            KeyCode::Enter => match step {
                OnboardingStep::LoginPrompt | OnboardingStep::SignupPrompt => {
                    self.start_authentication(AuthMethod::Credentials);
                }
                OnboardingStep::BiometricsInput => {
                    if screen.flow.next().is_ok() {
                        self.after_onboarding_step();
                    }
                }
                OnboardingStep::GoalSelection | OnboardingStep::PlanSelection | OnboardingStep::DurationSelection => {
                    screen.select_highlighted();
                    if screen.flow.next().is_ok() {
                        self.after_onboarding_step();
                    }
                }
                OnboardingStep::Completed => self.navigate(Route::Dashboard),
            },

            KeyCode::Backspace => {
                if let Some(field) = screen.focused_field() {
                    let mut value = screen.field_value(field);
                    value.pop();
                    screen.set_field(field, &value);
                }
            }
            KeyCode::Char(c) if !ctrl => {
                if let Some(field) = screen.focused_field() {
                    let mut value = screen.field_value(field);
                    value.push(c);
                    screen.set_field(field, &value);
                }
            }
            _ => {}
        }
    }

    async fn handle_dashboard_key(&mut self, key: KeyEvent) -> Result<()> {
        let Screen::Dashboard(screen) = &mut self.screen else {
            return Ok(());
        };

        // Weight entry box captures typing
        if let Some(input) = screen.weight_input.as_mut() {
            match key.code {
                KeyCode::Esc => screen.weight_input = None,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => input.push(c),
                KeyCode::Enter => {
                    let typed = input.clone();
                    match screen.state.add_weight(&typed) {
                        Ok(sample) => {
                            screen.message = Some(format!("Week {}: {:.1} kg", sample.week_index, sample.weight));
                            screen.weight_input = None;
                            if let Some(storage) = &self.storage {
                                if let Err(e) = storage.save_weight(&sample) {
                                    tracing::warn!("Failed to persist weight: {:#}", e);
                                }
                            }
                        }
                        Err(e) => screen.message = Some(e.to_string()),
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        match screen.state.view() {
            DashboardView::Profile => match key.code {
                KeyCode::Esc | KeyCode::Char('p') => screen.state.close_profile(),
                KeyCode::Char('o') => return self.logout().await,
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },

            DashboardView::RatingPrompt => {
                let rating = match key.code {
                    KeyCode::Char('1') => Some(CompletionRating::Low),
                    KeyCode::Char('2') => Some(CompletionRating::Mid),
                    KeyCode::Char('3') => Some(CompletionRating::High),
                    KeyCode::Esc => {
                        screen.state.cancel_workout();
                        screen.message = Some("Workout cancelled".to_string());
                        None
                    }
                    KeyCode::Char('p') => {
                        screen.state.open_profile();
                        None
                    }
                    _ => None,
                };
                if let Some(rating) = rating {
                    let completed = screen.state.rate_workout(rating)?;
                    screen.message = Some(if completed.streak_incremented {
                        format!(
                            "Weekly goal reached! Streak: {} weeks",
                            completed.activity.weekly_streak()
                        )
                    } else {
                        format!("{} complete, rated {}", completed.plan_name, completed.rating)
                    });
                    if let Some(storage) = &self.storage {
                        if let Err(e) = storage.save_activity(&completed.activity) {
                            tracing::warn!("Failed to persist weekly activity: {:#}", e);
                        }
                    }
                }
            }

            DashboardView::Exercise => match key.code {
                KeyCode::Right | KeyCode::Char('n') | KeyCode::Enter => {
                    screen.state.next_exercise();
                }
                KeyCode::Left | KeyCode::Char('b') => {
                    screen.state.previous_exercise();
                }
                KeyCode::Esc | KeyCode::Char('c') => {
                    if screen.state.cancel_workout() == Navigation::Cancelled {
                        screen.message = Some("Workout cancelled".to_string());
                    }
                }
                KeyCode::Char('p') => screen.state.open_profile(),
                _ => {}
            },

            DashboardView::Summary => match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
                KeyCode::Char('?') => self.show_help = true,
                KeyCode::Up | KeyCode::Char('k') => {
                    screen.selected_plan = screen.selected_plan.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if screen.selected_plan + 1 < screen.state.plans().len() {
                        screen.selected_plan += 1;
                    }
                }
                KeyCode::Enter | KeyCode::Char('s') => {
                    if let Err(e) = screen.state.start_workout(screen.selected_plan) {
                        screen.message = Some(e.to_string());
                    } else {
                        screen.message = None;
                    }
                }
                KeyCode::Char('w') => screen.weight_input = Some(String::new()),
                KeyCode::Char('p') => screen.state.open_profile(),
                KeyCode::Char('o') => return self.logout().await,
                _ => {}
            },
        }
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        let Screen::Dashboard(screen) = &mut self.screen else {
            return Ok(());
        };
        match screen.state.logout(&self.session).await {
            Ok(route) => self.navigate(route),
            Err(e) => {
                tracing::warn!("Sign-out failed: {}", e);
                screen.message = Some(e.to_string());
            }
        }
        Ok(())
    }
}
