use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{self, AuthError, AuthGateway, AuthRequest, Credentials, Identity};
use crate::models::{
    calculate_bmi, parse_measurement, require_text, validate_email, FitnessGoal, InputError, PlanTier,
    ProgramDuration, UserProfile,
};
use crate::storage::ProfileRepository;

/// Onboarding steps, in order.
///
/// LoginPrompt and SignupPrompt toggle between each other until
/// authentication succeeds; the remaining steps only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStep {
    LoginPrompt,
    SignupPrompt,
    BiometricsInput,
    GoalSelection,
    PlanSelection,
    DurationSelection,
    Completed,
}

impl OnboardingStep {
    /// Position in the original step numbering; `Completed` has none
    pub fn index(&self) -> Option<u8> {
        match self {
            Self::LoginPrompt => Some(0),
            Self::SignupPrompt => Some(1),
            Self::BiometricsInput => Some(2),
            Self::GoalSelection => Some(3),
            Self::PlanSelection => Some(4),
            Self::DurationSelection => Some(5),
            Self::Completed => None,
        }
    }

    pub fn is_auth_step(&self) -> bool {
        matches!(self, Self::LoginPrompt | Self::SignupPrompt)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Transition table
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (LoginPrompt, SignupPrompt)
                | (SignupPrompt, LoginPrompt)
                | (LoginPrompt, BiometricsInput)
                | (SignupPrompt, BiometricsInput)
                | (LoginPrompt, Completed)
                | (SignupPrompt, Completed)
                | (BiometricsInput, GoalSelection)
                | (GoalSelection, PlanSelection)
                | (PlanSelection, DurationSelection)
                | (DurationSelection, Completed)
        )
    }

    /// Heading shown for the step
    pub fn title(&self) -> &'static str {
        match self {
            Self::LoginPrompt => "Welcome Back!",
            Self::SignupPrompt => "Create Account",
            Self::BiometricsInput => "Let's calculate your BMI",
            Self::GoalSelection => "Set your fitness goal",
            Self::PlanSelection => "Choose your workout plan",
            Self::DurationSelection => "Set your program duration",
            Self::Completed => "All set!",
        }
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LoginPrompt => "login",
            Self::SignupPrompt => "signup",
            Self::BiometricsInput => "biometrics",
            Self::GoalSelection => "goal",
            Self::PlanSelection => "plan",
            Self::DurationSelection => "duration",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OnboardingError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Cannot {action} on the {step} step")]
    NotOnStep { step: OnboardingStep, action: &'static str },
}

/// Which button started authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Login on LoginPrompt, account creation on SignupPrompt
    Credentials,
    SocialProvider,
}

/// Raw profile input as typed, parsed when the step is committed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDraft {
    pub name: String,
    pub age: String,
    pub height: String,
    pub weight: String,
    pub goal: Option<FitnessGoal>,
    pub plan: Option<PlanTier>,
    pub duration: Option<ProgramDuration>,
}

impl ProfileDraft {
    fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            age: profile.age.map(|a| a.to_string()).unwrap_or_default(),
            height: profile.height.map(|h| h.to_string()).unwrap_or_default(),
            weight: profile.weight.map(|w| w.to_string()).unwrap_or_default(),
            goal: profile.goal,
            plan: profile.workout_plan,
            duration: profile.workout_duration,
        }
    }
}

/// Step-by-step onboarding: authentication, then profile collection.
///
/// Every committing transition overwrites the cached profile. A storage
/// failure never blocks the flow; it is reported through `warning()`.
pub struct OnboardingFlow {
    step: OnboardingStep,
    credentials: Credentials,
    draft: ProfileDraft,
    profile: UserProfile,
    cached_completed: Option<UserProfile>,
    error: Option<String>,
    warning: Option<String>,
    auth_in_flight: bool,
    repository: Arc<dyn ProfileRepository>,
}

impl OnboardingFlow {
    fn with_step(step: OnboardingStep, repository: Arc<dyn ProfileRepository>) -> Self {
        Self {
            step,
            credentials: Credentials::default(),
            draft: ProfileDraft::default(),
            profile: UserProfile::default(),
            cached_completed: None,
            error: None,
            warning: None,
            auth_in_flight: false,
            repository,
        }
    }

    /// Pick the entry step from the cached profile.
    ///
    /// No profile starts at LoginPrompt, an unfinished one resumes at
    /// BiometricsInput with its fields filled in, a finished one is Completed.
    pub fn resume(repository: Arc<dyn ProfileRepository>) -> Self {
        let mut flow = Self::with_step(OnboardingStep::LoginPrompt, repository);

        match flow.repository.load() {
            Ok(Some(profile)) if profile.onboarding_completed => {
                tracing::debug!("Cached profile is complete, skipping onboarding");
                flow.credentials.email = profile.email.clone();
                flow.draft = ProfileDraft::from_profile(&profile);
                flow.cached_completed = Some(profile.clone());
                flow.profile = profile;
                flow.step = OnboardingStep::Completed;
            }
            Ok(Some(profile)) => {
                tracing::info!("Resuming onboarding at biometrics for {:?}", profile.uid);
                flow.credentials.email = profile.email.clone();
                flow.draft = ProfileDraft::from_profile(&profile);
                flow.profile = profile;
                flow.step = OnboardingStep::BiometricsInput;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Could not read cached profile: {}", e);
                flow.warning = Some(e.to_string());
            }
        }

        flow
    }

    /// Entry through the signup route
    pub fn resume_at_signup(repository: Arc<dyn ProfileRepository>) -> Self {
        let mut flow = Self::resume(repository);
        if flow.step == OnboardingStep::LoginPrompt {
            flow.step = OnboardingStep::SignupPrompt;
        }
        flow
    }

    /// Ask for credentials again while keeping the cached profile.
    ///
    /// Used when the dashboard is reached without an identity. A sign-in that
    /// returns the cached uid goes straight back to Completed. An unfinished
    /// profile keeps its typed values for the biometrics step.
    pub fn reauthenticate(repository: Arc<dyn ProfileRepository>) -> Self {
        let mut flow = Self::resume(repository);
        if matches!(flow.step, OnboardingStep::Completed | OnboardingStep::BiometricsInput) {
            flow.step = OnboardingStep::LoginPrompt;
        }
        flow
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step.is_terminal()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    /// Profile as last committed
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Message from the last rejected action
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Storage problem that did not stop the flow
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn is_auth_in_flight(&self) -> bool {
        self.auth_in_flight
    }

    fn expect_step(&self, allowed: &[OnboardingStep], action: &'static str) -> Result<(), OnboardingError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(OnboardingError::NotOnStep {
                step: self.step,
                action,
            })
        }
    }

    fn expect_auth_step(&self, action: &'static str) -> Result<(), OnboardingError> {
        self.expect_step(&[OnboardingStep::LoginPrompt, OnboardingStep::SignupPrompt], action)
    }

    fn transition(&mut self, target: OnboardingStep) {
        debug_assert!(self.step.can_transition_to(target));
        tracing::debug!("Onboarding {} -> {}", self.step, target);
        self.step = target;
        self.error = None;
    }

    fn reject<T>(&mut self, error: impl Into<OnboardingError>) -> Result<T, OnboardingError> {
        let error = error.into();
        self.error = Some(error.to_string());
        Err(error)
    }

    fn persist(&mut self) {
        self.profile.touch();
        if let Err(e) = self.repository.save(&self.profile) {
            tracing::warn!("Failed to persist profile: {}", e);
            self.warning = Some(e.to_string());
        }
    }

    // Field edits

    pub fn set_email(&mut self, email: &str) -> Result<(), OnboardingError> {
        self.expect_auth_step("edit the email")?;
        self.credentials.email = email.to_string();
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> Result<(), OnboardingError> {
        self.expect_auth_step("edit the password")?;
        self.credentials.password = password.to_string();
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), OnboardingError> {
        self.expect_step(&[OnboardingStep::SignupPrompt], "edit the name")?;
        self.draft.name = name.to_string();
        Ok(())
    }

    pub fn set_height(&mut self, height: &str) -> Result<(), OnboardingError> {
        self.expect_step(&[OnboardingStep::BiometricsInput], "edit the height")?;
        self.draft.height = height.to_string();
        Ok(())
    }

    pub fn set_weight(&mut self, weight: &str) -> Result<(), OnboardingError> {
        self.expect_step(&[OnboardingStep::BiometricsInput], "edit the weight")?;
        self.draft.weight = weight.to_string();
        Ok(())
    }

    /// Optional; an empty value clears it
    pub fn set_age(&mut self, age: &str) -> Result<(), OnboardingError> {
        self.expect_step(&[OnboardingStep::BiometricsInput], "edit the age")?;
        self.draft.age = age.to_string();
        Ok(())
    }

    pub fn select_goal(&mut self, goal: FitnessGoal) -> Result<(), OnboardingError> {
        self.expect_step(&[OnboardingStep::GoalSelection], "select a goal")?;
        self.draft.goal = Some(goal);
        Ok(())
    }

    pub fn select_plan(&mut self, plan: PlanTier) -> Result<(), OnboardingError> {
        self.expect_step(&[OnboardingStep::PlanSelection], "select a plan")?;
        self.draft.plan = Some(plan);
        Ok(())
    }

    pub fn select_duration(&mut self, duration: ProgramDuration) -> Result<(), OnboardingError> {
        self.expect_step(&[OnboardingStep::DurationSelection], "select a duration")?;
        self.draft.duration = Some(duration);
        Ok(())
    }

    /// Switch between the login and signup prompts
    pub fn toggle_auth_mode(&mut self) -> Result<OnboardingStep, OnboardingError> {
        self.expect_auth_step("switch between login and signup")?;
        if self.auth_in_flight {
            return self.reject(AuthError::AuthenticationInFlight);
        }
        let target = match self.step {
            OnboardingStep::LoginPrompt => OnboardingStep::SignupPrompt,
            _ => OnboardingStep::LoginPrompt,
        };
        self.transition(target);
        Ok(target)
    }

    // Authentication

    /// Validate input and mark an attempt as in flight.
    ///
    /// The returned request is handed to the gateway; its result must come
    /// back through `finish_authentication`. A second call before that is
    /// rejected with `AuthenticationInFlight`.
    pub fn begin_authentication(&mut self, method: AuthMethod) -> Result<AuthRequest, OnboardingError> {
        self.expect_auth_step("authenticate")?;
        if self.auth_in_flight {
            return Err(AuthError::AuthenticationInFlight.into());
        }

        let request = match method {
            AuthMethod::SocialProvider => AuthRequest::SocialProvider,
            AuthMethod::Credentials => {
                if let Err(e) = validate_email(&self.credentials.email) {
                    return self.reject(e);
                }
                if let Err(e) = require_text("password", &self.credentials.password) {
                    return self.reject(e);
                }
                let credentials = Credentials {
                    email: self.credentials.email.trim().to_string(),
                    password: self.credentials.password.clone(),
                };
                match self.step {
                    OnboardingStep::SignupPrompt => AuthRequest::SignUp {
                        credentials,
                        name: self.draft.name.trim().to_string(),
                    },
                    _ => AuthRequest::SignIn(credentials),
                }
            }
        };

        self.auth_in_flight = true;
        self.error = None;
        tracing::debug!("Authentication started: {}", request.kind());
        Ok(request)
    }

    /// Apply the gateway's answer to the attempt started by `begin_authentication`
    pub fn finish_authentication(
        &mut self,
        result: Result<Identity, AuthError>,
    ) -> Result<OnboardingStep, OnboardingError> {
        if !self.auth_in_flight {
            return Err(OnboardingError::NotOnStep {
                step: self.step,
                action: "finish authentication without an attempt",
            });
        }
        self.auth_in_flight = false;

        let identity = match result {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Authentication failed: {}", e);
                return self.reject(e);
            }
        };
        self.credentials.clear_password();

        if let Some(cached) = self.cached_completed.clone() {
            if cached.uid.as_deref() == Some(identity.uid.as_str()) {
                tracing::info!("Signed back in as {}, onboarding already complete", identity.uid);
                self.profile = cached;
                self.transition(OnboardingStep::Completed);
                return Ok(self.step);
            }
        }

        let email = identity
            .email
            .clone()
            .unwrap_or_else(|| self.credentials.email.trim().to_string());
        let name = match identity.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self.draft.name.trim().to_string(),
        };

        self.profile = UserProfile {
            uid: Some(identity.uid.clone()),
            email: email.clone(),
            name: name.clone(),
            ..UserProfile::default()
        };
        self.credentials.email = email;
        self.draft.name = name;
        self.persist();

        tracing::info!("Authenticated {}, starting profile setup", identity.uid);
        self.transition(OnboardingStep::BiometricsInput);
        Ok(self.step)
    }

    /// Run a full authentication round trip against the gateway
    pub async fn authenticate(
        &mut self,
        gateway: &dyn AuthGateway,
        method: AuthMethod,
    ) -> Result<OnboardingStep, OnboardingError> {
        let request = self.begin_authentication(method)?;
        let result = auth::authenticate(gateway, &request).await;
        self.finish_authentication(result)
    }

    // Profile steps

    /// Commit the current step and move forward. On DurationSelection this
    /// completes onboarding.
    pub fn next(&mut self) -> Result<OnboardingStep, OnboardingError> {
        match self.step {
            OnboardingStep::BiometricsInput => {
                let height = match parse_measurement("height", &self.draft.height) {
                    Ok(h) => h,
                    Err(e) => return self.reject(e),
                };
                let weight = match parse_measurement("weight", &self.draft.weight) {
                    Ok(w) => w,
                    Err(e) => return self.reject(e),
                };
                let age = match self.draft.age.trim() {
                    "" => None,
                    raw => match raw.parse::<u32>() {
                        Ok(age) if age > 0 => Some(age),
                        Ok(_) => {
                            return self.reject(InputError::OutOfRange {
                                field: "age",
                                value: raw.to_string(),
                            })
                        }
                        Err(_) => {
                            return self.reject(InputError::NotANumber {
                                field: "age",
                                value: raw.to_string(),
                            })
                        }
                    },
                };

                self.profile.height = Some(height);
                self.profile.weight = Some(weight);
                self.profile.age = age;
                self.persist();
                self.transition(OnboardingStep::GoalSelection);
            }
            OnboardingStep::GoalSelection => {
                let Some(goal) = self.draft.goal else {
                    return self.reject(InputError::Missing { field: "goal" });
                };
                self.profile.goal = Some(goal);
                self.persist();
                self.transition(OnboardingStep::PlanSelection);
            }
            OnboardingStep::PlanSelection => {
                let Some(plan) = self.draft.plan else {
                    return self.reject(InputError::Missing { field: "workoutPlan" });
                };
                self.profile.workout_plan = Some(plan);
                self.persist();
                self.transition(OnboardingStep::DurationSelection);
            }
            OnboardingStep::DurationSelection => {
                self.complete()?;
            }
            step => {
                return Err(OnboardingError::NotOnStep {
                    step,
                    action: "go to the next step",
                })
            }
        }
        Ok(self.step)
    }

    /// Final commit: derive BMI, mark the profile complete and persist it
    pub fn complete(&mut self) -> Result<&UserProfile, OnboardingError> {
        self.expect_step(&[OnboardingStep::DurationSelection], "complete onboarding")?;
        let Some(duration) = self.draft.duration else {
            return self.reject(InputError::Missing { field: "workoutDuration" });
        };

        self.profile.workout_duration = Some(duration);
        self.profile.bmi = match (self.profile.height, self.profile.weight) {
            (Some(height), Some(weight)) => Some(calculate_bmi(height, weight)),
            _ => None,
        };
        self.profile.onboarding_completed = true;
        self.persist();

        tracing::info!(
            "Onboarding complete for {:?} (bmi {:?})",
            self.profile.uid,
            self.profile.bmi
        );
        self.transition(OnboardingStep::Completed);
        Ok(&self.profile)
    }
}
