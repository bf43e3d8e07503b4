// Prompt-driven onboarding shared by `login` and `signup`

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::{Input, Select};
use fittrack::auth::AuthGateway;
use fittrack::models::{FitnessGoal, PlanTier, ProgramDuration};
use fittrack::services::{AuthMethod, OnboardingFlow, OnboardingStep};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui::options_for;

pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run one authentication attempt with a spinner
pub async fn authenticate(flow: &mut OnboardingFlow, gateway: &dyn AuthGateway, method: AuthMethod) -> Result<()> {
    let progress = spinner("Signing in...");
    let result = flow.authenticate(gateway, method).await;
    progress.finish_and_clear();

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            Err(e.into())
        }
    }
}

/// Collect the remaining profile steps until onboarding completes
pub fn complete_profile(flow: &mut OnboardingFlow) -> Result<()> {
    if flow.is_complete() {
        println!("{} Welcome back, {}!", "✓".green(), flow.profile().display_name());
        return Ok(());
    }

    println!();
    println!("Let's set up your profile.");

    while !flow.is_complete() {
        let step = flow.step();
        if let Some(index) = step.index().filter(|_| !step.is_auth_step()) {
            println!();
            println!("{}", format!("Step {} of 4: {}", index - 1, step.title()).bold());
        }

        let committed = match step {
            OnboardingStep::LoginPrompt | OnboardingStep::SignupPrompt => {
                bail!("Not signed in");
            }
            OnboardingStep::BiometricsInput => {
                let draft = flow.draft().clone();
                let height: String = Input::new()
                    .with_prompt("Height (cm)")
                    .with_initial_text(draft.height)
                    .interact_text()?;
                let weight: String = Input::new()
                    .with_prompt("Weight (kg)")
                    .with_initial_text(draft.weight)
                    .interact_text()?;
                let age: String = Input::new()
                    .with_prompt("Age (optional)")
                    .with_initial_text(draft.age)
                    .allow_empty(true)
                    .interact_text()?;

                flow.set_height(&height)?;
                flow.set_weight(&weight)?;
                flow.set_age(&age)?;
                flow.next()
            }
            OnboardingStep::GoalSelection => {
                let current = flow
                    .draft()
                    .goal
                    .and_then(|g| FitnessGoal::ALL.iter().position(|x| *x == g));
                let index = select("Fitness goal", step, current)?;
                flow.select_goal(FitnessGoal::ALL[index])?;
                flow.next()
            }
            OnboardingStep::PlanSelection => {
                let current = flow
                    .draft()
                    .plan
                    .and_then(|p| PlanTier::ALL.iter().position(|x| *x == p));
                let index = select("Workout plan", step, current)?;
                flow.select_plan(PlanTier::ALL[index])?;
                flow.next()
            }
            OnboardingStep::DurationSelection => {
                let current = flow
                    .draft()
                    .duration
                    .and_then(|d| ProgramDuration::ALL.iter().position(|x| *x == d));
                let index = select("Program duration", step, current)?;
                flow.select_duration(ProgramDuration::ALL[index])?;
                flow.next()
            }
            OnboardingStep::Completed => break,
        };

        if let Err(e) = committed {
            println!("{} {}", "✗".red(), e);
        }
    }

    if let Some(warning) = flow.warning() {
        println!("{} Profile kept in memory only: {}", "⚠".yellow(), warning);
    }

    let profile = flow.profile();
    println!();
    println!("{} Onboarding complete!", "✓".green());
    if let Some(bmi) = profile.bmi {
        println!("  BMI: {:.1}", bmi);
    }
    println!();
    println!("Run 'fittrack' to open your dashboard.");

    Ok(())
}

fn select(prompt: &str, step: OnboardingStep, current: Option<usize>) -> Result<usize> {
    let items = options_for(step);
    let index = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(current.unwrap_or(0))
        .interact()?;
    Ok(index)
}
