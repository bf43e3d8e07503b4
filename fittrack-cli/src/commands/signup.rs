use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dialoguer::{Input, Password};
use fittrack::services::{AuthMethod, OnboardingFlow};
use fittrack::storage::ProfileRepository;
use std::sync::Arc;

use super::onboard;
use super::CommandContext;
use crate::storage::open_profile_cache;

#[derive(Args)]
pub struct SignupCommand {
    /// Display name
    #[arg(short, long)]
    name: Option<String>,

    /// Account email
    #[arg(short, long)]
    email: Option<String>,
}

impl SignupCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        println!("{}", "FitTrack - Create account".bold());
        println!();

        let (profiles, _storage) = open_profile_cache();
        if let Some(warning) = profiles.warning() {
            println!("{} {}", "⚠".yellow(), warning);
        }
        let repository: Arc<dyn ProfileRepository> = profiles;
        let mut flow = OnboardingFlow::reauthenticate(repository);
        flow.toggle_auth_mode()?;

        let name = match self.name {
            Some(name) => name,
            None => Input::new().with_prompt("Name").allow_empty(true).interact_text()?,
        };
        let email = match self.email {
            Some(email) => email,
            None => Input::new().with_prompt("Email").interact_text()?,
        };
        let password = Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?;

        flow.set_name(&name)?;
        flow.set_email(&email)?;
        flow.set_password(&password)?;

        let gateway = ctx.gateway()?;
        onboard::authenticate(&mut flow, gateway.as_ref(), AuthMethod::Credentials).await?;
        println!("{} Account created for {}", "✓".green(), flow.credentials().email);

        onboard::complete_profile(&mut flow)
    }
}
