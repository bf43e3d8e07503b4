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
pub struct LoginCommand {
    /// Account email
    #[arg(short, long)]
    email: Option<String>,

    /// Sign in with Google instead of a password
    #[arg(long, conflicts_with = "email")]
    google: bool,
}

impl LoginCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        println!("{}", "FitTrack - Login".bold());
        println!();

        let (profiles, _storage) = open_profile_cache();
        if let Some(warning) = profiles.warning() {
            println!("{} {}", "⚠".yellow(), warning);
        }
        let repository: Arc<dyn ProfileRepository> = profiles;
        let mut flow = OnboardingFlow::reauthenticate(repository);

        let method = if self.google {
            AuthMethod::SocialProvider
        } else {
            let email = match self.email {
                Some(email) => email,
                None => Input::new()
                    .with_prompt("Email")
                    .with_initial_text(flow.credentials().email.clone())
                    .interact_text()?,
            };
            let password = Password::new().with_prompt("Password").interact()?;

            flow.set_email(&email)?;
            flow.set_password(&password)?;
            AuthMethod::Credentials
        };

        let gateway = ctx.gateway()?;
        onboard::authenticate(&mut flow, gateway.as_ref(), method).await?;
        println!("{} Signed in as {}", "✓".green(), flow.credentials().email);

        onboard::complete_profile(&mut flow)
    }
}
