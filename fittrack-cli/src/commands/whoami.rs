use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::onboard::spinner;
use super::CommandContext;

#[derive(Args)]
pub struct WhoamiCommand {}

impl WhoamiCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        if !ctx.config.is_authenticated() {
            println!("You are not logged in.");
            println!();
            println!("Use 'fittrack login' to authenticate.");
            return Ok(());
        }

        let session = ctx.session()?;
        let progress = spinner("Checking session...");
        let snapshot = session.restore().await;
        progress.finish_and_clear();

        match snapshot.identity {
            Some(identity) => {
                println!("{} Authenticated as:", "✓".green());
                println!();
                println!("  Name:     {}", identity.display_name.as_deref().unwrap_or("-"));
                println!("  Email:    {}", identity.email.as_deref().unwrap_or("-"));
                println!("  User ID:  {}", identity.uid);
            }
            None => {
                println!("{} Your session has expired.", "✗".red());
                println!();
                println!("Use 'fittrack login' to authenticate again.");
            }
        }

        Ok(())
    }
}
