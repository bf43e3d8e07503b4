use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CommandContext;

#[derive(Args)]
pub struct LogoutCommand {}

impl LogoutCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        if !ctx.config.is_authenticated() {
            println!("You are not logged in.");
            return Ok(());
        }

        let session = ctx.session()?;
        session.sign_out().await?;

        println!("{} Logged out successfully!", "✓".green());
        println!("Your profile stays on this device; sign in again to return to your dashboard.");

        Ok(())
    }
}
