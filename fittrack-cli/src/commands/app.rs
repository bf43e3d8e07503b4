use anyhow::Result;
use clap::Args;
use std::time::Duration;

use super::CommandContext;
use crate::storage::open_profile_cache;
use crate::ui::{App, Shell};

#[derive(Args, Default)]
pub struct AppCommand {}

impl AppCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let session = ctx.session()?;
        let (profiles, storage) = open_profile_cache();
        let app = App::new(session, profiles, storage, ctx.config.dashboard.weekly_workout_goal)?;

        tracing::info!("Starting interactive client");
        let mut shell = Shell::new(app, Duration::from_millis(ctx.config.ui.tick_rate_ms))?;
        let result = shell.run().await;

        // Restore the terminal before any error is printed
        drop(shell);
        result
    }
}
