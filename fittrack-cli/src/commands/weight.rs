use anyhow::{Context, Result};
use colored::Colorize;
use fittrack::services::DashboardState;
use fittrack::storage::ProfileRepository;

use super::CommandContext;
use crate::storage::Storage;

pub async fn add_weight(ctx: &CommandContext, value: &str) -> Result<()> {
    let storage = Storage::init().context("Weight history needs local storage")?;
    let profile = storage.load()?.unwrap_or_default();
    let activity = storage.load_activity(ctx.config.dashboard.weekly_workout_goal)?;
    let history = storage.load_weights()?;

    // Goes through the dashboard so an empty history is seeded the same way
    let mut state = DashboardState::new(profile, activity, history);
    let sample = match state.add_weight(value) {
        Ok(sample) => sample,
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            return Err(e.into());
        }
    };
    storage.save_weights(state.weights())?;

    println!("{} Week {}: {:.1} kg", "✓".green(), sample.week_index, sample.weight);
    Ok(())
}

pub async fn list_weights(_ctx: &CommandContext) -> Result<()> {
    let storage = Storage::init().context("Weight history needs local storage")?;
    let history = storage.load_weights()?;

    if history.is_empty() {
        println!("No weights recorded yet.");
        println!();
        println!("Use 'fittrack weight add <kg>' to record one.");
        return Ok(());
    }

    println!("{}", "Weight history".bold());
    println!("────────────────────────────────");

    let mut previous: Option<f64> = None;
    for sample in history.samples() {
        let change = match previous {
            Some(prev) => {
                let delta = sample.weight - prev;
                let text = format!("{:+.1}", delta);
                if delta < 0.0 {
                    text.green().to_string()
                } else if delta > 0.0 {
                    text.yellow().to_string()
                } else {
                    text
                }
            }
            None => String::new(),
        };
        println!(
            "  Week {:<3} {:>6.1} kg  {}  {}",
            sample.week_index,
            sample.weight,
            sample.recorded_at.format("%Y-%m-%d"),
            change
        );
        previous = Some(sample.weight);
    }

    Ok(())
}
