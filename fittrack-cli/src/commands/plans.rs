use anyhow::Result;
use clap::Args;
use colored::Colorize;
use fittrack::models::{WeeklyActivity, WorkoutPlan};

use super::CommandContext;
use crate::storage::Storage;

#[derive(Args)]
pub struct PlansCommand {}

impl PlansCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let goal = ctx.config.dashboard.weekly_workout_goal;
        let activity = match Storage::init().and_then(|storage| storage.load_activity(goal)) {
            Ok(activity) => activity,
            Err(e) => {
                tracing::warn!("Could not read weekly activity: {:#}", e);
                WeeklyActivity::with_goal(goal)
            }
        };

        println!("{}", "This week".bold());
        println!(
            "  {}/{} workouts ({:.0}%), streak {} weeks",
            activity.completed_this_week(),
            activity.weekly_goal(),
            activity.progress_percentage(),
            activity.weekly_streak()
        );
        println!();

        for (i, plan) in WorkoutPlan::catalog().iter().enumerate() {
            println!("{} {}", format!("{}.", i + 1).cyan(), plan.name.bold());
            for exercise in &plan.exercises {
                println!("     {:<24} {}", exercise.name, exercise.prescription());
            }
            println!();
        }

        println!("Start a workout from the dashboard: run 'fittrack'.");
        Ok(())
    }
}
