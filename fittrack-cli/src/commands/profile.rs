use anyhow::Result;
use clap::Args;
use colored::Colorize;
use fittrack::models::UserProfile;
use fittrack::storage::ProfileRepository;

use super::CommandContext;
use crate::storage::open_profile_cache;

#[derive(Args)]
pub struct ProfileCommand {
    /// Print the stored record as JSON
    #[arg(long)]
    json: bool,
}

impl ProfileCommand {
    pub async fn execute(self, _ctx: &CommandContext) -> Result<()> {
        let (profiles, _storage) = open_profile_cache();
        if let Some(warning) = profiles.warning() {
            println!("{} {}", "⚠".yellow(), warning);
        }

        let Some(profile) = profiles.load()? else {
            println!("No profile yet.");
            println!();
            println!("Use 'fittrack login' or 'fittrack signup' to set one up.");
            return Ok(());
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&profile)?);
            return Ok(());
        }

        print_profile(&profile);
        Ok(())
    }
}

fn print_profile(profile: &UserProfile) {
    fn or_dash(value: Option<String>) -> String {
        value.unwrap_or_else(|| "-".to_string())
    }

    println!("{}", "Profile".bold());
    println!("────────────────────────────────");
    println!("  Name:      {}", profile.display_name());
    println!("  Email:     {}", if profile.email.is_empty() { "-" } else { &profile.email });
    println!("  Age:       {}", or_dash(profile.age.map(|a| a.to_string())));
    println!("  Height:    {}", or_dash(profile.height.map(|h| format!("{} cm", h))));
    println!("  Weight:    {}", or_dash(profile.weight.map(|w| format!("{} kg", w))));
    println!("  BMI:       {}", or_dash(profile.bmi.map(|b| format!("{:.1}", b))));
    println!("  Goal:      {}", or_dash(profile.goal.map(|g| g.label().to_string())));
    println!("  Plan:      {}", or_dash(profile.workout_plan.map(|p| p.label().to_string())));
    println!("  Duration:  {}", or_dash(profile.workout_duration.map(|d| d.label())));
    println!();

    if profile.onboarding_completed {
        println!("{} Onboarding complete", "✓".green());
    } else {
        println!("{} Onboarding not finished; run 'fittrack login' to continue", "…".yellow());
    }
}
