mod app;
mod config_cmd;
mod context;
mod login;
mod logout;
mod onboard;
mod plans;
mod profile;
mod signup;
mod weight;
mod whoami;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use app::AppCommand;
pub use context::CommandContext;
pub use login::LoginCommand;
pub use logout::LogoutCommand;
pub use plans::PlansCommand;
pub use profile::ProfileCommand;
pub use signup::SignupCommand;
pub use whoami::WhoamiCommand;

#[derive(Parser)]
#[command(name = "fittrack")]
#[command(about = "Guided onboarding, workouts and weekly progress in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use a local identity gateway instead of the identity service
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive client (default)
    App(AppCommand),

    /// Sign in and finish onboarding
    Login(LoginCommand),

    /// Create an account and set up a profile
    Signup(SignupCommand),

    /// Sign out, keeping the cached profile
    Logout(LogoutCommand),

    /// Show the signed-in identity
    Whoami(WhoamiCommand),

    /// Show the cached profile
    Profile(ProfileCommand),

    /// List workout plans and this week's progress
    Plans(PlansCommand),

    /// Track body weight
    #[command(subcommand)]
    Weight(WeightSubcommands),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigSubcommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum WeightSubcommands {
    /// Record this week's weight
    Add {
        /// Weight in kg
        value: String,
    },

    /// Show the weight history
    List,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show current configuration
    Show,

    /// Edit configuration file
    Edit,

    /// Initialize configuration with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Whether this invocation hands the terminal to the interactive client
    pub fn launches_app(&self) -> bool {
        matches!(self.command, None | Some(Commands::App(_)))
    }

    pub async fn execute(self) -> Result<()> {
        if self.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        let command = self.command.unwrap_or_else(|| Commands::App(AppCommand::default()));

        match command {
            Commands::Config(subcmd) => match subcmd {
                ConfigSubcommands::Show => config_cmd::show_config().await,
                ConfigSubcommands::Edit => config_cmd::edit_config().await,
                ConfigSubcommands::Init { force } => config_cmd::init_config(force).await,
            },
            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
            command => {
                let ctx = CommandContext::load(self.offline)?;
                command.run(&ctx).await
            }
        }
    }
}

impl Commands {
    async fn run(self, ctx: &CommandContext) -> Result<()> {
        match self {
            Commands::App(cmd) => cmd.execute(ctx).await,
            Commands::Login(cmd) => cmd.execute(ctx).await,
            Commands::Signup(cmd) => cmd.execute(ctx).await,
            Commands::Logout(cmd) => cmd.execute(ctx).await,
            Commands::Whoami(cmd) => cmd.execute(ctx).await,
            Commands::Profile(cmd) => cmd.execute(ctx).await,
            Commands::Plans(cmd) => cmd.execute(ctx).await,
            Commands::Weight(subcmd) => match subcmd {
                WeightSubcommands::Add { value } => weight::add_weight(ctx, &value).await,
                WeightSubcommands::List => weight::list_weights(ctx).await,
            },
            Commands::Config(_) | Commands::Completions { .. } => Ok(()),
        }
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
