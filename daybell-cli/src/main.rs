use anyhow::Result;
use clap::{Parser, Subcommand};

mod alerts;
mod config;
mod reminders_cmd;
mod runner;
mod state;
mod store;

use reminders_cmd::RemindersCommand;
use store::ReminderStore;

#[derive(Parser, Debug)]
#[command(name = "daybell", version, about = "Local class, meal and wake-up reminders")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Reminders(RemindersCommand),

    /// Arm timers for every reminder and ring them until interrupted
    Run,

    /// Inspect or create ~/.daybell/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,

    /// Print the resolved config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics on stderr; command output stays on stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = ReminderStore::open(state::reminders_path()?);

    match cli.command {
        Command::Reminders(cmd) => reminders_cmd::run(&store, cmd)?,

        Command::Run => {
            let cfg = config::load_config()?;
            runner::run(store, cfg).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}
