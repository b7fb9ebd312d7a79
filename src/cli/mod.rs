//! CLI module for Tally
//!
//! Provides commands:
//! - `tools`: print the tools the agent may call
//! - `call`: run one tool against the user's session
//! - `session`: show the user's session (creating it if needed)
//! - `sessions`: list every session of the configured user

use clap::{Parser, Subcommand};

mod runtime;
mod session;
mod tools;

/// Tally - stateful reminder and table tools
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Persistent reminders and SQLite table tools for agent runtimes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print enabled tool definitions as JSON
    Tools,
    /// Run a tool against the user's session and print the result
    Call {
        /// Tool name (see `tally tools`)
        tool: String,
        /// Tool input as a JSON object
        #[arg(short, long, default_value = "{}")]
        input: String,
    },
    /// Show the user's session id and state
    Session,
    /// List all sessions of the configured user
    Sessions,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Tools) => tools::run().await,
        Some(Commands::Call { tool, input }) => session::call(&tool, &input).await,
        Some(Commands::Session) => session::show().await,
        Some(Commands::Sessions) => session::list().await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call() {
        let cli = Cli::try_parse_from([
            "tally",
            "call",
            "add_reminder",
            "--input",
            r#"{"reminder":"x"}"#,
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Call { tool, input }) => {
                assert_eq!(tool, "add_reminder");
                assert_eq!(input, r#"{"reminder":"x"}"#);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_call_input_defaults_to_empty_object() {
        let cli = Cli::try_parse_from(["tally", "call", "view_reminders"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Call { ref input, .. }) if input == "{}"
        ));
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["tally"]).unwrap();
        assert!(cli.command.is_none());
    }
}
