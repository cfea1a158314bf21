//! Terracotta CLI - Database migrations, seeding and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! tc-cli migrate
//!
//! # Insert the sample catalog, testimonials and the admin account
//! ADMIN_EMAIL=owner@example.com ADMIN_PASSWORD=... tc-cli seed
//!
//! # Inspect and manage accounts
//! tc-cli users list
//! tc-cli users promote --email jane@example.com
//! tc-cli users check-admin
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tc-cli")]
#[command(author, version, about = "Terracotta CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the sample catalog, testimonials and admin account
    Seed,
    /// Inspect and manage user accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List every account
    List,
    /// Grant the admin role to an existing account
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Report whether the `ADMIN_EMAIL` account exists and its role
    CheckAdmin,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Users { action } => match action {
            UsersAction::List => commands::users::list().await?,
            UsersAction::Promote { email } => commands::users::promote(&email).await?,
            UsersAction::CheckAdmin => commands::users::check_admin().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_promote() {
        let cli = Cli::try_parse_from(["tc-cli", "users", "promote", "--email", "a@b.co"])
            .expect("parses");
        assert!(matches!(
            cli.command,
            Commands::Users {
                action: UsersAction::Promote { ref email }
            } if email == "a@b.co"
        ));
    }

    #[test]
    fn test_promote_requires_email() {
        assert!(Cli::try_parse_from(["tc-cli", "users", "promote"]).is_err());
    }
}
