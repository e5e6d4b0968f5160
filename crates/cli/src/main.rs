//! Stride CLI - Database migrations and cart tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! stride-cli migrate
//!
//! # Inspect or delete a user's persisted cart
//! stride-cli cart show --user <UUID>
//! stride-cli cart clear --user <UUID>
//! stride-cli cart recent --limit 20
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use stride_core::UserId;

mod commands;

#[derive(Parser)]
#[command(name = "stride-cli")]
#[command(author, version, about = "Stride CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Inspect persisted carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print a user's stored cart as JSON
    Show {
        /// User ID (UUID)
        #[arg(short, long)]
        user: UserId,
    },
    /// Delete a user's stored cart
    Clear {
        /// User ID (UUID)
        #[arg(short, long)]
        user: UserId,
    },
    /// List the most recently updated carts
    Recent {
        /// Maximum number of carts to list
        #[arg(
            short,
            long,
            default_value_t = 20,
            value_parser = clap::value_parser!(u32).range(1..=1000)
        )]
        limit: u32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Cart { action } => match action {
            CartAction::Show { user } => commands::cart::show(user).await?,
            CartAction::Clear { user } => commands::cart::clear(user).await?,
            CartAction::Recent { limit } => commands::cart::recent(limit).await?,
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
    fn test_parse_cart_show() {
        let cli = Cli::try_parse_from([
            "stride-cli",
            "cart",
            "show",
            "--user",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Cart {
                action: CartAction::Show { .. }
            })
        ));
    }

    #[test]
    fn test_parse_recent_limit_bounds() {
        let cli = Cli::try_parse_from(["stride-cli", "cart", "recent"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Cart {
                action: CartAction::Recent { limit: 20 }
            })
        ));

        for bad in ["-5", "0", "1001"] {
            assert!(
                Cli::try_parse_from(["stride-cli", "cart", "recent", "--limit", bad]).is_err(),
                "limit {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_bad_user_id() {
        assert!(Cli::try_parse_from(["stride-cli", "cart", "clear", "--user", "nope"]).is_err());
    }
}
