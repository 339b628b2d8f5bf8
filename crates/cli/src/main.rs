//! Shoebox CLI - Persistent mirror inspection and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Print the cart stored in the persistent mirror
//! shoebox-cli cart show
//!
//! # Reset the mirror to an empty cart
//! shoebox-cli cart clear
//! ```
//!
//! # Commands
//!
//! - `cart show` - Print the mirrored cart line items
//! - `cart clear` - Reset the mirror to an empty cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shoebox-cli")]
#[command(author, version, about = "Shoebox CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and manage the persistent cart mirror
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the mirrored cart line items
    Show,
    /// Reset the mirror to an empty cart
    Clear,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show()?,
            CartAction::Clear => commands::cart::clear()?,
        },
    }
    Ok(())
}
