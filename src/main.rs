mod cli;
mod db;
mod error;
mod models;

use cli::{App, MenuAction};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Select};
use error::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Initializing employee manager...");

    // Initialize the application state (DB connection pool, schema)
    let app = match App::new().await {
        Ok(app) => {
            info!("Application initialized successfully.");
            app
        },
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            println!(
                "{}",
                "Error: Failed to connect to the database. Check DATABASE_URL and logs.".red()
            );
            return Err(e); // Non-zero exit on startup failure
        },
    };

    println!("{}", "Welcome to the Employee Manager CLI!".cyan().bold());

    let labels: Vec<&str> = MenuAction::ALL.iter().map(|a| a.label()).collect();
    let exit_index = MenuAction::ALL.len() - 1;

    // Main interactive loop: one action per iteration, back to the menu on
    // completion or reported failure, until Exit.
    loop {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact_opt()? // Handle cancellation (e.g., Ctrl+C)
            .unwrap_or(exit_index); // Treat cancellation as Exit

        println!("\n---\n");

        let action = MenuAction::ALL[selection];
        if action == MenuAction::Exit {
            println!("{}", "Exiting. Goodbye!".green());
            break;
        }

        if let Err(e) = app.run_action(action).await {
            error!("Menu action failed: {:?}", e);
            println!(
                "{} {}",
                "Error executing action:".red(),
                e.to_string().red()
            );
        }

        println!("\n---\n");
    }

    Ok(())
}
