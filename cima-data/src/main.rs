// cima-data - CIMA site data layer
// Entry point and command dispatch

use anyhow::{Context, Result};
use cima_data::app;
use cima_data::cli::{Cli, Commands};
use cima_data::commands;
use clap::Parser;
use directories::ProjectDirs;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("org", "cima", "cima-data")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("Could not determine a data directory; pass --data-dir")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cima_data=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let state = app::setup(&data_dir, cli.source.map(Into::into))
        .await
        .context("Failed to initialize data layer")?;

    match cli.command {
        Commands::Info => print_json(&commands::get_app_info(&state))?,
        Commands::Deals { query, types } => {
            print_json(&commands::list_deals(&state, query, types).await?)?
        }
        Commands::Highlights => print_json(&commands::get_highlights(&state).await?)?,
        Commands::Document { id } => print_json(&commands::get_document(&state, id).await?)?,
        Commands::Calendar { month } => {
            print_json(&commands::get_calendar(&state, month).await?)?
        }
        Commands::Event { id } => print_json(&commands::get_event(&state, id).await?)?,
        Commands::People => print_json(&commands::list_people(&state).await?)?,
        Commands::Person { id } => print_json(&commands::get_person(&state, id).await?)?,
        Commands::Subscribe { email } => {
            commands::subscribe(&state, email).await?;
            println!("Subscribed.");
        }
    }

    Ok(())
}
