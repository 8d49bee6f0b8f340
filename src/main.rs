//! Gradecast - Main Entry Point
//!
//! Cleans student score tables, grades them and trains grade classifiers.

use clap::Parser;
use gradecast::cli::{cmd_clean, cmd_info, cmd_predict, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gradecast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Clean {
            data,
            output,
            no_fail_flag,
        } => {
            cmd_clean(&data, &output, no_fail_flag)?;
        }
        Commands::Train {
            data,
            output,
            model,
            train_fraction,
            seed,
            max_depth,
            trees,
            track_dir,
            no_fail_flag,
        } => {
            cmd_train(
                &data,
                &output,
                &model,
                train_fraction,
                seed,
                max_depth,
                trees,
                track_dir.as_deref(),
                no_fail_flag,
            )?;
        }
        Commands::Predict {
            model,
            data,
            output,
        } => {
            cmd_predict(&model, &data, output.as_deref())?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
