// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains the steering model on a driving log
//   2. `predict` — loads the latest checkpoint and predicts
//                  the steering angle of one frame
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

use crate::application::train_use_case::TrainConfig;

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "steering-trainer",
    version = "0.1.0",
    about = "Train an end-to-end steering-angle CNN on simulator frames, then predict angles."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

/// Handles the `train` subcommand.
/// Prints the effective configuration, wires Ctrl-C, hands off to Layer 2.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;
    use crate::infra::interrupt::{install_ctrlc_handler, CancellationToken};

    let config: TrainConfig = args.into();
    print_config(&config);

    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let report = TrainUseCase::new(config).execute(cancel)?;

    if report.was_interrupted() {
        println!("Training interrupted at step {}.", report.global_step);
    } else {
        println!(
            "Training complete: {} epochs, {} steps.",
            report.epochs_completed, report.global_step
        );
    }
    if let Some(loss) = report.last_loss {
        println!("Last loss: {:.4}", loss);
    }
    Ok(())
}

/// Handles the `predict` subcommand.
fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(&TrainConfig::from(&args))?;
    let angle    = use_case.predict(&args.image)?;

    println!(
        "Steering angle: {:.4} (checkpoint step {})",
        angle,
        use_case.checkpoint_step()
    );
    Ok(())
}

/// Print the effective configuration as a two-column table.
fn print_config(config: &TrainConfig) {
    let rows  = config.summary();
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

    println!("{}", "=".repeat(width + 30));
    for (key, value) in rows {
        println!("{:<width$} | {}", key, value, width = width);
    }
    println!("{}", "=".repeat(width + 30));
}
