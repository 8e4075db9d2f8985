// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `predict`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;
use crate::application::train_use_case::TrainConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the steering model on a simulator driving log
    Train(TrainArgs),

    /// Predict the steering angle of one frame using the latest checkpoint
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Number of channels of the input frames
    #[arg(long = "channels", default_value_t = 3)]
    pub img_depth: usize,

    /// Side length of the (square) input frames
    #[arg(long, default_value_t = 32)]
    pub img_size: usize,

    /// Number of frames per optimizer step
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Dropout probability on the flattened conv features
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// RMSProp learning rate
    #[arg(long, default_value_t = 1e-2)]
    pub learning_rate: f64,

    /// Write the loss summary every N steps (0 disables)
    #[arg(long, default_value_t = 20)]
    pub log_every: u64,

    /// Save a checkpoint every N steps (0 disables)
    #[arg(long, default_value_t = 10)]
    pub save_every: u64,

    /// Number of full passes through the driving log
    #[arg(long, default_value_t = 1000)]
    pub epochs: usize,

    /// Directory for metrics.csv
    #[arg(long, default_value = "./saved/logs/")]
    pub log_dir: String,

    /// Directory containing driving_log.csv and IMG/
    #[arg(long, default_value = "./simulated_data/")]
    pub data_dir: String,

    /// Checkpoint prefix; its parent directory holds the checkpoints
    #[arg(long, default_value = "./saved/models/nvidia.ckpt")]
    pub save_path: String,

    /// Size of the windowed shuffle buffer
    #[arg(long, default_value_t = 1000)]
    pub buffer_size: usize,

    /// Feed frames in manifest order
    #[arg(long)]
    pub no_shuffle: bool,

    /// Seed for the shuffle (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of most recent checkpoints kept on disk
    #[arg(long, default_value_t = 5)]
    pub max_to_keep: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            img_depth:     a.img_depth,
            img_size:      a.img_size,
            batch_size:    a.batch_size,
            dropout:       a.dropout,
            learning_rate: a.learning_rate,
            log_every:     a.log_every,
            save_every:    a.save_every,
            epochs:        a.epochs,
            log_dir:       a.log_dir,
            data_dir:      a.data_dir,
            save_path:     a.save_path,
            shuffle:       !a.no_shuffle,
            buffer_size:   a.buffer_size,
            seed:          a.seed,
            max_to_keep:   a.max_to_keep,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Camera frame to predict a steering angle for
    #[arg(long)]
    pub image: PathBuf,

    /// Checkpoint prefix used during training
    #[arg(long, default_value = "./saved/models/nvidia.ckpt")]
    pub save_path: String,

    /// Side length the model was trained with
    #[arg(long, default_value_t = 32)]
    pub img_size: usize,

    /// Channels the model was trained with
    #[arg(long = "channels", default_value_t = 3)]
    pub img_depth: usize,
}

impl From<&PredictArgs> for TrainConfig {
    fn from(a: &PredictArgs) -> Self {
        TrainConfig {
            img_size:  a.img_size,
            img_depth: a.img_depth,
            save_path: a.save_path.clone(),
            ..TrainConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::parse_from(["steering-trainer", "train"]);
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        let cfg: TrainConfig = args.into();
        let defaults = TrainConfig::default();
        assert_eq!(cfg.batch_size, defaults.batch_size);
        assert_eq!(cfg.save_path, defaults.save_path);
        assert_eq!(cfg.learning_rate, defaults.learning_rate);
        assert!(cfg.shuffle);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::parse_from([
            "steering-trainer", "train",
            "--channels", "1",
            "--img-size", "28",
            "--no-shuffle",
            "--seed", "3",
            "--save-every", "0",
        ]);
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        let cfg: TrainConfig = args.into();
        assert_eq!((cfg.img_depth, cfg.img_size), (1, 28));
        assert!(!cfg.shuffle);
        assert_eq!(cfg.seed, Some(3));
        assert_eq!(cfg.save_every, 0);
    }

    #[test]
    fn test_predict_requires_image() {
        assert!(Cli::try_parse_from(["steering-trainer", "predict"]).is_err());
        let cli = Cli::parse_from(["steering-trainer", "predict", "--image", "f.png"]);
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(TrainConfig::from(&args).img_size, 32);
    }
}
