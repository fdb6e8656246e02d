//! Batch training and evaluation pipeline over labeled signals

mod pipeline;

use clap::{Parser, ValueEnum};
use pipeline::PipelineOptions;
use std::path::PathBuf;

/// Synthetic task to generate when no dataset file is supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Task {
    /// Four waveform families (sine, square, sawtooth, beat)
    Waveform,
    /// Two ECG rhythms (normal sinus vs. atrial fibrillation)
    Ecg,
}

#[derive(Debug, Parser)]
#[command(
    name = "tsc-runner",
    about = "Train and evaluate an LSTM classifier over labeled time series"
)]
struct Cli {
    /// Synthetic task used when --data is absent
    #[arg(long, value_enum, default_value_t = Task::Waveform)]
    task: Task,

    /// JSON-lines dataset path; takes precedence over --task
    #[arg(long)]
    data: Option<PathBuf>,

    /// Training epochs
    #[arg(long, default_value_t = 30)]
    epochs: usize,

    /// LSTM hidden state size
    #[arg(long, default_value_t = 16)]
    hidden: usize,

    /// SGD learning rate
    #[arg(long, default_value_t = 0.05)]
    learning_rate: f32,

    /// Fraction of examples used for training, the rest held out
    #[arg(long, default_value_t = 0.8)]
    train_fraction: f32,

    /// Seed driving the split, oversampling, weight init and shuffling
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Feature window size in samples (task default when omitted)
    #[arg(long)]
    window: Option<usize>,

    /// Feature hop size in samples (task default when omitted)
    #[arg(long)]
    hop: Option<usize>,

    /// Skip oversampling of the training split
    #[arg(long)]
    no_balance: bool,

    /// Majority class example count for synthetic tasks
    #[arg(long, default_value_t = 120)]
    majority: usize,

    /// Minority class example count for synthetic tasks
    #[arg(long, default_value_t = 40)]
    minority: usize,

    /// Write the trained model as a JSON checkpoint
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let options = PipelineOptions {
        source: match cli.data {
            Some(path) => pipeline::DataSource::File(path),
            None => match cli.task {
                Task::Waveform => pipeline::DataSource::Waveform {
                    majority: cli.majority,
                    minority: cli.minority,
                },
                Task::Ecg => pipeline::DataSource::Ecg {
                    majority: cli.majority,
                    minority: cli.minority,
                },
            },
        },
        epochs: cli.epochs,
        hidden_size: cli.hidden,
        learning_rate: cli.learning_rate,
        train_fraction: cli.train_fraction,
        seed: cli.seed,
        window: cli.window,
        hop: cli.hop,
        balance: !cli.no_balance,
        checkpoint: cli.checkpoint,
    };

    let report = pipeline::run(options)?;
    println!("{}", report);
    Ok(())
}
