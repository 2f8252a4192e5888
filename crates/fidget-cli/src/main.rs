//! CLI for fidget — collect entropy from your mouse hand, get random numbers.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fidget")]
#[command(about = "fidget — entropy-based random numbers in [0, 2048)")]
#[command(version = fidget_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive collection session and generate random numbers
    Collect {
        /// Also collect microphone entropy (requires ffmpeg and an input device)
        #[arg(long)]
        audio: bool,

        /// How many numbers to generate once entropy is sufficient
        #[arg(long, default_value = "10")]
        count: usize,

        /// Generate all numbers as one independently-mixed batch
        #[arg(long)]
        batch: bool,

        /// Override the required active movement duration in seconds
        #[arg(long)]
        required_seconds: Option<f64>,

        /// Override the minimum pointer sample count
        #[arg(long)]
        min_pointer_samples: Option<usize>,

        /// Write generated numbers to a file, one per line (for `analyze`)
        #[arg(long)]
        output: Option<String>,
    },

    /// Run the randomness quality battery over a file of generated numbers
    Analyze {
        /// File of integers in [0, 2048), whitespace- or newline-separated
        input: String,

        /// Write full results as JSON
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            audio,
            count,
            batch,
            required_seconds,
            min_pointer_samples,
            output,
        } => commands::collect::run(commands::collect::CollectOptions {
            audio,
            count,
            batch,
            required_seconds,
            min_pointer_samples,
            output_path: output,
        }),
        Commands::Analyze { input, output } => {
            commands::analyze::run(&input, output.as_deref())
        }
    }
}
