use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "prioritas")]
#[command(
    author,
    version,
    about = "Chi-Square feature selection and Naive Bayes prioritization of village complaints"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path (defaults are used when it does not exist)
    #[arg(short, long, global = true, default_value = "triage.yaml", env = "PRIORITAS_CONFIG")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score every feature of a labelled batch and show which are kept
    Select {
        /// Labelled complaints (JSON array or YAML sequence)
        #[arg(short, long)]
        input: PathBuf,

        /// Significance threshold, overrides the configuration
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Select features, train a model and write it to disk
    Train {
        /// Labelled complaints (JSON array or YAML sequence)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the trained model
        #[arg(short, long, default_value = "model.json")]
        output: PathBuf,

        /// Significance threshold, overrides the configuration
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Smoothing constant, overrides the configuration
        #[arg(long)]
        alpha: Option<f64>,
    },

    /// Rank incoming complaints with a trained model
    Predict {
        /// Trained model written by `train`
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Complaints to rank; labels, if present, are ignored
        #[arg(short, long)]
        input: PathBuf,

        /// Print the ranked queue as JSON
        #[arg(long)]
        json: bool,
    },

    /// Train on part of a labelled batch and report accuracy on the rest
    Evaluate {
        /// Labelled complaints (JSON array or YAML sequence)
        #[arg(short, long)]
        input: PathBuf,

        /// Share of records held out for testing
        #[arg(long, default_value = "0.2")]
        test_fraction: f64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic labelled batch for trying the tool out
    Generate {
        /// Number of complaints
        #[arg(short = 'n', long, default_value = "200")]
        count: usize,

        /// Random seed; the same seed always gives the same batch
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Share of labels replaced at random
        #[arg(long, default_value = "0.1")]
        noise: f64,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
