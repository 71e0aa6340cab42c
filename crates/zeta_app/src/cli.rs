use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "zeta")]
#[command(author, version, about = "Evaluate the Riemann zeta function on the GPU")]
#[command(propagate_version = true)]
pub struct Cli {
    /// JSON settings file (defaults are used for missing fields)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Term-pass workgroups; the series is truncated after batch_size * oversampling terms
    #[arg(long, global = true)]
    pub oversampling: Option<u32>,

    /// Evaluate partial sums in f64 on the host instead of the GPU
    #[arg(long, global = true)]
    pub cpu: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate zeta at a single point
    #[command(allow_negative_numbers = true)]
    Eval {
        /// Real part of s
        re: f64,

        /// Imaginary part of s
        im: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sample the critical strip row by row
    Strip {
        /// Stop after this many rows even if y_limit is not reached
        #[arg(long)]
        rows: Option<usize>,

        /// Write the sampled mesh to this JSON file
        #[arg(long)]
        export: Option<PathBuf>,
    },
}
