use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "capzip: size-capped archives", long_about = None)]
pub struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FallbackArg {
    /// Missing or invalid --max-size-kb never splits
    Unlimited,
    /// Missing or invalid --max-size-kb caps parts at 4 GiB
    #[value(name = "4gib")]
    FourGib,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack files into output<ext>, splitting into final_output<ext> when over the size cap
    Pack {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Archive extension: .zip or .7z (anything else means .zip)
        #[arg(long, default_value = ".zip")]
        ext: String,

        /// Maximum archive size in KiB; empty, zero or invalid means the fallback
        #[arg(long = "max-size-kb", allow_hyphen_values = true)]
        max_size_kb: Option<String>,

        /// What a missing or invalid size cap means
        #[arg(long, value_enum, default_value_t = FallbackArg::Unlimited)]
        fallback_ceiling: FallbackArg,

        /// Directory for output files
        #[arg(long, default_value = ".")]
        work_dir: PathBuf,

        /// Deflate level (0-9)
        #[arg(long)]
        level: Option<i64>,

        #[arg(long)]
        deterministic: bool,
    },

    /// List container entries
    List { archive: PathBuf },

    /// Rebuild the split container from a final_output archive
    Join { archive: PathBuf, out: PathBuf },
}
