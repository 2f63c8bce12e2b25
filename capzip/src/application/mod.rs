pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use capzip_core::error::Result;
use clap::Parser;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    handlers::init_logging(cli.log_file.as_deref())?;
    match cli.command {
        Commands::Pack {
            inputs,
            ext,
            max_size_kb,
            fallback_ceiling,
            work_dir,
            level,
            deterministic,
        } => handlers::handle_pack(
            inputs,
            ext,
            max_size_kb,
            fallback_ceiling,
            work_dir,
            level,
            deterministic,
        )
        .map(|_| ()),
        Commands::List { archive } => handlers::handle_list(archive),
        Commands::Join { archive, out } => handlers::handle_join(archive, out),
    }
}
