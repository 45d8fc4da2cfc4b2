use std::io;
use std::process::ExitCode;

use clap::Parser;

use stockroom_cli::{execute, Cli, StockroomConfig};
use stockroom_inventory::{FileStore, InventoryManager, LoadOutcome};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = StockroomConfig::from_env();
    if let Some(path) = cli.data_file.clone() {
        config.data_file = path;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    stockroom_observability::init(config.log_format);

    let (mut manager, outcome) = InventoryManager::open(FileStore::new(&config.data_file));
    if let LoadOutcome::StartedFresh { reason } = &outcome {
        eprintln!("Starting with an empty inventory ({reason})");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match execute(&mut manager, &cli.command, &config.export_file, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
