//! Moves feedback between the block log and the JSON feedback file.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use structopt::StructOpt;

use feedback::store::{blocks, JsonFileStore, Store};
use log::{info, initialize_logger, warn};

#[derive(Debug, StructOpt)]
#[structopt(name = "import-feedback", about = "Import or export the feedback block log.")]
enum Command {
    /// Appends every record in a block log to the feedback file,
    /// skipping IDs that are already present.
    Import {
        /// The block log to read.
        #[structopt(parse(from_os_str))]
        source: PathBuf,

        /// The JSON feedback file to append to.
        #[structopt(long, parse(from_os_str), default_value = "data/feedbacks.json")]
        into: PathBuf,
    },

    /// Writes the feedback file out as a block log.
    Export {
        /// The JSON feedback file to read.
        #[structopt(parse(from_os_str), default_value = "data/feedbacks.json")]
        file: PathBuf,

        /// Where to write the block log.
        #[structopt(long, parse(from_os_str))]
        to: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = Arc::new(initialize_logger("import-feedback"));

    match Command::from_args() {
        Command::Import { source, into } => {
            let text = tokio::fs::read_to_string(&source).await?;
            let parsed = blocks::parse(&text);

            if parsed.skipped > 0 {
                warn!(logger, "Skipped unreadable entries"; "count" => parsed.skipped);
            }

            let store = JsonFileStore::open(logger.clone(), &into).await?;
            let imported = blocks::import(&store, parsed.records).await?;

            info!(logger, "Imported feedback"; "imported" => imported, "file" => %into.display());
        }
        Command::Export { file, to } => {
            let store = JsonFileStore::open(logger.clone(), &file).await?;
            let records = store.list().await?;

            tokio::fs::write(&to, blocks::encode_all(records.iter())).await?;

            info!(logger, "Exported feedback"; "exported" => records.len(), "log" => %to.display());
        }
    }

    Ok(())
}
