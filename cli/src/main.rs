use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use voidpub::cas::{CasClient, FsStore, IpfsClient};
use voidpub::description::DatasetDescription;
use voidpub::fetch::{FetchOptions, HttpFetcher};
use voidpub::publisher::{PublishOptions, Publisher};
use voidpub::telemetry::LogSink;

#[derive(Debug, Parser)]
#[command(name = "voidpub")]
#[command(about = "Publishes VoID-described datasets to a content-addressed store")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// Treat the URI as a direct pointer to the VoID document instead of
    /// applying the .well-known/void convention
    #[clap(long, action, default_value = "false", global = true)]
    direct: bool,
    /// Directory where snapshot staging directories are created, defaults
    /// to the current directory
    #[clap(long, global = true)]
    staging_root: Option<PathBuf>,
    /// Address of the IPFS HTTP API to publish through
    #[clap(long, default_value = "http://127.0.0.1:5001", global = true)]
    ipfs_api: String,
    /// Publish into a local content-addressed store at this path instead of IPFS
    #[clap(long, global = true)]
    local_store: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print every dataset described by a VoID document
    List {
        /// Base URI of the server publishing the description
        uri: String,
    },
    /// Fetch the description and publish one snapshot of a dataset
    Publish {
        /// Base URI of the server publishing the description
        uri: String,
        /// The id (subject IRI) of the dataset to publish
        dataset: String,
    },
    /// Publish, then poll for new versions forever
    Watch {
        /// Base URI of the server publishing the description
        uri: String,
        /// The id (subject IRI) of the dataset to publish
        dataset: String,
        /// Seconds to wait between polls
        #[clap(long, short, default_value = "3600")]
        interval: u64,
    },
}

fn main() -> Result<()> {
    let cmd = Cli::parse();

    let log_level = if cmd.verbose { "info" } else { "warn" };
    let log_level = if cmd.debug { "debug" } else { log_level };
    std::env::set_var("RUST_LOG", log_level);
    env_logger::init();

    let fetcher = Arc::new(HttpFetcher::new(FetchOptions::default())?);
    let well_known = !cmd.direct;

    match &cmd.command {
        Commands::List { uri } => {
            let desc = DatasetDescription::fetch(uri, well_known, fetcher)?;
            for dataset in desc.datasets() {
                println!("-----------------");
                println!("Dataset id: {}", dataset.id());
                if let Some(title) = dataset.title()? {
                    println!("Title: {}", title);
                }
                let dumps = dataset.data_dumps()?;
                if dumps.is_empty() {
                    println!("Dumps not available.");
                } else {
                    println!("Dumps available at:");
                    for dump in dumps {
                        println!("  {}", dump);
                    }
                }
            }
            println!("-----------------");
        }
        Commands::Publish { uri, dataset } => {
            let mut publisher = build_publisher(&cmd, uri, dataset, fetcher)?;
            publisher.publish("folder")?;
            if let Some(cid) = publisher.content_id() {
                println!("{}", cid);
            }
        }
        Commands::Watch {
            uri,
            dataset,
            interval,
        } => {
            let mut publisher = build_publisher(&cmd, uri, dataset, fetcher)?;
            let interrupted = Arc::new(AtomicBool::new(false));
            {
                let flag = interrupted.clone();
                ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;
            }
            let result = watch(&mut publisher, *interval, &interrupted);
            // surface the last snapshot id even when the loop stops
            if let Some(cid) = publisher.content_id() {
                println!();
                println!("Last content identifier: {}", cid);
                println!("To retrieve the contents use: $ipfs ls {}", cid);
            }
            result?;
        }
    }
    Ok(())
}

fn build_publisher(
    cmd: &Cli,
    uri: &str,
    dataset: &str,
    fetcher: Arc<HttpFetcher>,
) -> Result<Publisher> {
    let desc = DatasetDescription::fetch(uri, !cmd.direct, fetcher)?;
    let cas: Box<dyn CasClient> = match &cmd.local_store {
        Some(root) => Box::new(FsStore::open(root)?),
        None => Box::new(IpfsClient::new(&cmd.ipfs_api)?),
    };
    let mut options = PublishOptions::default();
    if let Some(root) = &cmd.staging_root {
        options.staging_root = root.clone();
    }
    Publisher::new(desc, dataset, cas, options, Box::new(LogSink))
}

/// Publish / sleep / update, forever. Interruption is honored at the sleep
/// boundary; errors from either lifecycle call terminate the loop.
fn watch(publisher: &mut Publisher, interval: u64, interrupted: &AtomicBool) -> Result<()> {
    loop {
        publisher.publish("folder")?;
        let mut remaining = interval;
        while remaining > 0 && !interrupted.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_secs(1));
            remaining -= 1;
        }
        if interrupted.load(Ordering::SeqCst) {
            info!("Interrupted, stopping watch loop");
            return Ok(());
        }
        publisher.update()?;
    }
}
