mod cli;
mod document;
mod markdown;
mod skip_list;
mod template;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    localizer_logging::initialize(cli.log_level(), cli.log_file.as_deref());

    if let Err(err) = cli::run(cli).await {
        eprintln!("localize-images error: {:#}", err);
        std::process::exit(1);
    }
}
