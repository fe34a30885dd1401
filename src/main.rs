mod classifier;
mod cli;
mod db;
mod dedup;
mod error;
mod extractor;
mod models;
mod normalize;
mod notifier;
mod pipeline;
mod settings;

use clap::Parser;
use colored::Colorize;

use cli::{AccountsCommands, Cli, Commands};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add { name } => cli::accounts::add(&name),
            AccountsCommands::List => cli::accounts::list(),
        },
        Commands::Register {
            file,
            account,
            doc_type,
        } => cli::register::run(&file, &account, &doc_type),
        Commands::Process { document_id } => cli::process::run(document_id),
        Commands::Status { document_id } => cli::status::run(document_id),
        Commands::Transactions { document } => cli::transactions::list(document),
    };

    if let Err(e) = result {
        eprintln!("{} {e}", "Error:".red());
        std::process::exit(1);
    }
}
