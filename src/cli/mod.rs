pub mod accounts;
pub mod init;
pub mod process;
pub mod register;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "taxdoc",
    about = "Ingests financial statements and extracts classified transactions for tax preparation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up taxdoc: choose a data directory and initialize the database.
    Init {
        /// Path for taxdoc data (default: platform data dir)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Register an uploaded statement file as a pending document.
    Register {
        /// Path to the PDF/CSV/XLSX statement file
        file: String,
        /// Account name the statement belongs to
        #[arg(long)]
        account: String,
        /// Document type, e.g. bank_statement, receipt, invoice
        #[arg(long = "doc-type", default_value = "bank_statement")]
        doc_type: String,
    },
    /// Process a registered document: extract, classify and persist transactions.
    Process {
        /// Document id returned by `register`
        document_id: i64,
    },
    /// Show a document's processing status.
    Status {
        /// Document id
        document_id: i64,
    },
    /// List transactions extracted from a document.
    Transactions {
        /// Document id
        #[arg(long)]
        document: i64,
    },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'GTB Current'
        name: String,
    },
    /// List all accounts.
    List,
}
