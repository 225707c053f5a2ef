/*
 * Creates a Fakturoid invoice from a delivery spreadsheet
 *
 * - Find the one .xlsx file in the invoice folder
 *   - Create the folder on first use
 * - Read received items, skip rows with nothing received
 * - All items must come from a single delivery date
 * - Ask for invoice number and delivery note number
 * - One zero priced header line per order, then the order's items
 * - Get an OAuth token (client credentials) and post the invoice
 * - Open the new invoice in the browser
 *
 * Settings come from the environment or a .env file:
 *  FAKTUROID_CLIENT_ID, FAKTUROID_CLIENT_SECRET, FAKTUROID_SLUG,
 *  FAKTUROID_API_URL (optional), USER_AGENT, SUBJECT_ID, INVOICE_FOLDER
 */

mod billing;
mod cli;
mod config;
mod error;
mod fakturoid;
mod input;
mod items;
mod locate;
mod present;
mod run;
mod sheet;

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use crate::cli::Opts;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    init_logging();

    let result = run::run_cmd(&opts);
    let pause = Duration::from_secs(opts.pause);
    ExitCode::from(run::report(&result, &mut io::stdout(), pause))
}
