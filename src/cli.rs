use clap::{Parser, ValueHint};
use std::path::PathBuf;

/* Argument Structure
 *
 * [--env-file <path>] [--pause <secs>] [--no-browser] [--dry-run]
 *
 * Everything else is read from the environment and asked interactively.
 */

#[derive(Parser)]
#[clap(
    version,
    about = "Create a Fakturoid invoice from a delivery spreadsheet"
)]
pub struct Opts {
    /// File with KEY=value settings loaded into the environment
    #[clap(long, default_value = ".env", value_hint = ValueHint::FilePath)]
    pub env_file: PathBuf,

    /// Seconds to wait before exiting after an error
    #[clap(long, default_value_t = 10)]
    pub pause: u64,

    /// Print the invoice address instead of opening a browser
    #[clap(long)]
    pub no_browser: bool,

    /// Print the invoice JSON instead of sending it
    #[clap(long)]
    pub dry_run: bool,
}
