use std::io;

use tracing::warn;

pub trait Browser {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// The operator's default browser.
pub struct System;

impl Browser for System {
    fn open(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}

/// Prints the address for the operator to open.
pub struct PrintOnly;

impl Browser for PrintOnly {
    fn open(&self, url: &str) -> io::Result<()> {
        println!("{}", url);
        Ok(())
    }
}

/// Opens the invoice page. A browser that fails to start is not an error,
/// the invoice exists either way.
pub fn show_invoice(browser: &impl Browser, url: &str) {
    if let Err(error) = browser.open(url) {
        warn!("Could not open a browser: {}", error);
        println!("Invoice created: {}", url);
    }
}
