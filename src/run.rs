use crate::billing::InvoicePayload;
use crate::cli::Opts;
use crate::config::Config;
use crate::error::{ConfigError, ExtractError, LocateError, SheetError};
use crate::fakturoid::{ApiError, Fakturoid};
use crate::input::{self, Console, Prompter};
use crate::items::{self, DELIVERY_DATE};
use crate::locate;
use crate::present::{self, Browser, PrintOnly, System};
use crate::sheet;

use std::io::Write;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("File read error: {source}")]
    Locate {
        #[from]
        source: LocateError,
    },

    #[error("File read error: {source}")]
    Sheet {
        #[from]
        source: SheetError,
    },

    #[error("Data extraction error: {source}")]
    Extract {
        #[from]
        source: ExtractError,
    },

    #[error("Failed to create invoice data: {source}")]
    Input {
        #[from]
        source: inquire::error::InquireError,
    },

    #[error("Failed to send invoice: {source}")]
    Api {
        #[from]
        source: ApiError,
    },

    #[error("Error encoding invoice: {source}")]
    Format {
        #[from]
        source: serde_json::Error,
    },
}

impl RunError {
    /// The invoice folder was just set up; the operator needs to fill it
    /// rather than fix anything.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            RunError::Locate {
                source: LocateError::FolderCreated { .. }
            }
        )
    }
}

pub fn run_cmd(opts: &Opts) -> Result<(), RunError> {
    let config = Config::from_env_file(&opts.env_file)?;
    info!("Loaded {:?}", config);
    let mut console = Console;

    if opts.dry_run {
        let payload = prepare(&config, &mut console)?;
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if opts.no_browser {
        run(&config, &mut console, &PrintOnly)?;
    } else {
        run(&config, &mut console, &System)?;
    }
    Ok(())
}

/// Prints the outcome of [`run_cmd`] for the operator and returns the
/// process exit status. Failures wait `pause` before returning so the
/// message stays readable when started from a file manager.
pub fn report(
    result: &Result<(), RunError>,
    out: &mut impl Write,
    pause: Duration,
) -> u8 {
    let Err(err) = result else {
        return 0;
    };
    if err.is_setup() {
        info!("Invoice folder set up, nothing to invoice yet");
    } else {
        error!("{:?}", err);
    }
    if let Err(write_error) = writeln!(out, "ERROR: {}", err) {
        error!("Could not print error: {}", write_error);
    }
    let _ = out.flush();
    thread::sleep(pause);
    1
}

/// Reads the spreadsheet and asks the operator for what it lacks.
pub fn prepare(
    config: &Config,
    prompter: &mut impl Prompter,
) -> Result<InvoicePayload, RunError> {
    let path = locate::find_spreadsheet(&config.invoice_folder)?;
    let table = sheet::read_table(&path, DELIVERY_DATE)?;
    let batch = items::extract_items(&table)?;
    info!(
        "{} of {} rows to invoice, delivered {}",
        batch.items.len(),
        table.len(),
        batch.delivery_date
    );

    Ok(input::invoice(prompter, config.subject_id, &batch)?)
}

/// Sends the invoice and shows it; returns the new invoice id.
pub fn submit(
    config: &Config,
    payload: &InvoicePayload,
    browser: &impl Browser,
) -> Result<u64, RunError> {
    let id = Fakturoid::new(config)?.submit(payload)?;
    present::show_invoice(browser, &config.invoice_page_url(id));
    Ok(id)
}

pub fn run(
    config: &Config,
    prompter: &mut impl Prompter,
    browser: &impl Browser,
) -> Result<u64, RunError> {
    let payload = prepare(config, prompter)?;
    println!("\nSending invoice:\n\n{}\n", payload);
    submit(config, &payload, browser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::config;
    use crate::fakturoid::tests::token_mock;
    use crate::input::tests::Scripted;
    use crate::items::tests::{row, ymd, HEADER};
    use crate::present::tests::Recording;
    use crate::sheet::tests::write_workbook;
    use crate::sheet::Cell;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Instant;
    use tempfile::TempDir;

    fn delivery(dir: &TempDir, rows: &[Vec<Cell>]) {
        write_workbook(&dir.path().join("delivery.xlsx"), &HEADER, rows);
    }

    fn three_rows() -> Vec<Vec<Cell>> {
        let day = ymd(2024, 3, 4);
        vec![
            row("4500001", day, "P-1", 3.0, 12.5),
            row("4500001", day, "P-2", 0.0, 99.0),
            row("4500001", day, "P-3", 1.0, 7.25),
        ]
    }

    #[test]
    fn creates_and_opens_invoice() {
        let dir = TempDir::new().unwrap();
        delivery(&dir, &three_rows());
        let mut server = Server::new();
        let config = config(&server.url(), dir.path());
        let _token = token_mock(&mut server, 200);
        let invoice = server
            .mock("POST", "/accounts/acme/invoices.json")
            .match_header("authorization", "Bearer t0ken")
            .match_body(Matcher::Json(json!({
                "number": "2024001",
                "note": "Delivery Note No. 77 \nInvoicing based on order:",
                "subject_id": 1234,
                "issued_on": "2024-03-04",
                "lines": [
                    {
                        "name": "\nOrder No. 4500001",
                        "quantity": "1",
                        "unit_price": "0",
                        "vat_rate": "0"
                    },
                    {
                        "name": "P-1 - Product P-1",
                        "quantity": "3",
                        "unit_price": "12.50",
                        "vat_rate": "21"
                    },
                    {
                        "name": "P-3 - Product P-3",
                        "quantity": "1",
                        "unit_price": "7.25",
                        "vat_rate": "21"
                    }
                ]
            })))
            .with_status(201)
            .with_body(r#"{"id":42}"#)
            .create();
        let mut prompter = Scripted::new(&["INV", "2024001", "77"]);
        let browser = Recording::default();

        let id = run(&config, &mut prompter, &browser).unwrap();

        assert_eq!(id, 42);
        invoice.assert();
        assert_eq!(
            *browser.opened.borrow(),
            [format!("{}/acme/invoices/42", server.url())]
        );
    }

    #[test]
    fn rejected_invoice_reports_body() {
        let dir = TempDir::new().unwrap();
        delivery(&dir, &three_rows());
        let mut server = Server::new();
        let config = config(&server.url(), dir.path());
        let _token = token_mock(&mut server, 200);
        let _invoice = server
            .mock("POST", "/accounts/acme/invoices.json")
            .with_status(422)
            .with_body(r#"{"errors":{"number":["is already taken"]}}"#)
            .create();
        let mut prompter = Scripted::new(&["2024001", ""]);
        let browser = Recording::default();

        let error = run(&config, &mut prompter, &browser).unwrap_err();

        assert!(error.to_string().starts_with("Failed to send invoice: "));
        assert!(error
            .to_string()
            .contains(r#"{"errors":{"number":["is already taken"]}}"#));
        assert!(browser.opened.borrow().is_empty());
    }

    #[test]
    fn new_folder_asks_for_file() {
        let dir = TempDir::new().unwrap();
        let config = config("http://127.0.0.1:9", &dir.path().join("inbox"));
        let mut prompter = Scripted::new(&[]);

        let error = run(&config, &mut prompter, &Recording::default())
            .unwrap_err();

        assert!(error.is_setup());
        assert!(error.to_string().starts_with("File read error: Path created"));
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn mixed_dates_stop_before_prompting() {
        let dir = TempDir::new().unwrap();
        delivery(
            &dir,
            &[
                row("A", ymd(2024, 3, 4), "P-1", 1.0, 1.0),
                row("A", ymd(2024, 3, 5), "P-2", 1.0, 1.0),
            ],
        );
        let config = config("http://127.0.0.1:9", dir.path());
        let mut prompter = Scripted::new(&[]);

        let error = prepare(&config, &mut prompter).unwrap_err();

        assert!(!error.is_setup());
        assert!(matches!(
            error,
            RunError::Extract {
                source: ExtractError::MixedDeliveryDates { .. }
            }
        ));
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn renamed_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut header = HEADER;
        header[5] = "Price";
        write_workbook(
            &dir.path().join("delivery.xlsx"),
            &header,
            &three_rows(),
        );
        let config = config("http://127.0.0.1:9", dir.path());

        let error = prepare(&config, &mut Scripted::new(&[])).unwrap_err();

        assert_eq!(
            error.to_string(),
            "Data extraction error: Column 'Cena' not found"
        );
    }

    #[test]
    fn failure_prints_error_and_exits_1() {
        let result = Err(RunError::from(ExtractError::EmptySheet));
        let mut out = Vec::new();
        let started = Instant::now();

        let status = report(&result, &mut out, Duration::from_millis(50));

        assert_eq!(status, 1);
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ERROR: Data extraction error: The Excel file is empty.\n"
        );
    }

    #[test]
    fn new_folder_still_exits_1() {
        let dir = TempDir::new().unwrap();
        let inbox = dir.path().join("inbox");
        let result = locate::find_spreadsheet(&inbox)
            .map(|_| ())
            .map_err(RunError::from);
        let mut out = Vec::new();

        let status = report(&result, &mut out, Duration::ZERO);

        assert_eq!(status, 1);
        assert!(String::from_utf8(out)
            .unwrap()
            .starts_with("ERROR: File read error: Path created"));
    }

    #[test]
    fn success_prints_nothing() {
        let mut out = Vec::new();

        let status = report(&Ok(()), &mut out, Duration::from_secs(60));

        assert_eq!(status, 0);
        assert!(out.is_empty());
    }
}
