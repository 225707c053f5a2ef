use chrono::NaiveDate;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Environment variable '{key}' is not set. Check your .env file."
    )]
    Missing { key: &'static str },

    #[error("Environment variable '{key}' has an invalid value: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum LocateError {
    /// The invoice folder did not exist and has just been created. Not a
    /// failure as such; the operator has to put a spreadsheet in it.
    #[error(
        "Path created: {}. Please place the file and rerun the program.",
        path.display()
    )]
    FolderCreated { path: PathBuf },

    #[error("Valid file not found in {}", dir.display())]
    NotFound { dir: PathBuf },

    #[error("IO Error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Cannot read {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: calamine::XlsxError,
    },

    #[error("{} contains no worksheet", path.display())]
    NoWorksheet { path: PathBuf },

    #[error("Column '{name}' not found")]
    MissingColumn { name: String },

    #[error("Row {row}: '{value}' is not a valid date")]
    InvalidDate { row: usize, value: String },
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("The Excel file is empty.")]
    EmptySheet,

    #[error("The Excel file contains no items with a positive quantity.")]
    NoBillableItems,

    #[error(
        "The file contains items from different delivery dates ({}). \
         Please fix the file.",
        format_dates(dates)
    )]
    MixedDeliveryDates { dates: Vec<NaiveDate> },

    #[error("Row {row}: invalid {column} '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("{source}")]
    Sheet {
        #[from]
        source: SheetError,
    },
}

fn format_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(NaiveDate::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
