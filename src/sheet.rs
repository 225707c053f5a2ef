use std::fmt;
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::SheetError;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d. %m. %Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
];

#[derive(Debug, PartialEq, Clone)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Error(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    fn to_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(date) => Some(*date),
            Cell::Number(serial) => from_serial(*serial),
            Cell::Text(text) => parse_date(text.trim()),
            _ => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                Cell::Text(s.clone())
            }
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(dt) => Cell::Date(dt.date()),
                None => Cell::Number(dt.as_f64()),
            },
            Data::Error(e) => Cell::Error(e.to_string()),
        }
    }
}

/// Whole numbers print without a fractional part, the way they show up in
/// the spreadsheet.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(text) => write!(f, "{}", text.trim()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Date(date) => write!(f, "{}", date),
            Cell::Error(e) => write!(f, "{}", e),
        }
    }
}

/// Excel counts days from 1899-12-30 (the 1900 leap year bug included).
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .checked_add_days(Days::new(serial.trunc() as u64))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

/// Spreadsheet contents addressed by header name.
#[derive(Debug, PartialEq, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    fn from_range(range: &Range<Data>) -> Self {
        let mut rows = range.rows();
        let columns = rows
            .next()
            .map(|header| {
                header.iter().map(|h| Cell::from(h).to_string()).collect()
            })
            .unwrap_or_default();
        let rows = rows
            .map(|row| row.iter().map(Cell::from).collect::<Vec<_>>())
            .filter(|row| !row.iter().all(Cell::is_empty))
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Result<usize, SheetError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| SheetError::MissingColumn {
                name: name.to_string(),
            })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().enumerate().map(move |(index, cells)| Row {
            table: self,
            index,
            cells,
        })
    }

    /// Replaces every cell of `column` with a [`Cell::Date`].
    pub fn normalize_dates(&mut self, column: &str) -> Result<(), SheetError> {
        let col = self.column(column)?;
        for (index, row) in self.rows.iter_mut().enumerate() {
            let cell = row.get(col).cloned().unwrap_or(Cell::Empty);
            let date = cell.to_date().ok_or_else(|| SheetError::InvalidDate {
                row: sheet_row(index),
                value: cell.to_string(),
            })?;
            if row.len() <= col {
                row.resize(col + 1, Cell::Empty);
            }
            row[col] = Cell::Date(date);
        }
        Ok(())
    }
}

// Data rows start below the header on sheet row 2.
fn sheet_row(index: usize) -> usize {
    index + 2
}

pub struct Row<'a> {
    table: &'a Table,
    index: usize,
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    /// Row number as shown by the spreadsheet application.
    pub fn number(&self) -> usize {
        sheet_row(self.index)
    }

    pub fn get(&self, column: &str) -> Result<&'a Cell, SheetError> {
        const EMPTY: &Cell = &Cell::Empty;
        let col = self.table.column(column)?;
        Ok(self.cells.get(col).unwrap_or(EMPTY))
    }
}

/// Reads the first worksheet of the workbook at `path`, converting
/// `date_column` to dates.
pub fn read_table(path: &Path, date_column: &str) -> Result<Table, SheetError> {
    let open_error = |source| SheetError::Open {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(open_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(open_error)?;

    let mut table = Table::from_range(&range);
    debug!(
        "Read {} rows with columns {:?} from {}",
        table.len(),
        table.columns(),
        path.display()
    );
    table.normalize_dates(date_column)?;
    Ok(table)
}
