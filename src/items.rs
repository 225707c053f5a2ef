use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::sheet::{Cell, Row, Table};

pub const ORDER_NUMBER: &str = "Potvrzená objednávka";
pub const DELIVERY_DATE: &str = "Datum návozu";
pub const PRODUCT_CODE: &str = "Číslo produktu";
pub const PRODUCT_NAME: &str = "Název produktu";
pub const RECEIVED_QUANTITY: &str = "Přijaté množství";
pub const PRICE: &str = "Cena";

#[derive(Debug, PartialEq, Clone)]
pub struct LineItem {
    pub order_number: String,
    pub delivery_date: NaiveDate,
    pub name: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} x {} @ {}", self.quantity, self.name, self.price)
    }
}

/// Billable items of a single delivery, in spreadsheet order.
#[derive(Debug, PartialEq, Clone)]
pub struct DeliveryBatch {
    pub delivery_date: NaiveDate,
    pub items: Vec<LineItem>,
}

fn invalid(row: &Row, column: &'static str, cell: &Cell) -> ExtractError {
    ExtractError::InvalidValue {
        row: row.number(),
        column,
        value: cell.to_string(),
    }
}

fn text(row: &Row, column: &'static str) -> Result<String, ExtractError> {
    let cell = row.get(column)?;
    match cell {
        Cell::Text(_) | Cell::Number(_) if !cell.is_empty() => {
            Ok(cell.to_string())
        }
        _ => Err(invalid(row, column, cell)),
    }
}

fn decimal(row: &Row, column: &'static str) -> Result<Decimal, ExtractError> {
    let cell = row.get(column)?;
    let value = match cell {
        // Keep the exact binary value so 2.675 rounds down like the float.
        Cell::Number(n) => Decimal::from_f64_retain(*n),
        Cell::Text(s) => Decimal::from_str(&s.trim().replace(',', ".")).ok(),
        _ => None,
    };
    value.ok_or_else(|| invalid(row, column, cell))
}

/// Builds the item for `row`, or `None` when nothing was received. Other
/// cells of skipped rows are not looked at.
fn item(row: &Row) -> Result<Option<LineItem>, ExtractError> {
    let quantity = decimal(row, RECEIVED_QUANTITY)?;
    if quantity <= Decimal::ZERO {
        debug!("Skipping row {}: quantity {}", row.number(), quantity);
        return Ok(None);
    }
    if !quantity.fract().is_zero() {
        let cell = row.get(RECEIVED_QUANTITY)?;
        return Err(invalid(row, RECEIVED_QUANTITY, cell));
    }

    let delivery_date = match row.get(DELIVERY_DATE)? {
        Cell::Date(date) => *date,
        other => return Err(invalid(row, DELIVERY_DATE, other)),
    };

    let price = decimal(row, PRICE)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);

    Ok(Some(LineItem {
        order_number: text(row, ORDER_NUMBER)?,
        delivery_date,
        name: format!(
            "{} - {}",
            text(row, PRODUCT_CODE)?,
            text(row, PRODUCT_NAME)?
        ),
        quantity: quantity.trunc().normalize(),
        price: with_cents(price),
    }))
}

// Always two fraction digits, 12.5 becomes 12.50.
fn with_cents(mut amount: Decimal) -> Decimal {
    amount.rescale(2);
    amount
}

/// Turns spreadsheet rows into invoice items, skipping rows with nothing
/// received. Every remaining item has to come from the same delivery date.
pub fn extract_items(table: &Table) -> Result<DeliveryBatch, ExtractError> {
    if table.is_empty() {
        return Err(ExtractError::EmptySheet);
    }

    let mut items = Vec::new();
    for row in table.rows() {
        if let Some(item) = item(&row)? {
            debug!("Row {}: {}", row.number(), item);
            items.push(item);
        }
    }

    let mut dates: Vec<NaiveDate> =
        items.iter().map(|item| item.delivery_date).collect();
    dates.sort();
    dates.dedup();

    match dates.as_slice() {
        [] => Err(ExtractError::NoBillableItems),
        [delivery_date] => Ok(DeliveryBatch {
            delivery_date: *delivery_date,
            items,
        }),
        _ => {
            warn!("Items from {} delivery dates", dates.len());
            Err(ExtractError::MixedDeliveryDates { dates })
        }
    }
}
