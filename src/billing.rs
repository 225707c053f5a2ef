use std::fmt;

use chrono::NaiveDate;
use const_format::concatcp;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;
use strum_macros::Display;

use crate::items::{DeliveryBatch, LineItem};

pub const ORDER_NOTE: &str = "Invoicing based on order:";
const DELIVERY_NOTE_SUFFIX: &str = concatcp!(" \n", ORDER_NOTE);
// The leading newline puts a blank line above each order on the invoice.
const ORDER_HEADER: &str = "\nOrder No.";

#[derive(Display, Serialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum VatRate {
    #[strum(serialize = "0 %")]
    #[serde(rename = "0")]
    Zero,
    #[strum(serialize = "21 %")]
    #[serde(rename = "21")]
    Standard,
}

#[derive(Serialize, Debug, PartialEq, Clone)]
pub struct InvoiceLine {
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    pub vat_rate: VatRate,
}

impl InvoiceLine {
    /// Zero priced line introducing the items of one order.
    pub fn order_header(order_number: &str) -> Self {
        Self {
            name: format!("{} {}", ORDER_HEADER, order_number),
            quantity: Decimal::ONE,
            unit_price: Decimal::ZERO,
            vat_rate: VatRate::Zero,
        }
    }

    pub fn item(item: &LineItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.price,
            vat_rate: VatRate::Standard,
        }
    }

    pub fn is_header(&self) -> bool {
        self.vat_rate == VatRate::Zero && self.unit_price.is_zero()
    }

    pub fn amount(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

impl fmt::Display for InvoiceLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_header() {
            write!(f, "{}", self.name.trim())
        } else {
            write!(
                f,
                "  {} x {} @ {} (VAT {}): {:.2}",
                self.quantity,
                self.name,
                self.unit_price,
                self.vat_rate,
                self.amount()
            )
        }
    }
}

/// Body of the invoice creation request.
#[derive(Serialize, Debug, PartialEq, Clone)]
pub struct InvoicePayload {
    pub number: String,
    pub note: String,
    pub subject_id: u64,
    pub issued_on: NaiveDate,
    pub lines: Vec<InvoiceLine>,
}

impl InvoicePayload {
    pub fn new(
        number: String,
        delivery_note: &str,
        subject_id: u64,
        batch: &DeliveryBatch,
    ) -> Self {
        let mut lines = Vec::new();
        for (order_number, items) in group_by_order(&batch.items) {
            lines.push(InvoiceLine::order_header(order_number));
            lines.extend(items.into_iter().map(InvoiceLine::item));
        }

        Self {
            number,
            note: note(delivery_note),
            subject_id,
            issued_on: batch.delivery_date,
            lines,
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(InvoiceLine::amount).sum()
    }
}

impl fmt::Display for InvoicePayload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Invoice: #{}\n\
             Issued: {}\n\
             Subject: {}\n\n",
            self.number, self.issued_on, self.subject_id
        )?;
        writeln!(f, "{}", self.note)?;

        for line in self.lines.iter() {
            writeln!(f, "{}", line)?;
        }

        write!(f, "\nSubtotal: {:.2}", self.subtotal())
    }
}

pub fn note(delivery_note: &str) -> String {
    let delivery_note = delivery_note.trim();
    if delivery_note.is_empty() {
        ORDER_NOTE.to_string()
    } else {
        format!("Delivery Note No. {}{}", delivery_note, DELIVERY_NOTE_SUFFIX)
    }
}

/// Items keyed by order number, orders in the order they first appear.
pub fn group_by_order(items: &[LineItem]) -> IndexMap<&str, Vec<&LineItem>> {
    let mut groups: IndexMap<&str, Vec<&LineItem>> = IndexMap::new();
    for item in items {
        groups.entry(item.order_number.as_str()).or_default().push(item);
    }
    groups
}
