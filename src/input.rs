use inquire::{error::InquireError, Text};

use crate::billing::InvoicePayload;
use crate::items::DeliveryBatch;

type InputResult<T> = Result<T, InquireError>;

/// Source of operator answers.
pub trait Prompter {
    fn text(&mut self, message: &str) -> InputResult<String>;
}

/// Asks on the terminal.
pub struct Console;

impl Prompter for Console {
    fn text(&mut self, message: &str) -> InputResult<String> {
        Text::new(message).prompt()
    }
}

fn is_invoice_number(answer: &str) -> bool {
    !answer.is_empty() && answer.chars().all(|c| c.is_ascii_digit())
}

pub fn invoice_number(prompter: &mut impl Prompter) -> InputResult<String> {
    let mut answer = prompter.text("Enter Invoice Number:")?;
    while !is_invoice_number(answer.trim()) {
        answer = prompter.text("Invalid number, try again:")?;
    }
    Ok(answer.trim().to_string())
}

pub fn delivery_note(prompter: &mut impl Prompter) -> InputResult<String> {
    prompter.text("Enter Delivery Note Number:")
}

/// Asks for the invoice number and delivery note and builds the invoice.
pub fn invoice(
    prompter: &mut impl Prompter,
    subject_id: u64,
    batch: &DeliveryBatch,
) -> InputResult<InvoicePayload> {
    let number = invoice_number(prompter)?;
    let note = delivery_note(prompter)?;
    Ok(InvoicePayload::new(number, &note, subject_id, batch))
}
