//! Display sink for classified price changes

use crate::error::DisplayError;
use crate::types::Classification;
use crossterm::style::Stylize;
use std::io::Write;

/// Renders one classified change event
pub trait DisplaySink: Send {
    /// Render a change. A `Suppressed` classification is rejected, never dropped silently.
    fn display(
        &mut self,
        asset_id: &str,
        classification: Classification,
        current_price: f64,
        percent_change: f64,
    ) -> Result<(), DisplayError>;
}

/// Colored line-per-event console output
pub struct ConsoleDisplay<W: Write + Send> {
    out: W,
    currency: String,
    colored: bool,
}

impl<W: Write + Send> ConsoleDisplay<W> {
    pub fn with_writer(out: W, currency: &str, colored: bool) -> Self {
        let currency = if currency.is_empty() {
            "USD".to_string()
        } else {
            currency.to_string()
        };
        Self {
            out,
            currency,
            colored,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// `"{asset}: {price} {CURRENCY} - ({pct}%)"`
pub fn format_change(asset_id: &str, current_price: f64, percent_change: f64, currency: &str) -> String {
    format!(
        "{}: {:.2} {} - ({:.2}%)",
        asset_id, current_price, currency, percent_change
    )
}

impl<W: Write + Send> DisplaySink for ConsoleDisplay<W> {
    fn display(
        &mut self,
        asset_id: &str,
        classification: Classification,
        current_price: f64,
        percent_change: f64,
    ) -> Result<(), DisplayError> {
        let line = format_change(asset_id, current_price, percent_change, &self.currency);

        match (classification, self.colored) {
            (Classification::Suppressed, _) => {
                return Err(DisplayError::Unreportable(classification));
            }
            (Classification::Up, true) => writeln!(self.out, "{}", line.green())?,
            (Classification::Down, true) => writeln!(self.out, "{}", line.red())?,
            (_, false) => writeln!(self.out, "{}", line)?,
        }
        self.out.flush()?;
        Ok(())
    }
}
