//! Markdown renderer
//!
//! Renders a quote's breakdown as a markdown table for admin previews.

use crate::Quote;

/// Display format for numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// Fixed decimal places (default 2)
    Decimal(usize),
    /// Shortest text that reads back to the same value
    Plain,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat::Decimal(2)
    }
}

/// Quote renderer
pub struct Renderer {
    format: NumberFormat,
}

impl Renderer {
    pub fn new() -> Self {
        Self { format: NumberFormat::default() }
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }

    /// Render the breakdown, ending with the total in the quote's currency
    pub fn render(&self, quote: &Quote) -> String {
        let mut output = String::new();
        output.push_str("| label | value |\n");
        output.push_str("|-------|-------|\n");
        for line in &quote.breakdown {
            output.push_str(&format!("| {} | {} |\n", escape_cell(&line.label), self.render_value(line.value)));
        }
        output.push_str(&format!(
            "| **Total** | **{} {}** |\n",
            self.render_value(quote.calculated_price),
            quote.currency
        ));
        if quote.express {
            output.push_str("\n_Express delivery requested_\n");
        }
        output
    }

    fn render_value(&self, value: f64) -> String {
        match self.format {
            NumberFormat::Decimal(places) => format!("{:.*}", places, value),
            NumberFormat::Plain => value.to_string(),
        }
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BreakdownLine;

    fn quote() -> Quote {
        Quote {
            calculated_price: 1500.0,
            breakdown: vec![
                BreakdownLine::new("Base price", 1000.0),
                BreakdownLine::new("Width | cm", 5.0),
            ],
            currency: "USD".to_string(),
            express: false,
        }
    }

    #[test]
    fn test_render_table() {
        let md = Renderer::new().render(&quote());
        assert_eq!(
            md,
            "| label | value |\n\
             |-------|-------|\n\
             | Base price | 1000.00 |\n\
             | Width \\| cm | 5.00 |\n\
             | **Total** | **1500.00 USD** |\n"
        );
    }

    #[test]
    fn test_plain_format_and_express() {
        let mut q = quote();
        q.express = true;
        q.calculated_price = 1499.5;
        let md = Renderer::new().with_format(NumberFormat::Plain).render(&q);
        assert!(md.contains("| Base price | 1000 |"));
        assert!(md.contains("**1499.5 USD**"));
        assert!(md.ends_with("_Express delivery requested_\n"));
    }
}
