//! Plain-text reports printed by the menu.

use super::Catalog;

impl Catalog {
    /// Products with `quantity < threshold`, one display line each.
    pub fn low_stock_report(&self, threshold: u32) -> String {
        let low = self.low_stock(threshold);
        if low.is_empty() {
            return format!("No products with stock below {threshold} units.");
        }

        let mut out = format!(
            "LOW STOCK REPORT (below {threshold} units)\n{}\n",
            "=".repeat(60)
        );
        for p in low {
            out.push_str(&format!("{p}\n"));
        }
        out
    }

    pub fn value_report(&self) -> String {
        format!(
            "INVENTORY VALUE REPORT\n{}\nTotal products: {}\nTotal inventory value: ${:.2}\n",
            "=".repeat(40),
            self.len(),
            self.total_value()
        )
    }

    /// Counts, value, price extremes and per-category mean prices.
    pub fn statistics_report(&self) -> String {
        let (Some(most), Some(least)) = (self.most_expensive(), self.cheapest()) else {
            return "The inventory is empty.".to_string();
        };

        let mut out = format!(
            "INVENTORY STATISTICS\n{}\n\
             Total products: {}\n\
             Total inventory value: ${:.2}\n\n\
             MOST EXPENSIVE PRODUCT:\n{most}\n\n\
             CHEAPEST PRODUCT:\n{least}\n\n\
             AVERAGE PRICE BY CATEGORY:\n",
            "=".repeat(40),
            self.len(),
            self.total_value()
        );
        for (category, mean) in self.average_price_by_category() {
            out.push_str(&format!("{category}: ${mean:.2}\n"));
        }
        out
    }
}
