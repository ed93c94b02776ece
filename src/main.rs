//! # Inventory Menu
//!
//! Numbered text menu over the [`Catalog`] API. Every action maps to one catalog
//! operation; this file only prompts, validates input and prints.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use inventory_tracker::catalog::{AnalysisThresholds, Catalog};
use inventory_tracker::config::InventoryConfig;
use inventory_tracker::framework::StoreState;
use inventory_tracker::input::InputPolicy;
use inventory_tracker::lifecycle::setup_tracing;
use inventory_tracker::model::Product;
use inventory_tracker::InventoryError;
use tracing::{info, warn};

const RULE: &str = "============================================================";

fn main() -> Result<(), String> {
    setup_tracing();

    let config = InventoryConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Configuration not loaded, using defaults");
        InventoryConfig::default()
    });
    info!(data_dir = %config.data_dir.display(), "Starting inventory menu");

    let catalog = Catalog::with_config(&config);
    if catalog.state() == StoreState::Unavailable {
        println!("Warning: the saved inventory could not be read. Starting with an empty inventory.");
    }

    let stdin = io::stdin();
    let mut menu = Menu {
        catalog,
        policy: InputPolicy::from_config(&config),
        low_stock_threshold: config.low_stock_threshold,
        input: stdin.lock(),
    };
    menu.run().map_err(|e| e.to_string())
}

/// Outcome of one prompt: a value, or end of input.
type Answer<T> = io::Result<Option<T>>;

struct Menu<R> {
    catalog: Catalog,
    policy: InputPolicy,
    low_stock_threshold: u32,
    input: R,
}

impl<R: BufRead> Menu<R> {
    fn run(&mut self) -> io::Result<()> {
        loop {
            print_menu();
            let Some(choice) = self.prompt_parse::<u32>("\nSelect an option: ")? else {
                break;
            };
            let carry_on = match choice {
                0 => false,
                1 => self.add_product()?,
                2 => self.remove_product()?,
                3 => self.update_stock()?,
                4 => self.update_price()?,
                5 => self.search_by_name()?,
                6 => self.search_by_category()?,
                7 => self.list_all(),
                8 => self.show(self.catalog.low_stock_report(self.low_stock_threshold)),
                9 => self.show(self.catalog.value_report()),
                10 => self.show(self.catalog.statistics_report()),
                11 => self.configure_threshold()?,
                12 => self.full_analysis(),
                13 => self.tiered_valuation()?,
                _ => {
                    println!("Invalid option. Choose a number from 0 to 13.");
                    true
                }
            };
            if !carry_on {
                break;
            }
        }
        println!("\nGoodbye.");
        Ok(())
    }

    // --- Actions. Each returns Ok(false) when input has ended. ---

    fn add_product(&mut self) -> io::Result<bool> {
        println!("\n--- ADD PRODUCT ---");
        let Some(id) = self.prompt_text("Product ID: ", "Product ID")? else {
            return Ok(false);
        };
        if self.catalog.get(&id).is_some() {
            println!("Error: a product with ID '{id}' already exists.");
            return Ok(true);
        }
        let Some(name) = self.prompt_text("Name: ", "Name")? else {
            return Ok(false);
        };
        let Some(category) = self.prompt_text("Category: ", "Category")? else {
            return Ok(false);
        };
        let Some(price) = self.prompt_parse::<f64>("Price: $")? else {
            return Ok(false);
        };
        let Some(quantity) = self.prompt_quantity("Quantity in stock: ")? else {
            return Ok(false);
        };

        match Product::new(id, name.clone(), category, price, quantity)
            .and_then(|p| self.catalog.add(p))
        {
            Ok(true) => println!("\n✓ Product '{name}' added."),
            Ok(false) => println!("\n✗ A product with that ID already exists."),
            Err(e) => report(&e),
        }
        Ok(true)
    }

    fn remove_product(&mut self) -> io::Result<bool> {
        println!("\n--- REMOVE PRODUCT ---");
        let Some(id) = self.prompt_text("Product ID to remove: ", "Product ID")? else {
            return Ok(false);
        };
        let Some(product) = self.catalog.get(&id) else {
            println!("Error: no product with ID '{id}'.");
            return Ok(true);
        };
        println!("\nFound: {product}");

        let Some(confirm) = self.prompt_line("\nRemove this product? (y/n): ")? else {
            return Ok(false);
        };
        if !matches!(confirm.to_lowercase().as_str(), "y" | "yes") {
            println!("Cancelled.");
            return Ok(true);
        }
        match self.catalog.remove(&id) {
            Ok(true) => println!("\n✓ Product '{id}' removed."),
            Ok(false) => println!("\n✗ Product '{id}' no longer exists."),
            Err(e) => report(&e),
        }
        Ok(true)
    }

    fn update_stock(&mut self) -> io::Result<bool> {
        println!("\n--- UPDATE STOCK ---");
        let Some(id) = self.prompt_text("Product ID: ", "Product ID")? else {
            return Ok(false);
        };
        let Some(product) = self.catalog.get(&id) else {
            println!("Error: no product with ID '{id}'.");
            return Ok(true);
        };
        println!("\nCurrent: {product}");
        let label = format!("New quantity (current: {}): ", product.quantity());

        let Some(quantity) = self.prompt_quantity(&label)? else {
            return Ok(false);
        };
        match self.catalog.update_stock(&id, quantity) {
            Ok(true) => println!("\n✓ Stock set to {quantity} units."),
            Ok(false) => println!("\n✗ Product '{id}' no longer exists."),
            Err(e) => report(&e),
        }
        Ok(true)
    }

    fn update_price(&mut self) -> io::Result<bool> {
        println!("\n--- UPDATE PRICE ---");
        let Some(id) = self.prompt_text("Product ID: ", "Product ID")? else {
            return Ok(false);
        };
        let Some(product) = self.catalog.get(&id) else {
            println!("Error: no product with ID '{id}'.");
            return Ok(true);
        };
        println!("\nCurrent: {product}");
        let label = format!("New price (current: ${:.2}): $", product.price());

        let Some(price) = self.prompt_parse::<f64>(&label)? else {
            return Ok(false);
        };
        match self.catalog.update_price(&id, price) {
            Ok(true) => println!("\n✓ Price set to ${price:.2}."),
            Ok(false) => println!("\n✗ Product '{id}' no longer exists."),
            Err(e) => report(&e),
        }
        Ok(true)
    }

    fn search_by_name(&mut self) -> io::Result<bool> {
        println!("\n--- SEARCH BY NAME ---");
        let Some(needle) = self.prompt_text("Name or part of it: ", "Search text")? else {
            return Ok(false);
        };
        print_products(&self.catalog.find_by_name(&needle), &needle);
        Ok(true)
    }

    fn search_by_category(&mut self) -> io::Result<bool> {
        println!("\n--- SEARCH BY CATEGORY ---");
        let Some(needle) = self.prompt_text("Category or part of it: ", "Search text")? else {
            return Ok(false);
        };
        print_products(&self.catalog.find_by_category(&needle), &needle);
        Ok(true)
    }

    fn list_all(&self) -> bool {
        println!("\n--- ALL PRODUCTS ---");
        let all = self.catalog.all();
        if all.is_empty() {
            println!("The inventory is empty.");
            return true;
        }
        println!("Total products: {}", all.len());
        println!("{}", "-".repeat(80));
        for p in all {
            println!("{p}");
        }
        true
    }

    fn configure_threshold(&mut self) -> io::Result<bool> {
        println!("\n--- LOW STOCK THRESHOLD ---");
        println!("Current threshold: {}", self.low_stock_threshold);
        let Some(threshold) = self.prompt_quantity("New threshold: ")? else {
            return Ok(false);
        };
        self.low_stock_threshold = threshold;
        println!("\n✓ Low stock threshold set to {threshold}.");
        Ok(true)
    }

    fn full_analysis(&self) -> bool {
        println!("\n--- FULL ANALYSIS ---");
        let thresholds = AnalysisThresholds {
            low_stock: self.low_stock_threshold,
            ..AnalysisThresholds::default()
        };
        let thresholds = if thresholds.validate().is_ok() {
            thresholds
        } else {
            AnalysisThresholds::default()
        };
        match self.catalog.full_analysis(&thresholds) {
            Ok(report) => match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => println!("Error: the report could not be rendered ({e})."),
            },
            Err(e) => report(&e),
        }
        true
    }

    fn tiered_valuation(&mut self) -> io::Result<bool> {
        println!("\n--- TIERED VALUATION ---");
        let Some(threshold) = self.prompt_parse::<f64>("Price threshold: $")? else {
            return Ok(false);
        };
        let Some(above) = self.prompt_parse::<f64>("Factor above the threshold: ")? else {
            return Ok(false);
        };
        let Some(below) = self.prompt_parse::<f64>("Factor at or below the threshold: ")? else {
            return Ok(false);
        };
        match self.catalog.value_with_tiered_pricing(threshold, above, below) {
            Ok(value) => println!("\nTiered value: ${value:.2}"),
            Err(e) => report(&e),
        }
        Ok(true)
    }

    fn show(&self, text: String) -> bool {
        println!("\n{text}");
        true
    }

    // --- Prompts ---

    /// Reads one trimmed line. `None` at end of input.
    fn prompt_line(&mut self, label: &str) -> Answer<String> {
        print!("{label}");
        io::stdout().flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Re-prompts until the text passes the input policy.
    fn prompt_text(&mut self, label: &str, field: &str) -> Answer<String> {
        loop {
            let Some(line) = self.prompt_line(label)? else {
                return Ok(None);
            };
            match self.policy.check(field, &line) {
                Ok(text) => return Ok(Some(text.to_string())),
                Err(e) => report(&e),
            }
        }
    }

    /// Re-prompts until the line parses as `T`.
    fn prompt_parse<T: FromStr>(&mut self, label: &str) -> Answer<T> {
        loop {
            let Some(line) = self.prompt_line(label)? else {
                return Ok(None);
            };
            if !self.policy.is_safe(&line) {
                println!("Error: the input contains characters that are not allowed.");
                continue;
            }
            match line.parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => println!("Error: please enter a valid value."),
            }
        }
    }

    /// Re-prompts until the line is a non-negative whole number.
    fn prompt_quantity(&mut self, label: &str) -> Answer<u32> {
        loop {
            let Some(amount) = self.prompt_parse::<i64>(label)? else {
                return Ok(None);
            };
            match Product::quantity_from(amount) {
                Ok(quantity) => return Ok(Some(quantity)),
                Err(e) => report(&e),
            }
        }
    }
}

fn print_menu() {
    println!("\n{RULE}");
    println!("                 INVENTORY MANAGEMENT");
    println!("{RULE}");
    for line in [
        "1. Add product",
        "2. Remove product",
        "3. Update product stock",
        "4. Update product price",
        "5. Search products by name",
        "6. Search products by category",
        "7. List all products",
        "8. Low stock report",
        "9. Inventory value report",
        "10. Inventory statistics",
        "11. Configure low stock threshold",
        "12. Full analysis",
        "13. Tiered valuation",
        "0. Exit",
    ] {
        println!("{line}");
    }
    println!("{RULE}");
}

fn print_products(products: &[&Product], needle: &str) {
    if products.is_empty() {
        println!("\nNo products match '{needle}'.");
        return;
    }
    println!("\nProducts found ({}):", products.len());
    println!("{}", "-".repeat(80));
    for p in products {
        println!("{p}");
    }
}

/// Prints a user-facing error. Storage details stay in the log.
fn report(err: &InventoryError) {
    match err {
        InventoryError::Storage(e) => {
            warn!(error = %e, "Save failed");
            println!("\n✗ The change could not be saved; the inventory is unchanged.");
        }
        other => println!("Error: {other}"),
    }
}
