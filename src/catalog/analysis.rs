//! Full inventory analysis.
//!
//! [`Catalog::full_analysis`] is the single entry point for every aggregate the
//! menu can print at once: per-category price statistics, stock and price tiers,
//! the price distribution, and a list of plain-language recommendations.

use std::collections::BTreeMap;

use serde::Serialize;

use super::Catalog;
use crate::error::InventoryError;
use crate::model::Product;

/// Tier boundaries for [`Catalog::full_analysis`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisThresholds {
    /// Prices strictly above this are "special".
    pub high_price: f64,
    /// Prices strictly below this are "economical".
    pub low_price: f64,
    /// Quantities strictly below this are "low" stock.
    pub low_stock: u32,
    /// Quantities strictly above this are "high" stock.
    pub high_stock: u32,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            high_price: 100.0,
            low_price: 20.0,
            low_stock: super::DEFAULT_LOW_STOCK_THRESHOLD,
            high_stock: 100,
        }
    }
}

impl AnalysisThresholds {
    pub fn validate(&self) -> Result<(), InventoryError> {
        for (name, value) in [("high price", self.high_price), ("low price", self.low_price)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(InventoryError::validation(format!(
                    "{name} threshold must be positive"
                )));
            }
        }
        if self.low_price > self.high_price {
            return Err(InventoryError::validation(
                "low price threshold cannot exceed the high price threshold",
            ));
        }
        if self.high_stock == 0 {
            return Err(InventoryError::validation(
                "high stock threshold must be positive",
            ));
        }
        if self.low_stock > self.high_stock {
            return Err(InventoryError::validation(
                "low stock threshold cannot exceed the high stock threshold",
            ));
        }
        Ok(())
    }

    fn stock_tier(&self, quantity: u32) -> StockTier {
        if quantity < self.low_stock {
            StockTier::Low
        } else if quantity > self.high_stock {
            StockTier::High
        } else {
            StockTier::Medium
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StockTier {
    Low,
    Medium,
    High,
}

/// Result of [`Catalog::full_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub summary: Summary,
    pub categories: BTreeMap<String, CategoryStats>,
    pub stock_tiers: BTreeMap<String, StockTierCounts>,
    pub price_tiers: PriceTiers,
    /// Absent when the catalog is empty.
    pub price_distribution: Option<PriceDistribution>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_products: usize,
    pub total_units: u64,
    pub total_value: f64,
    pub category_count: usize,
}

/// Price statistics for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub count: usize,
    pub mean_price: f64,
    pub max_price: f64,
    pub min_price: f64,
    /// Population standard deviation of the prices.
    pub std_dev: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StockTierCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// Product ids by price tier, each list ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceTiers {
    pub special: Vec<String>,
    pub normal: Vec<String>,
    pub economical: Vec<String>,
}

/// Distribution of prices across the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceDistribution {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    /// `std_dev / mean`, or 0 when the mean is 0.
    pub coefficient_of_variation: f64,
    pub interquartile_range: f64,
}

/// Above this coefficient of variation prices are called out as dispersed.
const HIGH_DISPERSION: f64 = 1.0;

impl Catalog {
    /// Builds the full analysis report.
    ///
    /// # Errors
    /// [`InventoryError::Validation`] if `thresholds` fails [`AnalysisThresholds::validate`].
    pub fn full_analysis(
        &self,
        thresholds: &AnalysisThresholds,
    ) -> Result<AnalysisReport, InventoryError> {
        thresholds.validate()?;
        let products = self.all();

        let mut by_category: BTreeMap<&str, Vec<&Product>> = BTreeMap::new();
        for &p in &products {
            by_category.entry(p.category()).or_default().push(p);
        }

        let categories: BTreeMap<String, CategoryStats> = by_category
            .iter()
            .map(|(category, members)| (category.to_string(), category_stats(members)))
            .collect();

        let stock_tiers: BTreeMap<String, StockTierCounts> = by_category
            .iter()
            .map(|(category, members)| {
                let mut counts = StockTierCounts::default();
                for p in members {
                    match thresholds.stock_tier(p.quantity()) {
                        StockTier::Low => counts.low += 1,
                        StockTier::Medium => counts.medium += 1,
                        StockTier::High => counts.high += 1,
                    }
                }
                (category.to_string(), counts)
            })
            .collect();

        let mut price_tiers = PriceTiers::default();
        for p in &products {
            let bucket = if p.price() > thresholds.high_price {
                &mut price_tiers.special
            } else if p.price() < thresholds.low_price {
                &mut price_tiers.economical
            } else {
                &mut price_tiers.normal
            };
            bucket.push(p.id().to_string());
        }

        let prices: Vec<f64> = products.iter().map(|p| p.price()).collect();
        let price_distribution = price_distribution(&prices);

        let summary = Summary {
            total_products: products.len(),
            total_units: products.iter().map(|p| u64::from(p.quantity())).sum(),
            total_value: self.total_value(),
            category_count: categories.len(),
        };

        let recommendations = recommendations(
            &products,
            thresholds,
            &categories,
            price_distribution.as_ref(),
        );

        Ok(AnalysisReport {
            summary,
            categories,
            stock_tiers,
            price_tiers,
            price_distribution,
            recommendations,
        })
    }
}

fn category_stats(members: &[&Product]) -> CategoryStats {
    let prices: Vec<f64> = members.iter().map(|p| p.price()).collect();
    let mean = mean(&prices);
    CategoryStats {
        count: members.len(),
        mean_price: mean,
        max_price: prices.iter().copied().fold(f64::MIN, f64::max),
        min_price: prices.iter().copied().fold(f64::MAX, f64::min),
        std_dev: std_dev(&prices, mean),
        total_value: members.iter().map(|p| p.total_value()).sum(),
    }
}

fn price_distribution(prices: &[f64]) -> Option<PriceDistribution> {
    if prices.is_empty() {
        return None;
    }
    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = mean(&sorted);
    let std_dev = std_dev(&sorted, mean);
    let p25 = percentile(&sorted, 25.0);
    let p75 = percentile(&sorted, 75.0);

    Some(PriceDistribution {
        p25,
        p50: percentile(&sorted, 50.0),
        p75,
        p90: percentile(&sorted, 90.0),
        coefficient_of_variation: if mean == 0.0 { 0.0 } else { std_dev / mean },
        interquartile_range: p75 - p25,
    })
}

fn recommendations(
    products: &[&Product],
    thresholds: &AnalysisThresholds,
    categories: &BTreeMap<String, CategoryStats>,
    distribution: Option<&PriceDistribution>,
) -> Vec<String> {
    if products.is_empty() {
        return vec!["Inventory is empty; add products to enable analysis.".to_string()];
    }

    let mut out = Vec::new();

    let low: Vec<&str> = products
        .iter()
        .filter(|p| thresholds.stock_tier(p.quantity()) == StockTier::Low)
        .map(|p| p.id())
        .collect();
    if !low.is_empty() {
        out.push(format!(
            "Restock {} product(s) below {} units: {}.",
            low.len(),
            thresholds.low_stock,
            low.join(", ")
        ));
    }

    let high: Vec<&str> = products
        .iter()
        .filter(|p| thresholds.stock_tier(p.quantity()) == StockTier::High)
        .map(|p| p.id())
        .collect();
    if !high.is_empty() {
        out.push(format!(
            "Consider promotions for {} overstocked product(s) above {} units: {}.",
            high.len(),
            thresholds.high_stock,
            high.join(", ")
        ));
    }

    let out_of_stock = products.iter().filter(|p| p.quantity() == 0).count();
    if out_of_stock > 0 {
        out.push(format!("{out_of_stock} product(s) are out of stock."));
    }

    if let Some(d) = distribution {
        if d.coefficient_of_variation > HIGH_DISPERSION {
            out.push(format!(
                "Prices are widely dispersed (coefficient of variation {:.2}); review pricing consistency.",
                d.coefficient_of_variation
            ));
        }
    }

    for (category, stats) in categories {
        if stats.count == 1 {
            out.push(format!(
                "Category '{category}' has a single product; consider widening its range."
            ));
        }
    }

    if out.is_empty() {
        out.push("Stock levels and pricing are balanced; no action required.".to_string());
    }
    out
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty and ascending.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const EPSILON: f64 = 1e-9;

    fn catalog_with(dir: &Path, products: &[(&str, &str, f64, u32)]) -> Catalog {
        let mut catalog = Catalog::open(dir.join("inventory.json"));
        for (id, category, price, quantity) in products {
            let p = Product::new(*id, format!("Product {id}"), *category, *price, *quantity)
                .unwrap();
            catalog.add(p).unwrap();
        }
        catalog
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert!((percentile(&sorted, 25.0) - 20.0).abs() < EPSILON);
        assert!((percentile(&sorted, 50.0) - 30.0).abs() < EPSILON);
        assert!((percentile(&sorted, 90.0) - 46.0).abs() < EPSILON);
        assert_eq!(percentile(&[7.0], 75.0), 7.0);
    }

    #[test]
    fn test_full_analysis_sections() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_with(
            dir.path(),
            &[("TEST001", "Categoria A", 100.0, 10), ("TEST002", "Categoria A", 200.0, 5)],
        );

        let report = catalog.full_analysis(&AnalysisThresholds::default()).unwrap();
        assert_eq!(report.summary.total_products, 2);
        assert_eq!(report.summary.total_units, 15);
        assert!((report.summary.total_value - 2000.0).abs() < EPSILON);
        assert_eq!(report.summary.category_count, 1);

        let stats = &report.categories["Categoria A"];
        assert_eq!(stats.count, 2);
        assert!((stats.mean_price - 150.0).abs() < EPSILON);
        assert_eq!(stats.max_price, 200.0);
        assert_eq!(stats.min_price, 100.0);
        assert!((stats.std_dev - 50.0).abs() < EPSILON);

        assert_eq!(
            report.stock_tiers["Categoria A"],
            StockTierCounts { low: 1, medium: 1, high: 0 }
        );
        assert_eq!(report.price_tiers.special, vec!["TEST002"]);
        assert_eq!(report.price_tiers.normal, vec!["TEST001"]);
        assert!(report.price_tiers.economical.is_empty());

        let dist = report.price_distribution.unwrap();
        assert!((dist.p50 - 150.0).abs() < EPSILON);
        assert!((dist.interquartile_range - 50.0).abs() < EPSILON);
        assert!((dist.coefficient_of_variation - 50.0 / 150.0).abs() < EPSILON);

        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("Restock 1 product(s)") && r.contains("TEST002")));
    }

    #[test]
    fn test_full_analysis_distribution_and_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_with(
            dir.path(),
            &[
                ("A", "x", 10.0, 500),
                ("B", "x", 20.0, 50),
                ("C", "y", 30.0, 50),
                ("D", "y", 40.0, 0),
                ("E", "z", 50.0, 50),
            ],
        );

        let report = catalog.full_analysis(&AnalysisThresholds::default()).unwrap();
        let dist = report.price_distribution.unwrap();
        assert!((dist.p25 - 20.0).abs() < EPSILON);
        assert!((dist.p75 - 40.0).abs() < EPSILON);
        assert!((dist.p90 - 46.0).abs() < EPSILON);
        assert!((dist.interquartile_range - 20.0).abs() < EPSILON);
        assert!((dist.coefficient_of_variation - 200f64.sqrt() / 30.0).abs() < EPSILON);

        assert_eq!(report.price_tiers.economical, vec!["A"]);
        assert_eq!(report.price_tiers.normal, vec!["B", "C", "D", "E"]);
        assert_eq!(report.stock_tiers["x"], StockTierCounts { low: 0, medium: 1, high: 1 });
        assert_eq!(report.stock_tiers["y"], StockTierCounts { low: 1, medium: 1, high: 0 });

        let recs = report.recommendations.join("\n");
        assert!(recs.contains("overstocked"));
        assert!(recs.contains("out of stock"));
        assert!(recs.contains("Category 'z' has a single product"));
    }

    #[test]
    fn test_full_analysis_of_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_with(dir.path(), &[]);

        let report = catalog.full_analysis(&AnalysisThresholds::default()).unwrap();
        assert_eq!(report.summary.total_products, 0);
        assert!(report.categories.is_empty());
        assert!(report.price_distribution.is_none());
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("empty"));
    }

    #[test]
    fn test_balanced_inventory_gets_no_action_recommendation() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_with(
            dir.path(),
            &[("A", "x", 50.0, 50), ("B", "x", 60.0, 50)],
        );
        let report = catalog.full_analysis(&AnalysisThresholds::default()).unwrap();
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("no action required"));
    }

    #[test]
    fn test_invalid_thresholds_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_with(dir.path(), &[("A", "x", 50.0, 50)]);

        let invalid = [
            AnalysisThresholds { high_price: -10.0, ..Default::default() },
            AnalysisThresholds { low_price: 0.0, ..Default::default() },
            AnalysisThresholds { low_price: 500.0, ..Default::default() },
            AnalysisThresholds { high_stock: 0, low_stock: 0, ..Default::default() },
            AnalysisThresholds { low_stock: 200, ..Default::default() },
            AnalysisThresholds { high_price: f64::NAN, ..Default::default() },
        ];
        for thresholds in invalid {
            assert!(
                matches!(
                    catalog.full_analysis(&thresholds),
                    Err(InventoryError::Validation(_))
                ),
                "accepted {thresholds:?}"
            );
        }
    }

    #[test]
    fn test_report_serializes_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog_with(dir.path(), &[("A", "x", 50.0, 5)]);
        let report = catalog.full_analysis(&AnalysisThresholds::default()).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        for key in [
            "summary",
            "categories",
            "stock_tiers",
            "price_tiers",
            "price_distribution",
            "recommendations",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
