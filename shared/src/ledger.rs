//! Balance arithmetic over the movement ledger
//!
//! Two balances are derived from the same append-only log:
//!
//! - **Total stock** of a product: quantities received anywhere minus quantities
//!   that left through pure outflows. Transfers move stock between locations
//!   and do not reduce the total.
//! - **Location balance** of a (product, location) pair: quantities arriving at
//!   the location minus quantities leaving it, transfers included on both sides.
//!
//! Both are expressed as a pair of [`MovementFilter`]s (incoming, outgoing) so
//! a store can evaluate them with aggregate queries, and so the in-memory store
//! can evaluate them by folding over its movements.
//!
//! Single movements are bounded by [`MAX_MOVEMENT_QTY`](crate::types::MAX_MOVEMENT_QTY);
//! sums saturate at the `i64` range instead of wrapping.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{
    BalanceRow, Location, LocationQty, LowStockItem, Movement, Product, ProductSummary,
};

/// Constraint on one endpoint (source or destination) of a movement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Any,
    Present,
    Absent,
    At(String),
}

impl Endpoint {
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Endpoint::Any => true,
            Endpoint::Present => value.is_some(),
            Endpoint::Absent => value.is_none(),
            Endpoint::At(expected) => value == Some(expected.as_str()),
        }
    }
}

/// Selects the movements of one product whose endpoints satisfy both constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementFilter {
    pub product_id: String,
    pub from: Endpoint,
    pub to: Endpoint,
}

impl MovementFilter {
    pub fn matches(&self, movement: &Movement) -> bool {
        movement.product_id == self.product_id
            && self.from.matches(movement.from_location.as_deref())
            && self.to.matches(movement.to_location.as_deref())
    }

    /// Sum of quantities over matching movements
    pub fn sum<'a>(&self, movements: impl IntoIterator<Item = &'a Movement>) -> i64 {
        movements
            .into_iter()
            .filter(|m| self.matches(m))
            .fold(0i64, |acc, m| acc.saturating_add(m.qty))
    }
}

/// A balance defined as `sum(incoming) - sum(outgoing)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceQuery {
    Total {
        product_id: String,
    },
    AtLocation {
        product_id: String,
        location_id: String,
    },
}

impl BalanceQuery {
    pub fn total(product_id: impl Into<String>) -> Self {
        BalanceQuery::Total {
            product_id: product_id.into(),
        }
    }

    pub fn at_location(product_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        BalanceQuery::AtLocation {
            product_id: product_id.into(),
            location_id: location_id.into(),
        }
    }

    pub fn product_id(&self) -> &str {
        match self {
            BalanceQuery::Total { product_id } | BalanceQuery::AtLocation { product_id, .. } => {
                product_id
            }
        }
    }

    pub fn incoming(&self) -> MovementFilter {
        match self {
            BalanceQuery::Total { product_id } => MovementFilter {
                product_id: product_id.clone(),
                from: Endpoint::Any,
                to: Endpoint::Present,
            },
            BalanceQuery::AtLocation {
                product_id,
                location_id,
            } => MovementFilter {
                product_id: product_id.clone(),
                from: Endpoint::Any,
                to: Endpoint::At(location_id.clone()),
            },
        }
    }

    pub fn outgoing(&self) -> MovementFilter {
        match self {
            // Pure outflows only; transfers net to zero on the total
            BalanceQuery::Total { product_id } => MovementFilter {
                product_id: product_id.clone(),
                from: Endpoint::Present,
                to: Endpoint::Absent,
            },
            BalanceQuery::AtLocation {
                product_id,
                location_id,
            } => MovementFilter {
                product_id: product_id.clone(),
                from: Endpoint::At(location_id.clone()),
                to: Endpoint::Any,
            },
        }
    }

    /// Evaluate the balance by scanning a slice of movements
    pub fn evaluate(&self, movements: &[Movement]) -> i64 {
        self.incoming()
            .sum(movements)
            .saturating_sub(self.outgoing().sum(movements))
    }
}

/// Incoming and outgoing quantities of one product at one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFlow {
    pub product_id: String,
    pub location_id: String,
    pub incoming: i64,
    pub outgoing: i64,
}

impl LocationFlow {
    pub fn balance(&self) -> i64 {
        self.incoming.saturating_sub(self.outgoing)
    }
}

/// Received and consumed quantities of one product across all locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFlow {
    pub product_id: String,
    pub incoming: i64,
    pub outgoing: i64,
}

impl ProductFlow {
    pub fn total(&self) -> i64 {
        self.incoming.saturating_sub(self.outgoing)
    }
}

/// Group movements into per-(product, location) flows
pub fn location_flows<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> Vec<LocationFlow> {
    let mut flows: BTreeMap<(String, String), (i64, i64)> = BTreeMap::new();

    for movement in movements {
        if let Some(to) = &movement.to_location {
            let entry = flows
                .entry((movement.product_id.clone(), to.clone()))
                .or_default();
            entry.0 = entry.0.saturating_add(movement.qty);
        }
        if let Some(from) = &movement.from_location {
            let entry = flows
                .entry((movement.product_id.clone(), from.clone()))
                .or_default();
            entry.1 = entry.1.saturating_add(movement.qty);
        }
    }

    flows
        .into_iter()
        .map(|((product_id, location_id), (incoming, outgoing))| LocationFlow {
            product_id,
            location_id,
            incoming,
            outgoing,
        })
        .collect()
}

/// Group movements into per-product flows
pub fn product_flows<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> Vec<ProductFlow> {
    let mut flows: BTreeMap<String, (i64, i64)> = BTreeMap::new();

    for movement in movements {
        let entry = flows.entry(movement.product_id.clone()).or_default();
        match (&movement.from_location, &movement.to_location) {
            (_, Some(_)) => entry.0 = entry.0.saturating_add(movement.qty),
            (Some(_), None) => entry.1 = entry.1.saturating_add(movement.qty),
            (None, None) => {}
        }
    }

    flows
        .into_iter()
        .map(|(product_id, (incoming, outgoing))| ProductFlow {
            product_id,
            incoming,
            outgoing,
        })
        .collect()
}

/// Low-stock rule: the threshold itself counts as low
pub fn is_low_stock(total_stock: i64, min_stock: i64) -> bool {
    total_stock <= min_stock
}

/// Balances looked up by product and location, built from grouped flows
#[derive(Debug, Default)]
pub struct BalanceSheet {
    by_pair: HashMap<(String, String), i64>,
}

impl BalanceSheet {
    pub fn from_flows(flows: &[LocationFlow]) -> Self {
        let by_pair = flows
            .iter()
            .map(|f| ((f.product_id.clone(), f.location_id.clone()), f.balance()))
            .collect();
        Self { by_pair }
    }

    pub fn balance(&self, product_id: &str, location_id: &str) -> i64 {
        self.by_pair
            .get(&(product_id.to_string(), location_id.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

/// Product totals looked up by product id
#[derive(Debug, Default)]
pub struct TotalSheet {
    by_product: HashMap<String, i64>,
}

impl TotalSheet {
    pub fn from_flows(flows: &[ProductFlow]) -> Self {
        let by_product = flows
            .iter()
            .map(|f| (f.product_id.clone(), f.total()))
            .collect();
        Self { by_product }
    }

    pub fn total(&self, product_id: &str) -> i64 {
        self.by_product.get(product_id).copied().unwrap_or(0)
    }
}

/// Every location × every product with a positive balance.
///
/// Locations form the outer loop and products the inner one, both in the order
/// given (creation order).
pub fn balance_report(
    locations: &[Location],
    products: &[Product],
    flows: &[LocationFlow],
) -> Vec<BalanceRow> {
    let sheet = BalanceSheet::from_flows(flows);
    let mut rows = Vec::new();

    for location in locations {
        for product in products {
            let qty = sheet.balance(&product.product_id, &location.location_id);
            if qty > 0 {
                rows.push(BalanceRow {
                    product_name: product.name.clone(),
                    location_name: location.name.clone(),
                    qty,
                });
            }
        }
    }

    rows
}

/// Locations holding a positive balance of one product, in location order
pub fn product_locations(
    product_id: &str,
    locations: &[Location],
    flows: &[LocationFlow],
) -> Vec<LocationQty> {
    let sheet = BalanceSheet::from_flows(flows);

    locations
        .iter()
        .filter_map(|location| {
            let qty = sheet.balance(product_id, &location.location_id);
            (qty > 0).then(|| LocationQty {
                location: location.name.clone(),
                qty,
            })
        })
        .collect()
}

/// Products at or below their threshold, in product order
pub fn low_stock(products: &[Product], flows: &[ProductFlow]) -> Vec<LowStockItem> {
    let totals = TotalSheet::from_flows(flows);

    products
        .iter()
        .filter_map(|product| {
            let current_stock = totals.total(&product.product_id);
            is_low_stock(current_stock, product.min_stock).then(|| LowStockItem {
                product_id: product.product_id.clone(),
                product_name: product.name.clone(),
                current_stock,
                min_stock: product.min_stock,
            })
        })
        .collect()
}

/// Product list entries with their total stock
pub fn product_summaries(products: &[Product], flows: &[ProductFlow]) -> Vec<ProductSummary> {
    let totals = TotalSheet::from_flows(flows);

    products
        .iter()
        .map(|product| ProductSummary {
            product_id: product.product_id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            min_stock: product.min_stock,
            total_qty: totals.total(&product.product_id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn movement(id: i64, product: &str, from: Option<&str>, to: Option<&str>, qty: i64) -> Movement {
        Movement {
            movement_id: id,
            product_id: product.to_string(),
            from_location: from.map(str::to_string),
            to_location: to.map(str::to_string),
            qty,
            created_at: Utc::now(),
        }
    }

    fn product(id: &str, name: &str, min_stock: i64, seq: i64) -> Product {
        Product {
            product_id: id.to_string(),
            name: name.to_string(),
            description: None,
            min_stock,
            seq,
        }
    }

    fn location(id: &str, name: &str, seq: i64) -> Location {
        Location {
            location_id: id.to_string(),
            name: name.to_string(),
            description: None,
            seq,
        }
    }

    fn sample_ledger() -> Vec<Movement> {
        vec![
            movement(1, "PROD001", None, Some("WH001"), 50),
            movement(2, "PROD001", Some("WH001"), Some("WH002"), 15),
            movement(3, "PROD001", Some("WH002"), None, 5),
            movement(4, "PROD002", None, Some("WH001"), 30),
        ]
    }

    #[test]
    fn test_sums_saturate_instead_of_overflowing() {
        let ledger = vec![
            movement(1, "PROD001", None, Some("WH001"), i64::MAX),
            movement(2, "PROD001", None, Some("WH001"), 1),
        ];

        assert_eq!(BalanceQuery::total("PROD001").evaluate(&ledger), i64::MAX);
        assert_eq!(
            BalanceQuery::at_location("PROD001", "WH001").evaluate(&ledger),
            i64::MAX
        );
        assert_eq!(product_flows(&ledger)[0].total(), i64::MAX);
        assert_eq!(location_flows(&ledger)[0].balance(), i64::MAX);
    }

    #[test]
    fn test_empty_ledger_balances_are_zero() {
        assert_eq!(BalanceQuery::total("PROD001").evaluate(&[]), 0);
        assert_eq!(BalanceQuery::at_location("PROD001", "WH001").evaluate(&[]), 0);
    }

    #[test]
    fn test_transfers_do_not_reduce_total() {
        let ledger = sample_ledger();
        // 50 in, 15 transferred, 5 sold
        assert_eq!(BalanceQuery::total("PROD001").evaluate(&ledger), 45);
    }

    #[test]
    fn test_location_balance_counts_transfers_on_both_sides() {
        let ledger = sample_ledger();
        assert_eq!(BalanceQuery::at_location("PROD001", "WH001").evaluate(&ledger), 35);
        assert_eq!(BalanceQuery::at_location("PROD001", "WH002").evaluate(&ledger), 10);
        assert_eq!(BalanceQuery::at_location("PROD002", "WH002").evaluate(&ledger), 0);
    }

    #[test]
    fn test_filters_are_scoped_to_product() {
        let ledger = sample_ledger();
        let filter = BalanceQuery::total("PROD002").incoming();
        assert_eq!(filter.sum(&ledger), 30);
    }

    #[test]
    fn test_location_flows_match_balance_queries() {
        let ledger = sample_ledger();
        let sheet = BalanceSheet::from_flows(&location_flows(&ledger));
        for (p, l) in [("PROD001", "WH001"), ("PROD001", "WH002"), ("PROD002", "WH001")] {
            assert_eq!(
                sheet.balance(p, l),
                BalanceQuery::at_location(p, l).evaluate(&ledger)
            );
        }
        assert_eq!(sheet.balance("PROD009", "WH001"), 0);
    }

    #[test]
    fn test_product_flows_match_total_query() {
        let ledger = sample_ledger();
        let totals = TotalSheet::from_flows(&product_flows(&ledger));
        assert_eq!(totals.total("PROD001"), 45);
        assert_eq!(totals.total("PROD002"), 30);
        assert_eq!(totals.total("PROD003"), 0);
    }

    #[test]
    fn test_low_stock_includes_threshold() {
        let products = vec![
            product("PROD001", "Face Wash", 10, 1),
            product("PROD002", "Serum", 10, 2),
            product("PROD003", "Sunscreen", 10, 3),
        ];
        let ledger = vec![
            movement(1, "PROD001", None, Some("WH001"), 4),
            movement(2, "PROD001", None, Some("WH001"), 3),
            movement(3, "PROD001", None, Some("WH001"), 3),
            movement(4, "PROD002", None, Some("WH001"), 11),
        ];
        let low = low_stock(&products, &product_flows(&ledger));
        let ids: Vec<_> = low.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["PROD001", "PROD003"]);
        assert_eq!(low[0].current_stock, 10);
        assert_eq!(low[1].current_stock, 0);
    }

    #[test]
    fn test_balance_report_orders_locations_then_products() {
        let products = vec![product("PROD001", "Face Wash", 10, 1), product("PROD002", "Serum", 10, 2)];
        let locations = vec![location("WH001", "Main Warehouse", 1), location("WH002", "Store A", 2)];
        let rows = balance_report(&locations, &products, &location_flows(&sample_ledger()));

        let got: Vec<_> = rows
            .iter()
            .map(|r| (r.location_name.as_str(), r.product_name.as_str(), r.qty))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Main Warehouse", "Face Wash", 35),
                ("Main Warehouse", "Serum", 30),
                ("Store A", "Face Wash", 10),
            ]
        );
    }

    #[test]
    fn test_product_locations_skips_empty_locations() {
        let locations = vec![
            location("WH001", "Main Warehouse", 1),
            location("WH002", "Store A", 2),
            location("WH003", "Warehouse B", 3),
        ];
        let ledger = vec![
            movement(1, "PROD001", None, Some("WH001"), 20),
            movement(2, "PROD001", Some("WH001"), Some("WH003"), 20),
        ];
        let found = product_locations("PROD001", &locations, &location_flows(&ledger));
        assert_eq!(
            found,
            vec![LocationQty {
                location: "Warehouse B".to_string(),
                qty: 20
            }]
        );
    }

    fn endpoint_strategy() -> impl Strategy<Value = Option<&'static str>> {
        prop::option::of(prop_oneof![Just("WH001"), Just("WH002"), Just("WH003")])
    }

    fn ledger_strategy() -> impl Strategy<Value = Vec<Movement>> {
        prop::collection::vec(
            (
                prop_oneof![Just("PROD001"), Just("PROD002")],
                endpoint_strategy(),
                endpoint_strategy(),
                1i64..100,
            ),
            0..40,
        )
        .prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .filter(|(_, (_, from, to, _))| from.is_some() || to.is_some())
                .map(|(i, (p, from, to, qty))| movement(i as i64 + 1, p, from, to, qty))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Grouped flows agree with per-query scans
        #[test]
        fn prop_grouped_flows_agree_with_scans(ledger in ledger_strategy()) {
            let sheet = BalanceSheet::from_flows(&location_flows(&ledger));
            let totals = TotalSheet::from_flows(&product_flows(&ledger));

            for p in ["PROD001", "PROD002"] {
                prop_assert_eq!(totals.total(p), BalanceQuery::total(p).evaluate(&ledger));
                for l in ["WH001", "WH002", "WH003"] {
                    prop_assert_eq!(sheet.balance(p, l), BalanceQuery::at_location(p, l).evaluate(&ledger));
                }
            }
        }

        /// Location balances sum to the total stock (conservation)
        #[test]
        fn prop_location_balances_sum_to_total(ledger in ledger_strategy()) {
            for p in ["PROD001", "PROD002"] {
                let by_location: i64 = ["WH001", "WH002", "WH003"]
                    .iter()
                    .map(|l| BalanceQuery::at_location(p, *l).evaluate(&ledger))
                    .sum();
                prop_assert_eq!(by_location, BalanceQuery::total(p).evaluate(&ledger));
            }
        }
    }
}
