//! Reporting tests
//!
//! Tests for the reports derived from the movement log:
//! - Low-stock report and count
//! - Balance report ordering and filtering
//! - Product locations lookup
//! - Dashboard aggregates and movement history

mod common;

use common::Harness;
use proptest::prelude::*;
use shared::models::{LocationQty, MovementKind};
use stock_ledger::services::ReportingService;

/// Two locations and three products with a mix of movements
async fn stocked() -> (Harness, Vec<String>, Vec<String>) {
    let h = Harness::new();
    let wh1 = h.add_location("Main Warehouse").await;
    let wh2 = h.add_location("Store A").await;
    let p1 = h.add_product("Face Wash", 10).await.product_id;
    let p2 = h.add_product("Serum", 10).await.product_id;
    let p3 = h.add_product("Sunscreen", 10).await.product_id;

    h.inflow(&p1, &wh1, 50).await;
    h.inflow(&p2, &wh1, 8).await;
    h.transfer(&p1, &wh1, &wh2, 15).await;
    h.inflow(&p3, &wh2, 10).await;

    (h, vec![wh1, wh2], vec![p1, p2, p3])
}

mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_low_stock_report_includes_threshold() {
        let (h, _, products) = stocked().await;
        let reporting = h.state.reporting();

        let report = reporting.low_stock_report().await.unwrap();
        let ids: Vec<_> = report.iter().map(|i| i.product_id.clone()).collect();
        // Serum has 8, Sunscreen exactly 10
        assert_eq!(ids, vec![products[1].clone(), products[2].clone()]);
        assert_eq!(report[0].current_stock, 8);
        assert_eq!(report[1].current_stock, 10);
        assert_eq!(reporting.low_stock_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_product_without_movements_is_low_when_threshold_non_negative() {
        let h = Harness::new();
        h.add_product("Toner", 0).await;
        assert_eq!(h.state.reporting().low_stock_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_balance_report_is_location_major_and_positive_only() {
        let (h, locations, products) = stocked().await;
        // Drain Serum from the main warehouse
        h.outflow(&products[1], &locations[0], 8).await;

        let rows = h.state.reporting().balance_report().await.unwrap();
        let flat: Vec<_> = rows
            .iter()
            .map(|r| (r.location_name.as_str(), r.product_name.as_str(), r.qty))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("Main Warehouse", "Face Wash", 35),
                ("Store A", "Face Wash", 15),
                ("Store A", "Sunscreen", 10),
            ]
        );
    }

    #[tokio::test]
    async fn test_balance_report_empty_ledger() {
        let h = Harness::new();
        h.add_location("Main Warehouse").await;
        h.add_product("Face Wash", 5).await;
        assert!(h.state.reporting().balance_report().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_product_locations() {
        let (h, _, products) = stocked().await;
        let reporting = h.state.reporting();

        let locations = reporting.product_locations(&products[0]).await.unwrap();
        assert_eq!(
            locations,
            vec![
                LocationQty {
                    location: "Main Warehouse".to_string(),
                    qty: 35,
                },
                LocationQty {
                    location: "Store A".to_string(),
                    qty: 15,
                },
            ]
        );

        assert!(reporting.product_locations("PROD999").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_product_list_carries_totals() {
        let (h, _, _) = stocked().await;
        let list = h.state.reporting().product_list().await.unwrap();
        let totals: Vec<_> = list.iter().map(|p| (p.name.as_str(), p.total_qty)).collect();
        assert_eq!(totals, vec![("Face Wash", 50), ("Serum", 8), ("Sunscreen", 10)]);
    }

    #[tokio::test]
    async fn test_dashboard() {
        let (h, _, _) = stocked().await;
        let dashboard = h.state.reporting().dashboard().await.unwrap();

        assert_eq!(dashboard.total_products, 3);
        assert_eq!(dashboard.total_locations, 2);
        assert_eq!(dashboard.total_movements, 4);
        assert_eq!(dashboard.low_stock.len(), 2);
        assert_eq!(dashboard.total_stock[0].product, "Face Wash");
        assert_eq!(dashboard.total_stock[0].total, 50);
    }

    #[tokio::test]
    async fn test_movement_history_newest_first_with_names() {
        let (h, _, _) = stocked().await;
        let history = h.state.reporting().movement_history().await.unwrap();

        assert_eq!(history.len(), 4);
        let ids: Vec<_> = history.iter().map(|m| m.movement_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(ids, sorted);

        let transfer = history
            .iter()
            .find(|m| m.kind == Some(MovementKind::Transfer))
            .unwrap();
        assert_eq!(transfer.product_name, "Face Wash");
        assert_eq!(transfer.from_location_name.as_deref(), Some("Main Warehouse"));
        assert_eq!(transfer.to_location_name.as_deref(), Some("Store A"));
    }

    #[tokio::test]
    async fn test_balance_report_csv() {
        let (h, _, _) = stocked().await;
        let rows = h.state.reporting().balance_report().await.unwrap();
        let csv = ReportingService::export_to_csv(&rows).unwrap();

        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "product_name,location_name,qty");
        assert_eq!(lines[1], "Face Wash,Main Warehouse,35");
        assert_eq!(lines.len(), rows.len() + 1);
    }
}

mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Every row in the balance report is positive and matches the
        /// per-location balance
        #[test]
        fn prop_balance_report_rows_are_positive_balances(
            inflows in prop::collection::vec((0usize..2, 0usize..2, 1i64..20), 1..10),
            outflows in prop::collection::vec((0usize..2, 0usize..2, 1i64..20), 0..10),
        ) {
            tokio_test::block_on(async {
                let h = Harness::new();
                let locations = vec![
                    h.add_location("Main Warehouse").await,
                    h.add_location("Store A").await,
                ];
                let products = vec![
                    h.add_product("Face Wash", 5).await.product_id,
                    h.add_product("Serum", 5).await.product_id,
                ];

                for (p, l, qty) in &inflows {
                    h.inflow(&products[*p], &locations[*l], *qty).await;
                }
                for (p, l, qty) in &outflows {
                    // Overdraws are rejected and leave the ledger unchanged
                    let _ = h.record(&products[*p], Some(&locations[*l]), None, *qty).await;
                }

                let rows = h.state.reporting().balance_report().await.unwrap();
                let mut expected = 0;
                for l in &locations {
                    for p in &products {
                        if h.balance(p, l).await > 0 {
                            expected += 1;
                        }
                    }
                }

                assert_eq!(rows.len(), expected);
                assert!(rows.iter().all(|row| row.qty > 0));
            });
        }
    }
}
