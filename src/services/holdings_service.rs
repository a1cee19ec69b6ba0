use std::collections::HashMap;

use tracing::info;

use crate::models::{Holding, Transaction, TxSide};

#[derive(Debug, Default)]
struct Position {
    name: String,
    bought: f64,
    sold: f64,
    buy_cost: f64,
}

/// Collapse a trade ledger into net holdings, one per ticker, sorted by
/// ticker. Quantities and cost basis do not depend on ledger order; the
/// display name tracks the most recent transaction.
///
/// Net quantity is total buys minus total sells, floored at zero. Average
/// price is the volume-weighted mean of buy fills only; a ticker with no
/// buys keeps an average price of zero.
pub fn aggregate(transactions: &[Transaction]) -> Vec<Holding> {
    let mut positions: HashMap<String, Position> = HashMap::new();

    for tx in transactions {
        let pos = positions.entry(tx.ticker.clone()).or_default();
        // the last observed name for a ticker wins
        pos.name = tx.name.clone();
        match tx.side {
            TxSide::Buy => {
                pos.bought += tx.quantity;
                pos.buy_cost += tx.quantity * tx.price;
            }
            TxSide::Sell => pos.sold += tx.quantity,
        }
    }

    let mut holdings: Vec<Holding> = positions
        .into_iter()
        .map(|(ticker, pos)| {
            let quantity = (pos.bought - pos.sold).max(0.0);
            let avg_price = if pos.bought > 0.0 {
                pos.buy_cost / pos.bought
            } else {
                0.0
            };
            let sector =
                crate::services::sector_service::resolve_sector(None, &ticker, &pos.name);
            Holding::new(ticker, pos.name, quantity, avg_price, Some(sector))
        })
        .collect();

    holdings.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    info!(
        transactions = transactions.len(),
        holdings = holdings.len(),
        "ledger aggregated"
    );
    holdings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(ticker: &str, side: TxSide, quantity: f64, price: f64) -> Transaction {
        Transaction::new(
            ticker.to_string(),
            ticker.to_string(),
            side,
            quantity,
            price,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn single_buy() {
        let holdings = aggregate(&[tx("TCS", TxSide::Buy, 10.0, 100.0)]);
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].quantity, 10.0);
        assert_eq!(holdings[0].avg_price, 100.0);
        assert_eq!(holdings[0].invested_amount, 1000.0);
    }

    #[test]
    fn sells_reduce_quantity_but_not_average() {
        let holdings = aggregate(&[
            tx("TCS", TxSide::Buy, 10.0, 100.0),
            tx("TCS", TxSide::Buy, 5.0, 120.0),
            tx("TCS", TxSide::Sell, 8.0, 150.0),
        ]);
        assert_eq!(holdings[0].quantity, 7.0);
        assert!((holdings[0].avg_price - 1600.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn oversell_floors_at_zero() {
        let holdings = aggregate(&[
            tx("TCS", TxSide::Buy, 10.0, 50.0),
            tx("TCS", TxSide::Sell, 15.0, 60.0),
        ]);
        assert_eq!(holdings[0].quantity, 0.0);
        assert_eq!(holdings[0].avg_price, 50.0);
    }

    #[test]
    fn all_sell_ledger_has_zero_average() {
        let holdings = aggregate(&[tx("TCS", TxSide::Sell, 5.0, 60.0)]);
        assert_eq!(holdings[0].quantity, 0.0);
        assert_eq!(holdings[0].avg_price, 0.0);
    }

    #[test]
    fn latest_transaction_name_wins() {
        let mut later = tx("TCS", TxSide::Sell, 2.0, 110.0);
        later.name = "Tata Consultancy Services".to_string();
        let holdings = aggregate(&[tx("TCS", TxSide::Buy, 10.0, 100.0), later]);
        assert_eq!(holdings[0].name, "Tata Consultancy Services");
    }

    #[test]
    fn ledger_order_does_not_matter() {
        let mut trades = vec![
            tx("INFY", TxSide::Buy, 3.0, 1500.0),
            tx("TCS", TxSide::Buy, 10.0, 100.0),
            tx("TCS", TxSide::Sell, 4.0, 110.0),
            tx("TCS", TxSide::Buy, 2.0, 105.0),
        ];
        let forward = aggregate(&trades);
        trades.reverse();
        let backward = aggregate(&trades);

        assert_eq!(forward.len(), 2);
        assert_eq!(forward[0].ticker, "INFY");
        for (a, b) in forward.iter().zip(&backward) {
            assert_eq!(a.ticker, b.ticker);
            assert_eq!(a.quantity, b.quantity);
            assert!((a.avg_price - b.avg_price).abs() < 1e-9);
        }
    }
}
