#![allow(dead_code)]

pub mod temp_db;

use rust_decimal::Decimal;

use croupier::domain::{TransactionSource, TransactionType};

/// Deterministic mix of types, sources and amounts for ledger fixtures.
pub fn fixture_rows() -> Vec<(&'static str, TransactionType, TransactionSource, Decimal)> {
    use TransactionSource::{Casino, Command, Manual, System, Web};
    use TransactionType::{Bet, Bonus, Deposit, Refund, Vip, Win, Withdraw};
    vec![
        ("alice", Deposit, Web, Decimal::new(500, 0)),
        ("alice", Bet, Casino, Decimal::new(120, 0)),
        ("alice", Win, Casino, Decimal::new(240, 0)),
        ("bob", Deposit, Manual, Decimal::new(75, 0)),
        ("bob", Bet, Casino, Decimal::new(2550, 2)),
        ("bob", Refund, Casino, Decimal::new(2550, 2)),
        ("carol", Bonus, Web, Decimal::new(10, 0)),
        ("carol", Vip, Command, Decimal::new(60, 0)),
        ("carol", Withdraw, System, Decimal::new(5, 0)),
        ("dave", Bet, Casino, Decimal::new(9, 0)),
    ]
}
