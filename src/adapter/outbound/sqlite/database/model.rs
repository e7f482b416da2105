//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{accounts, game_configs, transactions};

/// Database row for a balance account.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountRow {
    pub user_id: String,
    pub guild_id: String,
    pub balance: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Database row for one game's saved configuration.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = game_configs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameConfigRow {
    pub guild_id: String,
    pub game: String,
    pub config_json: String,
    pub updated_at: String,
}

/// Database row for a ledger record.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionRow {
    pub id: String,
    pub user_id: String,
    pub guild_id: String,
    pub amount: String,
    pub amount_key: String,
    pub kind: String,
    pub source: String,
    pub created_at: String,
    pub bet_id: Option<String>,
    pub handled_by: Option<String>,
    pub meta: String,
}
