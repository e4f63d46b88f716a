//! Database seeder for Saldo development and testing.
//!
//! Creates a demo account funded through real ledger commits, so the
//! movement log and the stored balances agree from the first row.

use sea_orm::Database;
use uuid::Uuid;

use saldo_core::ledger::MovementKind;
use saldo_db::repositories::LedgerRepository;
use saldo_shared::types::{AccountId, MinorUnits};

const DEMO_ACCOUNT: &str = "00000000-0000-0000-0000-00000000d41e";
const OPENING_BALANCE: i64 = 1_000_000; // R$ 10 000,00

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("SALDO__DATABASE__URL"))
        .expect("DATABASE_URL must be set");

    let db = Database::connect(&url).await.expect("failed to connect");
    let ledger = LedgerRepository::new(db);

    let account_id = AccountId::from_uuid(
        Uuid::parse_str(DEMO_ACCOUNT).expect("demo account id is a valid UUID"),
    );

    let balances = ledger
        .commit(
            account_id,
            MinorUnits::new(OPENING_BALANCE),
            MovementKind::AnticipationCredit,
            Uuid::new_v4(),
        )
        .await
        .expect("failed to seed demo account");

    println!("Seeded account {account_id} with balances {balances:?}");

    let reconciled = ledger
        .reconcile(account_id)
        .await
        .expect("seeded account must reconcile");
    println!("Reconciliation OK: {reconciled:?}");
}
