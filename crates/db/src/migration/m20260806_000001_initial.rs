//! Initial database migration.
//!
//! Creates the enums, the accounts/movements/withdrawals/anticipations
//! tables, their indexes, and the append-only guard on movements.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(MOVEMENTS_SQL).await?;
        db.execute_unprepared(WITHDRAWALS_SQL).await?;
        db.execute_unprepared(ANTICIPATIONS_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Movement kinds
CREATE TYPE movement_kind AS ENUM (
    'withdrawal_debit',
    'withdrawal_reversal',
    'anticipation_credit',
    'fee_debit',
    'reserve_hold',
    'reserve_release'
);

-- Withdrawal lifecycle
CREATE TYPE withdrawal_status AS ENUM (
    'pending',
    'approved',
    'done',
    'done_manual',
    'cancelled'
);

-- Anticipation lifecycle
CREATE TYPE anticipation_status AS ENUM (
    'pending',
    'approved',
    'refused'
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    available_balance BIGINT NOT NULL DEFAULT 0 CHECK (available_balance >= 0),
    reserved_balance BIGINT NOT NULL DEFAULT 0 CHECK (reserved_balance >= 0),
    pending_balance BIGINT NOT NULL DEFAULT 0 CHECK (pending_balance >= 0),
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const MOVEMENTS_SQL: &str = r"
CREATE TABLE movements (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id),
    amount BIGINT NOT NULL CHECK (amount <> 0),
    kind movement_kind NOT NULL,
    reference_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_movements_account ON movements(account_id, id);
CREATE INDEX idx_movements_reference ON movements(reference_id);
";

const WITHDRAWALS_SQL: &str = r"
CREATE TABLE withdrawals (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id),
    requested_amount BIGINT NOT NULL CHECK (requested_amount > 0),
    fee_amount BIGINT NOT NULL CHECK (fee_amount >= 0),
    net_amount BIGINT NOT NULL CHECK (net_amount > 0),
    status withdrawal_status NOT NULL DEFAULT 'pending',
    pix_key_id UUID NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    reason_for_denial TEXT,
    end_to_end_id TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    paid_at TIMESTAMPTZ
);

CREATE INDEX idx_withdrawals_account_status ON withdrawals(account_id, status);
CREATE INDEX idx_withdrawals_status ON withdrawals(status, created_at);
";

const ANTICIPATIONS_SQL: &str = r"
CREATE TABLE anticipations (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id),
    requested_amount BIGINT NOT NULL CHECK (requested_amount > 0),
    fee_amount BIGINT NOT NULL CHECK (fee_amount >= 0),
    net_amount BIGINT NOT NULL CHECK (net_amount > 0),
    status anticipation_status NOT NULL DEFAULT 'pending',
    refused_reason TEXT,
    receivable_lock_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_anticipations_account_status ON anticipations(account_id, status);
CREATE INDEX idx_anticipations_status ON anticipations(status, created_at);
";

const TRIGGERS_SQL: &str = r"
-- The movement log is append-only: no UPDATE, no DELETE, ever.
CREATE OR REPLACE FUNCTION movements_append_only()
RETURNS trigger AS $$
BEGIN
    RAISE EXCEPTION 'movements are append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_movements_append_only
    BEFORE UPDATE OR DELETE ON movements
    FOR EACH ROW EXECUTE FUNCTION movements_append_only();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_movements_append_only ON movements;
DROP FUNCTION IF EXISTS movements_append_only();
DROP TABLE IF EXISTS anticipations;
DROP TABLE IF EXISTS withdrawals;
DROP TABLE IF EXISTS movements;
DROP TABLE IF EXISTS accounts;
DROP TYPE IF EXISTS anticipation_status;
DROP TYPE IF EXISTS withdrawal_status;
DROP TYPE IF EXISTS movement_kind;
";
