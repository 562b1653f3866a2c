//! Postgres-backed ledger store.
//!
//! ## Atomicity
//!
//! Every balance change is one conditional `UPDATE`:
//!
//! ```sql
//! UPDATE accounts SET balance = balance + $delta
//! WHERE acc_number = $n AND ($min IS NULL OR balance >= $min) AND balance + $delta >= 0
//! ```
//!
//! Under READ COMMITTED, a concurrent writer blocks on the row lock and the
//! `WHERE` clause is re-evaluated against the committed row, so two debits can
//! never both pass a stale balance check.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (foreign key violation) | `23503` | `Referenced` |
//! | Database (string too long, numeric overflow) | `22001`, `22003` | `OutOfRange` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / PoolTimedOut / Io / other | N/A | `Backend` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use ledgerbank_core::{AccountId, AccountNumber, TransactionId};
use ledgerbank_ledger::{
    Account, BalanceGuard, Money, NewAccount, PartySnapshot, TransactionFilter, TransactionRecord,
    TransactionView,
};

use super::{LedgerStore, LedgerUnit, StoreError};

/// Idempotent schema, applied statement by statement.
const SCHEMA: &[&str] = &[
    "CREATE SEQUENCE IF NOT EXISTS account_number_seq START WITH 10000001",
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id          BIGSERIAL PRIMARY KEY,
        first_name  VARCHAR(50) NOT NULL,
        last_name   VARCHAR(50) NOT NULL,
        acc_number  BIGINT NOT NULL UNIQUE DEFAULT nextval('account_number_seq'),
        balance     NUMERIC(20, 2) NOT NULL DEFAULT 0 CHECK (balance >= 0),
        email       VARCHAR(254) NOT NULL UNIQUE,
        password    VARCHAR(200) NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        transaction_id  UUID PRIMARY KEY,
        sen_acc         BIGINT NOT NULL REFERENCES accounts(acc_number),
        rec_acc         BIGINT NOT NULL REFERENCES accounts(acc_number),
        amount          NUMERIC(20, 2) NOT NULL CHECK (amount > 0),
        description     VARCHAR(80) NOT NULL,
        status          VARCHAR(20) NOT NULL,
        date            TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS transactions_sen_acc_idx ON transactions (sen_acc)",
    "CREATE INDEX IF NOT EXISTS transactions_rec_acc_idx ON transactions (rec_acc)",
    r#"
    CREATE OR REPLACE VIEW transaction_view AS
    SELECT
        t.transaction_id,
        t.amount,
        t.description,
        t.status,
        t.date,
        s.acc_number AS sender_acc,
        s.first_name AS sender_fn,
        s.last_name  AS sender_ln,
        s.balance    AS sender_balance,
        s.email      AS sender_email,
        r.acc_number AS receiver_acc,
        r.first_name AS receiver_fn,
        r.last_name  AS receiver_ln,
        r.balance    AS receiver_balance,
        r.email      AS receiver_email
    FROM transactions t
    JOIN accounts s ON t.sen_acc = s.acc_number
    JOIN accounts r ON t.rec_acc = r.acc_number
    "#,
];

const ACCOUNT_COLUMNS: &str =
    "id, first_name, last_name, acc_number, balance, email, password, created_at";

/// Postgres-backed ledger store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`. Each [`LedgerUnit`]
/// is one database transaction; dropping it uncommitted rolls it back.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `url`.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables, sequence and the transaction view if missing.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn fetch_account(
        &self,
        operation: &str,
        filter: &str,
        bind: AccountKey<'_>,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {filter}");
        let query = sqlx::query(&sql);
        let query = match bind {
            AccountKey::Int(v) => query.bind(v),
            AccountKey::Text(v) => query.bind(v),
        };
        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        row.map(|r| account_from_row(&r)).transpose()
    }
}

enum AccountKey<'a> {
    Int(i64),
    Text(&'a str),
}

/// One open database transaction.
struct PostgresUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerUnit for PostgresUnit {
    async fn lock_accounts(&mut self, accounts: &[AccountNumber]) -> Result<(), StoreError> {
        let numbers: Vec<i64> = accounts.iter().map(|n| n.get()).collect();
        sqlx::query(
            "SELECT acc_number FROM accounts WHERE acc_number = ANY($1) ORDER BY acc_number FOR UPDATE",
        )
        .bind(numbers)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("lock_accounts", e))?;
        Ok(())
    }

    async fn apply_balance_delta(
        &mut self,
        account: AccountNumber,
        delta: Money,
        guard: BalanceGuard,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance + $1
            WHERE acc_number = $2
                AND ($3::numeric IS NULL OR balance >= $3)
                AND balance + $1 >= 0
            "#,
        )
        .bind(delta.amount())
        .bind(account.get())
        .bind(guard.threshold().map(|m| m.amount()))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("apply_balance_delta", e))?;

        Ok(result.rows_affected())
    }

    async fn insert_transaction(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                transaction_id,
                sen_acc,
                rec_acc,
                amount,
                description,
                status,
                date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.sender.get())
        .bind(record.receiver.get())
        .bind(record.amount.amount())
        .bind(&record.description)
        .bind(&record.status)
        .bind(record.date)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_transaction", e))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, account), fields(email = %account.email), err)]
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO accounts (first_name, last_name, balance, email, password, created_at)
            VALUES ($1, $2, 0, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.created_at)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_account", e))?;

        account_from_row(&row)
    }

    async fn get_account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        self.fetch_account("get_account_by_id", "id = $1", AccountKey::Int(id.get()))
            .await
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.fetch_account("get_account_by_email", "email = $1", AccountKey::Text(email))
            .await
    }

    async fn get_account_by_number(
        &self,
        number: AccountNumber,
    ) -> Result<Option<Account>, StoreError> {
        self.fetch_account(
            "get_account_by_number",
            "acc_number = $1",
            AccountKey::Int(number.get()),
        )
        .await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_accounts", e))?;

        rows.iter().map(account_from_row).collect()
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn delete_account(&self, id: AccountId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_account", e))?;
        Ok(result.rows_affected())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresUnit { tx }))
    }

    async fn find_transaction_view(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionView>, StoreError> {
        let row = sqlx::query("SELECT * FROM transaction_view WHERE transaction_id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_transaction_view", e))?;

        row.map(|r| view_from_row(&r)).transpose()
    }

    async fn transaction_views(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionView>, StoreError> {
        let account: Option<i64> = match filter {
            TransactionFilter::All => None,
            TransactionFilter::Account(n) => Some(n.get()),
        };

        let rows = sqlx::query(
            r#"
            SELECT * FROM transaction_view
            WHERE ($1::bigint IS NULL OR sender_acc = $1 OR receiver_acc = $1)
            ORDER BY date ASC, transaction_id ASC
            "#,
        )
        .bind(account)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("transaction_views", e))?;

        rows.iter().map(view_from_row).collect()
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                Some("23503") => StoreError::Referenced(msg),
                Some("22001") | Some("22003") => StoreError::OutOfRange(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Backend(format!("timed out acquiring a connection in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn money_column(row: &PgRow, column: &str) -> Result<Money, StoreError> {
    let value: Decimal = row
        .try_get(column)
        .map_err(|e| StoreError::Backend(format!("failed to read {column}: {e}")))?;
    Money::new(value).map_err(|e| StoreError::Backend(format!("bad amount in {column}: {e}")))
}

// SQLx row types

#[derive(Debug)]
struct AccountRow {
    id: i64,
    first_name: String,
    last_name: String,
    acc_number: i64,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for AccountRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountRow {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            acc_number: row.try_get("acc_number")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let r = AccountRow::from_row(row)
        .map_err(|e| StoreError::Backend(format!("failed to deserialize account row: {}", e)))?;
    Ok(Account {
        id: AccountId::new(r.id),
        first_name: r.first_name,
        last_name: r.last_name,
        account_number: AccountNumber::new(r.acc_number),
        email: r.email,
        password_hash: r.password,
        balance: money_column(row, "balance")?,
        created_at: r.created_at,
    })
}

fn party_from_row(row: &PgRow, prefix: &str) -> Result<PartySnapshot, StoreError> {
    let read = |e: sqlx::Error| {
        StoreError::Backend(format!("failed to deserialize {prefix} columns: {e}"))
    };
    let account_number: i64 = row.try_get(format!("{prefix}_acc").as_str()).map_err(read)?;
    Ok(PartySnapshot {
        account_number: AccountNumber::new(account_number),
        first_name: row.try_get(format!("{prefix}_fn").as_str()).map_err(read)?,
        last_name: row.try_get(format!("{prefix}_ln").as_str()).map_err(read)?,
        balance: money_column(row, &format!("{prefix}_balance"))?,
        email: row.try_get(format!("{prefix}_email").as_str()).map_err(read)?,
    })
}

fn view_from_row(row: &PgRow) -> Result<TransactionView, StoreError> {
    let read =
        |e: sqlx::Error| StoreError::Backend(format!("failed to deserialize transaction row: {e}"));
    let id: Uuid = row.try_get("transaction_id").map_err(read)?;
    Ok(TransactionView {
        id: TransactionId::from_uuid(id),
        sender_account: party_from_row(row, "sender")?,
        receiver_account: party_from_row(row, "receiver")?,
        amount: money_column(row, "amount")?,
        status: row.try_get("status").map_err(read)?,
        description: row.try_get("description").map_err(read)?,
        date: row.try_get("date").map_err(read)?,
    })
}
