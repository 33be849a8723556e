//! Database layer — migrations, registry queries, event storage and cursor management.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqliteConnection, SqlitePool,
};
use tracing::{debug, info};

use crate::errors::{RegistryError, Result};
use crate::events::{EventRecord, SubsidyEvent};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

/// Single-connection in-memory pool with migrations applied.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

// ─────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GovernmentRecord {
    pub id: i64,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProducerRecord {
    pub id: i64,
    pub address: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OracleRecord {
    pub id: i64,
    pub address: String,
    pub name: String,
}

/// A registered subsidy with its linked identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsidyRecord {
    pub id: i64,
    pub name: String,
    pub contract_address: String,
    pub created_at: i64,
    pub government: GovernmentRecord,
    pub producer: ProducerRecord,
    pub oracles: Vec<OracleRecord>,
}

/// Input for [`register_subsidy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubsidy {
    pub name: String,
    pub government_address: String,
    pub producer_address: String,
    pub oracles: Vec<String>,
    pub contract_address: String,
    /// Ledger of the deployment transaction; the indexer backfills from it.
    #[serde(default)]
    pub deployed_ledger: Option<i64>,
}

/// Outcome of [`register_subsidy`]: `created` is false for a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub record: SubsidyRecord,
    pub created: bool,
}

/// A registered contract and how far its events have been indexed.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct WatchedContract {
    pub contract_address: String,
    pub deployed_ledger: Option<i64>,
    pub indexed_ledger: Option<i64>,
}

/// Which subsidies a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsidyFilter<'a> {
    All,
    Government(&'a str),
    Producer(&'a str),
    Oracle(&'a str),
}

#[derive(sqlx::FromRow)]
struct SubsidyRow {
    id: i64,
    name: String,
    contract_address: String,
    created_at: i64,
    government_id: i64,
    government_address: String,
    producer_id: i64,
    producer_address: String,
    producer_name: Option<String>,
}

const SUBSIDY_SELECT: &str = r#"
    SELECT s.id, s.name, s.contract_address, s.created_at,
           g.id AS government_id, g.address AS government_address,
           p.id AS producer_id, p.address AS producer_address, p.name AS producer_name
    FROM   subsidies s
    JOIN   governments g ON g.id = s.government_id
    JOIN   producers   p ON p.id = s.producer_id
"#;

// ─────────────────────────────────────────────────────────
// Governments
// ─────────────────────────────────────────────────────────

async fn upsert_government(conn: &mut SqliteConnection, address: &str) -> Result<i64> {
    sqlx::query("INSERT OR IGNORE INTO governments (address) VALUES (?1)")
        .bind(address)
        .execute(&mut *conn)
        .await?;
    let (id,): (i64,) = sqlx::query_as("SELECT id FROM governments WHERE address = ?1")
        .bind(address)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

/// Make sure `address` is known as a government (used to seed from config).
pub async fn ensure_government(pool: &SqlitePool, address: &str) -> Result<i64> {
    let mut conn = pool.acquire().await?;
    upsert_government(&mut conn, address).await
}

pub async fn find_government(pool: &SqlitePool, address: &str) -> Result<Option<GovernmentRecord>> {
    let row = sqlx::query_as::<_, GovernmentRecord>(
        "SELECT id, address FROM governments WHERE address = ?1",
    )
    .bind(address)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// ─────────────────────────────────────────────────────────
// Producers
// ─────────────────────────────────────────────────────────

async fn upsert_producer(conn: &mut SqliteConnection, address: &str) -> Result<i64> {
    sqlx::query("INSERT OR IGNORE INTO producers (address) VALUES (?1)")
        .bind(address)
        .execute(&mut *conn)
        .await?;
    let (id,): (i64,) = sqlx::query_as("SELECT id FROM producers WHERE address = ?1")
        .bind(address)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

/// Create a producer, or rename it when the address is already known.
pub async fn save_producer(
    pool: &SqlitePool,
    address: &str,
    name: Option<&str>,
) -> Result<ProducerRecord> {
    sqlx::query(
        r#"
        INSERT INTO producers (address, name) VALUES (?1, ?2)
        ON CONFLICT (address) DO UPDATE SET name = COALESCE(excluded.name, producers.name)
        "#,
    )
    .bind(address)
    .bind(name)
    .execute(pool)
    .await?;

    find_producer(pool, address)
        .await?
        .ok_or_else(|| RegistryError::NotFound(format!("producer {address}")))
}

pub async fn find_producer(pool: &SqlitePool, address: &str) -> Result<Option<ProducerRecord>> {
    let row = sqlx::query_as::<_, ProducerRecord>(
        "SELECT id, address, name FROM producers WHERE address = ?1",
    )
    .bind(address)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_producers(pool: &SqlitePool) -> Result<Vec<ProducerRecord>> {
    let rows = sqlx::query_as::<_, ProducerRecord>(
        "SELECT id, address, name FROM producers ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Oracles
// ─────────────────────────────────────────────────────────

/// Create an oracle, or rename it when the address is already known.
pub async fn save_oracle(pool: &SqlitePool, address: &str, name: &str) -> Result<OracleRecord> {
    sqlx::query(
        r#"
        INSERT INTO oracles (address, name) VALUES (?1, ?2)
        ON CONFLICT (address) DO UPDATE SET name = excluded.name
        "#,
    )
    .bind(address)
    .bind(name)
    .execute(pool)
    .await?;

    find_oracle(pool, address)
        .await?
        .ok_or_else(|| RegistryError::NotFound(format!("oracle {address}")))
}

pub async fn find_oracle(pool: &SqlitePool, address: &str) -> Result<Option<OracleRecord>> {
    let row = sqlx::query_as::<_, OracleRecord>(
        "SELECT id, address, name FROM oracles WHERE address = ?1",
    )
    .bind(address)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_oracles(pool: &SqlitePool) -> Result<Vec<OracleRecord>> {
    let rows = sqlx::query_as::<_, OracleRecord>(
        "SELECT id, address, name FROM oracles ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Subsidies
// ─────────────────────────────────────────────────────────

/// Register the off-chain record of a deployed subsidy contract.
///
/// Government and producer are created on first sight; only oracles that are
/// already registered get linked. The contract address is the join key: a
/// retry for an already registered contract returns the existing record
/// unchanged.
pub async fn register_subsidy(pool: &SqlitePool, new: &NewSubsidy) -> Result<Registration> {
    let mut tx = pool.begin().await?;

    let government_id = upsert_government(&mut tx, &new.government_address).await?;
    let producer_id = upsert_producer(&mut tx, &new.producer_address).await?;

    let inserted = sqlx::query(
        r#"
        INSERT OR IGNORE INTO subsidies
            (name, government_id, producer_id, contract_address, deployed_ledger)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&new.name)
    .bind(government_id)
    .bind(producer_id)
    .bind(&new.contract_address)
    .bind(new.deployed_ledger)
    .execute(&mut *tx)
    .await?;

    let created = inserted.rows_affected() > 0;
    if created {
        let subsidy_id = inserted.last_insert_rowid();
        for oracle in &new.oracles {
            let linked = sqlx::query(
                r#"
                INSERT OR IGNORE INTO subsidy_oracles (subsidy_id, oracle_id)
                SELECT ?1, id FROM oracles WHERE address = ?2
                "#,
            )
            .bind(subsidy_id)
            .bind(oracle)
            .execute(&mut *tx)
            .await?;
            if linked.rows_affected() == 0 {
                debug!("Skipping unregistered oracle {oracle}");
            }
        }
    } else {
        info!(
            "Subsidy for contract {} already registered",
            new.contract_address
        );
    }

    tx.commit().await?;

    let record = find_subsidy(pool, &new.contract_address)
        .await?
        .ok_or_else(|| RegistryError::NotFound(format!("subsidy {}", new.contract_address)))?;
    Ok(Registration { record, created })
}

pub async fn find_subsidy(pool: &SqlitePool, contract_address: &str) -> Result<Option<SubsidyRecord>> {
    let sql = format!("{SUBSIDY_SELECT} WHERE s.contract_address = ?1");
    let row = sqlx::query_as::<_, SubsidyRow>(&sql)
        .bind(contract_address)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(hydrate(pool, row).await?)),
        None => Ok(None),
    }
}

/// List subsidies matching `filter`, newest first.
pub async fn list_subsidies(pool: &SqlitePool, filter: SubsidyFilter<'_>) -> Result<Vec<SubsidyRecord>> {
    let (clause, address) = match filter {
        SubsidyFilter::All => ("", None),
        SubsidyFilter::Government(a) => ("WHERE g.address = ?1", Some(a)),
        SubsidyFilter::Producer(a) => ("WHERE p.address = ?1", Some(a)),
        SubsidyFilter::Oracle(a) => (
            r#"WHERE s.id IN (
                   SELECT so.subsidy_id FROM subsidy_oracles so
                   JOIN   oracles o ON o.id = so.oracle_id
                   WHERE  o.address = ?1)"#,
            Some(a),
        ),
    };
    let sql = format!("{SUBSIDY_SELECT} {clause} ORDER BY s.id DESC");

    let mut query = sqlx::query_as::<_, SubsidyRow>(&sql);
    if let Some(address) = address {
        query = query.bind(address);
    }
    let rows = query.fetch_all(pool).await?;

    let mut subsidies = Vec::with_capacity(rows.len());
    for row in rows {
        subsidies.push(hydrate(pool, row).await?);
    }
    Ok(subsidies)
}

/// Display name of the subsidy deployed at `contract_address`, if registered.
pub async fn subsidy_name(pool: &SqlitePool, contract_address: &str) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM subsidies WHERE contract_address = ?1")
            .bind(contract_address)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(name,)| name))
}

/// Every registered contract with its indexing progress, oldest registration first.
pub async fn list_watched_contracts(pool: &SqlitePool) -> Result<Vec<WatchedContract>> {
    let rows = sqlx::query_as::<_, WatchedContract>(
        r#"
        SELECT contract_address, deployed_ledger, indexed_ledger
        FROM   subsidies
        ORDER  BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Record that events of `contracts` have been indexed up to `ledger`.
/// Progress never moves backwards.
pub async fn mark_indexed(pool: &SqlitePool, contracts: &[String], ledger: i64) -> Result<()> {
    let mut tx = pool.begin().await?;
    for contract in contracts {
        sqlx::query(
            r#"
            UPDATE subsidies
            SET    indexed_ledger = MAX(COALESCE(indexed_ledger, 0), ?1)
            WHERE  contract_address = ?2
            "#,
        )
        .bind(ledger)
        .bind(contract)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

async fn hydrate(pool: &SqlitePool, row: SubsidyRow) -> Result<SubsidyRecord> {
    let oracles = sqlx::query_as::<_, OracleRecord>(
        r#"
        SELECT o.id, o.address, o.name
        FROM   oracles o
        JOIN   subsidy_oracles so ON so.oracle_id = o.id
        WHERE  so.subsidy_id = ?1
        ORDER  BY o.id ASC
        "#,
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    Ok(SubsidyRecord {
        id: row.id,
        name: row.name,
        contract_address: row.contract_address,
        created_at: row.created_at,
        government: GovernmentRecord {
            id: row.government_id,
            address: row.government_address,
        },
        producer: ProducerRecord {
            id: row.producer_id,
            address: row.producer_address,
            name: row.producer_name,
        },
        oracles,
    })
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the last-seen ledger from the cursor row.
/// Returns `0` when no cursor has been persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Persist the last-seen ledger.
pub async fn save_cursor(pool: &SqlitePool, last_ledger: i64) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1 WHERE id = 1")
        .bind(last_ledger)
        .execute(pool)
        .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events in one transaction. Events whose
/// `event_key` is already stored are silently ignored, which keeps re-polled
/// ledgers idempotent.
pub async fn insert_events(pool: &SqlitePool, events: &[SubsidyEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_key, event_type, contract_id, milestone_id, actor, amount,
                 ledger, timestamp, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&ev.event_key)
        .bind(&ev.event_type)
        .bind(&ev.contract_id)
        .bind(ev.milestone_id)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        count += rows_affected as usize;
    }
    tx.commit().await?;
    Ok(count)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// Fetch all events for one subsidy contract, ordered by ledger ascending.
pub async fn get_events_for_contract(
    pool: &SqlitePool,
    contract_id: &str,
) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, event_key, event_type, contract_id, milestone_id, actor, amount,
               ledger, timestamp, tx_hash, created_at
        FROM   events
        WHERE  contract_id = ?1
        ORDER  BY ledger ASC, id ASC
        "#,
    )
    .bind(contract_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch all events, ordered by ledger ascending.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, event_key, event_type, contract_id, milestone_id, actor, amount,
               ledger, timestamp, tx_hash, created_at
        FROM   events
        ORDER  BY ledger ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOV: &str = "GAGOVERNMENTAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const PRODUCER: &str = "GAPRODUCERAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const ORACLE: &str = "GAORACLEAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const CONTRACT: &str = "CACONTRACTAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    fn new_subsidy(contract: &str, oracles: &[&str]) -> NewSubsidy {
        NewSubsidy {
            name: "Green H2 Valley".to_string(),
            government_address: GOV.to_string(),
            producer_address: PRODUCER.to_string(),
            oracles: oracles.iter().map(|o| o.to_string()).collect(),
            contract_address: contract.to_string(),
            deployed_ledger: None,
        }
    }

    fn event(key: &str, contract: &str, ledger: i64) -> SubsidyEvent {
        SubsidyEvent {
            event_key: key.to_string(),
            event_type: "milestone_claimed".to_string(),
            contract_id: contract.to_string(),
            milestone_id: Some(0),
            actor: Some(PRODUCER.to_string()),
            amount: Some("100".to_string()),
            ledger,
            timestamp: 1_704_067_200,
            tx_hash: None,
        }
    }

    #[tokio::test]
    async fn register_subsidy_links_known_oracles_only() {
        let pool = memory_pool().await;
        save_oracle(&pool, ORACLE, "Lab One").await.unwrap();
        let unknown = "GAUNKNOWNAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

        let Registration { record, created } =
            register_subsidy(&pool, &new_subsidy(CONTRACT, &[ORACLE, unknown]))
                .await
                .unwrap();

        assert!(created);
        assert_eq!(record.name, "Green H2 Valley");
        assert_eq!(record.government.address, GOV);
        assert_eq!(record.producer.address, PRODUCER);
        assert_eq!(record.producer.name, None);
        assert_eq!(record.oracles.len(), 1);
        assert_eq!(record.oracles[0].address, ORACLE);
        assert!(find_government(&pool, GOV).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn register_subsidy_retry_returns_existing_record() {
        let pool = memory_pool().await;
        let first = register_subsidy(&pool, &new_subsidy(CONTRACT, &[])).await.unwrap();

        let mut retry = new_subsidy(CONTRACT, &[]);
        retry.name = "Renamed".to_string();
        let second = register_subsidy(&pool, &retry).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.record, second.record);
        assert_eq!(list_subsidies(&pool, SubsidyFilter::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_subsidies_filters_by_party() {
        let pool = memory_pool().await;
        save_oracle(&pool, ORACLE, "Lab One").await.unwrap();
        let other_contract = "CAOTHERAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        register_subsidy(&pool, &new_subsidy(CONTRACT, &[ORACLE])).await.unwrap();
        register_subsidy(&pool, &new_subsidy(other_contract, &[])).await.unwrap();

        let all = list_subsidies(&pool, SubsidyFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);
        // Newest first.
        assert_eq!(all[0].contract_address, other_contract);

        let by_gov = list_subsidies(&pool, SubsidyFilter::Government(GOV)).await.unwrap();
        assert_eq!(by_gov.len(), 2);
        let by_producer = list_subsidies(&pool, SubsidyFilter::Producer(PRODUCER)).await.unwrap();
        assert_eq!(by_producer.len(), 2);
        let by_oracle = list_subsidies(&pool, SubsidyFilter::Oracle(ORACLE)).await.unwrap();
        assert_eq!(by_oracle.len(), 1);
        assert_eq!(by_oracle[0].contract_address, CONTRACT);
        let none = list_subsidies(&pool, SubsidyFilter::Producer(ORACLE)).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn subsidy_name_lookup() {
        let pool = memory_pool().await;
        assert_eq!(subsidy_name(&pool, CONTRACT).await.unwrap(), None);

        register_subsidy(&pool, &new_subsidy(CONTRACT, &[])).await.unwrap();
        assert_eq!(
            subsidy_name(&pool, CONTRACT).await.unwrap().as_deref(),
            Some("Green H2 Valley")
        );
    }

    #[tokio::test]
    async fn watched_contracts_track_indexing_progress() {
        let pool = memory_pool().await;
        let other_contract = "CAOTHERAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        let mut deployed = new_subsidy(CONTRACT, &[]);
        deployed.deployed_ledger = Some(900);
        register_subsidy(&pool, &deployed).await.unwrap();
        register_subsidy(&pool, &new_subsidy(other_contract, &[])).await.unwrap();

        let watched = list_watched_contracts(&pool).await.unwrap();
        assert_eq!(
            watched,
            vec![
                WatchedContract {
                    contract_address: CONTRACT.to_string(),
                    deployed_ledger: Some(900),
                    indexed_ledger: None,
                },
                WatchedContract {
                    contract_address: other_contract.to_string(),
                    deployed_ledger: None,
                    indexed_ledger: None,
                },
            ]
        );

        mark_indexed(&pool, &[CONTRACT.to_string()], 1_000).await.unwrap();
        // Progress never moves backwards.
        mark_indexed(&pool, &[CONTRACT.to_string()], 950).await.unwrap();

        let watched = list_watched_contracts(&pool).await.unwrap();
        assert_eq!(watched[0].indexed_ledger, Some(1_000));
        assert_eq!(watched[1].indexed_ledger, None);
    }

    #[tokio::test]
    async fn save_producer_renames_existing_address() {
        let pool = memory_pool().await;
        let created = save_producer(&pool, PRODUCER, None).await.unwrap();
        assert_eq!(created.name, None);

        let named = save_producer(&pool, PRODUCER, Some("H2 Works")).await.unwrap();
        assert_eq!(named.id, created.id);
        assert_eq!(named.name.as_deref(), Some("H2 Works"));

        // A nameless save keeps the existing name.
        let again = save_producer(&pool, PRODUCER, None).await.unwrap();
        assert_eq!(again.name.as_deref(), Some("H2 Works"));
        assert_eq!(list_producers(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_events_is_idempotent() {
        let pool = memory_pool().await;
        let batch = vec![event("evt-1", CONTRACT, 10), event("evt-2", CONTRACT, 11)];

        assert_eq!(insert_events(&pool, &batch).await.unwrap(), 2);
        assert_eq!(insert_events(&pool, &batch).await.unwrap(), 0);

        let stored = get_events_for_contract(&pool, CONTRACT).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].event_key, "evt-1");
        assert_eq!(stored[1].ledger, 11);
        assert!(get_events_for_contract(&pool, "CNOPE").await.unwrap().is_empty());
        assert_eq!(get_all_events(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn insert_events_rolls_back_a_failed_page() {
        let pool = memory_pool().await;
        sqlx::query(
            r#"
            CREATE TRIGGER reject_poisoned BEFORE INSERT ON events
            WHEN NEW.event_key = 'evt-bad'
            BEGIN SELECT RAISE(ABORT, 'rejected'); END
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let page = vec![event("evt-1", CONTRACT, 10), event("evt-bad", CONTRACT, 11)];
        assert!(insert_events(&pool, &page).await.is_err());
        assert!(get_all_events(&pool).await.unwrap().is_empty());

        // The retried page without the bad row lands whole.
        assert_eq!(insert_events(&pool, &page[..1]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cursor_round_trip() {
        let pool = memory_pool().await;
        assert_eq!(get_last_ledger(&pool).await.unwrap(), 0);

        save_cursor(&pool, 4_242).await.unwrap();
        assert_eq!(get_last_ledger(&pool).await.unwrap(), 4_242);
    }
}
