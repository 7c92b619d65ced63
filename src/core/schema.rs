//! Schema bootstrap for the DDoS catalogue.
//!
//! The catalogue manages its own two tables instead of relying on external
//! migration tooling. All statements are idempotent so `create_tables` can
//! be called against a database that is already initialized.

use log::info;
use sqlx::PgPool;

/// Enum types plus the two tables, created in dependency order.
const CREATE_SCHEMA_SQL: &str = r#"
DO $$ BEGIN
    CREATE TYPE attack_frequency AS ENUM ('low', 'medium', 'high', 'very_high');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

DO $$ BEGIN
    CREATE TYPE attack_danger AS ENUM ('low', 'medium', 'high', 'critical');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

DO $$ BEGIN
    CREATE TYPE attack_type AS ENUM ('volumetric', 'protocol', 'application', 'amplification');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

DO $$ BEGIN
    CREATE TYPE target_protocol AS ENUM ('http', 'https', 'tcp', 'udp', 'ssh', 'dns');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

CREATE TABLE IF NOT EXISTS ddos_attacks (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL,
    frequency attack_frequency NOT NULL,
    danger attack_danger NOT NULL,
    attack_type attack_type NOT NULL,
    source_ips TEXT[] NOT NULL DEFAULT '{}',
    affected_ports INTEGER[] NOT NULL DEFAULT '{}',
    mitigation_strategies TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS targets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    attack_id UUID NOT NULL REFERENCES ddos_attacks(id) ON DELETE CASCADE,
    target_ip TEXT NOT NULL,
    target_domain TEXT,
    port INTEGER,
    protocol target_protocol,
    tags TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

/// Children before parents, tables before the types they use.
const DROP_SCHEMA_SQL: &str = r#"
DROP TABLE IF EXISTS targets;
DROP TABLE IF EXISTS ddos_attacks;
DROP TYPE IF EXISTS target_protocol;
DROP TYPE IF EXISTS attack_type;
DROP TYPE IF EXISTS attack_danger;
DROP TYPE IF EXISTS attack_frequency;
"#;

/// Create enum types and both tables in a single transaction.
pub async fn create_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::raw_sql(CREATE_SCHEMA_SQL).execute(&mut *tx).await?;
    tx.commit().await?;
    info!("Schema created (ddos_attacks, targets)");
    Ok(())
}

/// Drop both tables and the enum types in a single transaction.
pub async fn drop_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::raw_sql(DROP_SCHEMA_SQL).execute(&mut *tx).await?;
    tx.commit().await?;
    info!("Schema dropped");
    Ok(())
}

/// Whether both catalogue tables exist.
pub async fn tables_exist(pool: &PgPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT to_regclass('public.ddos_attacks') IS NOT NULL
            AND to_regclass('public.targets') IS NOT NULL",
    )
    .fetch_one(pool)
    .await
}

pub async fn count_attacks(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM ddos_attacks")
        .fetch_one(pool)
        .await
}

pub async fn count_targets(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM targets")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PgPoolOptions::new().connect(&url).await.unwrap()
    }

    #[tokio::test]
    #[ignore] // needs a local Postgres
    async fn test_create_is_idempotent() {
        let pool = test_pool().await;
        create_tables(&pool).await.unwrap();
        create_tables(&pool).await.unwrap();
        assert!(tables_exist(&pool).await.unwrap());
    }

    #[tokio::test]
    #[ignore] // needs a local Postgres
    async fn test_drop_then_status() {
        let pool = test_pool().await;
        create_tables(&pool).await.unwrap();
        drop_tables(&pool).await.unwrap();
        assert!(!tables_exist(&pool).await.unwrap());
    }
}
