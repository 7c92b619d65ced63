//! Attack repository: query-level access to the `ddos_attacks` table.
//!
//! The pool is injected through the constructor; methods that must run
//! inside a caller-managed transaction take an executor instead.

use std::collections::HashMap;

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::{
    Attack, AttackDanger, AttackFilter, AttackFrequency, AttackStats, AttackType, AttackUpdate,
    AvailableFilters, NewAttack, Protocol,
};

const SELECT_ATTACK: &str = "SELECT id, name, frequency, danger, attack_type, source_ips, \
     affected_ports, mitigation_strategies, created_at, updated_at FROM ddos_attacks";

/// Repository for attack rows
#[derive(Clone)]
pub struct AttackRepository {
    pool: PgPool,
}

impl AttackRepository {
    /// Create a new repository backed by the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one attack and return the stored row with generated id and
    /// timestamps. Runs on the caller's executor so it can join a transaction.
    pub async fn create(
        &self,
        executor: impl PgExecutor<'_>,
        attack: &NewAttack,
    ) -> Result<Attack, sqlx::Error> {
        sqlx::query_as::<_, Attack>(
            "INSERT INTO ddos_attacks \
                 (name, frequency, danger, attack_type, source_ips, affected_ports, mitigation_strategies) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(&attack.name)
        .bind(attack.frequency)
        .bind(attack.danger)
        .bind(attack.attack_type)
        .bind(&attack.source_ips)
        .bind(&attack.affected_ports)
        .bind(&attack.mitigation_strategies)
        .fetch_one(executor)
        .await
    }

    /// All attacks, newest first
    pub async fn find_all(&self) -> Result<Vec<Attack>, sqlx::Error> {
        sqlx::query_as::<_, Attack>(&format!("{SELECT_ATTACK} ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Attack>, sqlx::Error> {
        sqlx::query_as::<_, Attack>(&format!("{SELECT_ATTACK} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Partial update: absent fields keep their stored value, `updated_at`
    /// is always refreshed. Returns `None` when the id does not exist.
    pub async fn update(
        &self,
        executor: impl PgExecutor<'_>,
        id: Uuid,
        update: &AttackUpdate,
    ) -> Result<Option<Attack>, sqlx::Error> {
        sqlx::query_as::<_, Attack>(
            "UPDATE ddos_attacks SET \
                 name = COALESCE($2, name), \
                 frequency = COALESCE($3, frequency), \
                 danger = COALESCE($4, danger), \
                 attack_type = COALESCE($5, attack_type), \
                 source_ips = COALESCE($6, source_ips), \
                 affected_ports = COALESCE($7, affected_ports), \
                 mitigation_strategies = COALESCE($8, mitigation_strategies), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(&update.name)
        .bind(update.frequency)
        .bind(update.danger)
        .bind(update.attack_type)
        .bind(&update.source_ips)
        .bind(&update.affected_ports)
        .bind(&update.mitigation_strategies)
        .fetch_optional(executor)
        .await
    }

    /// Delete one attack; owned targets go with it via the cascading
    /// foreign key. Returns whether a row was removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ddos_attacks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Conjunction over the optional filter criteria. Each enum criterion is
    /// a set-membership check; the protocol criterion matches attacks with at
    /// least one target using one of the requested protocols.
    pub async fn find_by_filters(&self, filter: &AttackFilter) -> Result<Vec<Attack>, sqlx::Error> {
        sqlx::query_as::<_, Attack>(
            "SELECT a.* FROM ddos_attacks a \
             WHERE ($1::attack_frequency[] IS NULL OR a.frequency = ANY($1)) \
               AND ($2::attack_danger[] IS NULL OR a.danger = ANY($2)) \
               AND ($3::attack_type[] IS NULL OR a.attack_type = ANY($3)) \
               AND ($4::target_protocol[] IS NULL OR EXISTS ( \
                        SELECT 1 FROM targets t \
                        WHERE t.attack_id = a.id AND t.protocol = ANY($4))) \
               AND ($5::timestamptz IS NULL OR a.created_at >= $5) \
               AND ($6::timestamptz IS NULL OR a.created_at <= $6) \
               AND ($7::text IS NULL OR a.name ILIKE '%' || $7 || '%') \
             ORDER BY a.created_at DESC",
        )
        .bind(&filter.frequency)
        .bind(&filter.danger)
        .bind(&filter.attack_type)
        .bind(&filter.protocol)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(&filter.search)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_frequency(
        &self,
        frequency: AttackFrequency,
    ) -> Result<Vec<Attack>, sqlx::Error> {
        sqlx::query_as::<_, Attack>(&format!(
            "{SELECT_ATTACK} WHERE frequency = $1 ORDER BY created_at DESC"
        ))
        .bind(frequency)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_danger(&self, danger: AttackDanger) -> Result<Vec<Attack>, sqlx::Error> {
        sqlx::query_as::<_, Attack>(&format!(
            "{SELECT_ATTACK} WHERE danger = $1 ORDER BY created_at DESC"
        ))
        .bind(danger)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_type(&self, attack_type: AttackType) -> Result<Vec<Attack>, sqlx::Error> {
        sqlx::query_as::<_, Attack>(&format!(
            "{SELECT_ATTACK} WHERE attack_type = $1 ORDER BY created_at DESC"
        ))
        .bind(attack_type)
        .fetch_all(&self.pool)
        .await
    }

    /// Attacks having at least one target with the given protocol
    pub async fn find_by_protocol(&self, protocol: Protocol) -> Result<Vec<Attack>, sqlx::Error> {
        sqlx::query_as::<_, Attack>(
            "SELECT a.* FROM ddos_attacks a \
             WHERE EXISTS (SELECT 1 FROM targets t \
                           WHERE t.attack_id = a.id AND t.protocol = $1) \
             ORDER BY a.created_at DESC",
        )
        .bind(protocol)
        .fetch_all(&self.pool)
        .await
    }

    /// Total count, per-enum-value counts (every variant present, zero when
    /// unobserved) and the count of attacks created in the last 7 days.
    pub async fn get_stats(&self) -> Result<AttackStats, sqlx::Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ddos_attacks")
            .fetch_one(&self.pool)
            .await?;

        let mut by_frequency: HashMap<String, i64> = AttackFrequency::ALL
            .iter()
            .map(|v| (v.as_str().to_string(), 0))
            .collect();
        let rows: Vec<(AttackFrequency, i64)> =
            sqlx::query_as("SELECT frequency, COUNT(*) FROM ddos_attacks GROUP BY frequency")
                .fetch_all(&self.pool)
                .await?;
        for (value, count) in rows {
            by_frequency.insert(value.as_str().to_string(), count);
        }

        let mut by_danger: HashMap<String, i64> = AttackDanger::ALL
            .iter()
            .map(|v| (v.as_str().to_string(), 0))
            .collect();
        let rows: Vec<(AttackDanger, i64)> =
            sqlx::query_as("SELECT danger, COUNT(*) FROM ddos_attacks GROUP BY danger")
                .fetch_all(&self.pool)
                .await?;
        for (value, count) in rows {
            by_danger.insert(value.as_str().to_string(), count);
        }

        let mut by_type: HashMap<String, i64> = AttackType::ALL
            .iter()
            .map(|v| (v.as_str().to_string(), 0))
            .collect();
        let rows: Vec<(AttackType, i64)> =
            sqlx::query_as("SELECT attack_type, COUNT(*) FROM ddos_attacks GROUP BY attack_type")
                .fetch_all(&self.pool)
                .await?;
        for (value, count) in rows {
            by_type.insert(value.as_str().to_string(), count);
        }

        let recent: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ddos_attacks WHERE created_at >= now() - interval '7 days'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AttackStats {
            total,
            by_frequency,
            by_danger,
            by_type,
            recent,
        })
    }

    /// Distinct enum values observed across stored rows, plus distinct
    /// non-null protocols from the targets table.
    pub async fn get_available_filters(&self) -> Result<AvailableFilters, sqlx::Error> {
        let frequencies: Vec<AttackFrequency> =
            sqlx::query_scalar("SELECT DISTINCT frequency FROM ddos_attacks ORDER BY frequency")
                .fetch_all(&self.pool)
                .await?;
        let dangers: Vec<AttackDanger> =
            sqlx::query_scalar("SELECT DISTINCT danger FROM ddos_attacks ORDER BY danger")
                .fetch_all(&self.pool)
                .await?;
        let attack_types: Vec<AttackType> =
            sqlx::query_scalar("SELECT DISTINCT attack_type FROM ddos_attacks ORDER BY attack_type")
                .fetch_all(&self.pool)
                .await?;
        let protocols: Vec<Protocol> = sqlx::query_scalar(
            "SELECT DISTINCT protocol FROM targets WHERE protocol IS NOT NULL ORDER BY protocol",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(AvailableFilters {
            frequencies,
            dangers,
            attack_types,
            protocols,
        })
    }
}
