//! Target repository: query-level access to the `targets` table.

use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::{NewTarget, Target, TargetUpdate};

/// Repository for target rows
#[derive(Clone)]
pub struct TargetRepository {
    pool: PgPool,
}

impl TargetRepository {
    /// Create a new repository backed by the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one target for an attack
    pub async fn create(
        &self,
        executor: impl PgExecutor<'_>,
        attack_id: Uuid,
        target: &NewTarget,
    ) -> Result<Target, sqlx::Error> {
        sqlx::query_as::<_, Target>(
            "INSERT INTO targets (attack_id, target_ip, target_domain, port, protocol, tags) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(attack_id)
        .bind(&target.target_ip)
        .bind(&target.target_domain)
        .bind(target.port)
        .bind(target.protocol)
        .bind(&target.tags)
        .fetch_one(executor)
        .await
    }

    /// Insert a batch of targets on the caller's transaction connection,
    /// preserving input order. Tag lists default to empty on the way in.
    pub async fn create_multiple(
        &self,
        conn: &mut PgConnection,
        attack_id: Uuid,
        targets: &[NewTarget],
    ) -> Result<Vec<Target>, sqlx::Error> {
        let mut created = Vec::with_capacity(targets.len());
        for target in targets {
            created.push(self.create(&mut *conn, attack_id, target).await?);
        }
        Ok(created)
    }

    /// Partial update; returns `None` when the id does not exist.
    pub async fn update(
        &self,
        executor: impl PgExecutor<'_>,
        id: Uuid,
        update: &TargetUpdate,
    ) -> Result<Option<Target>, sqlx::Error> {
        sqlx::query_as::<_, Target>(
            "UPDATE targets SET \
                 target_ip = COALESCE($2, target_ip), \
                 target_domain = COALESCE($3, target_domain), \
                 port = COALESCE($4, port), \
                 protocol = COALESCE($5, protocol), \
                 tags = COALESCE($6, tags) \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(&update.target_ip)
        .bind(&update.target_domain)
        .bind(update.port)
        .bind(update.protocol)
        .bind(&update.tags)
        .fetch_optional(executor)
        .await
    }

    /// Apply a sequence of per-row updates inside one transaction,
    /// collecting the rows that existed. Missing ids are skipped rather
    /// than failing the batch.
    pub async fn update_multiple(
        &self,
        updates: &[(Uuid, TargetUpdate)],
    ) -> Result<Vec<Target>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut updated = Vec::with_capacity(updates.len());
        for (id, update) in updates {
            if let Some(target) = self.update(&mut *tx, *id, update).await? {
                updated.push(target);
            }
        }
        tx.commit().await?;
        Ok(updated)
    }

    /// All targets owned by one attack, oldest first
    pub async fn find_by_attack_id(
        &self,
        executor: impl PgExecutor<'_>,
        attack_id: Uuid,
    ) -> Result<Vec<Target>, sqlx::Error> {
        sqlx::query_as::<_, Target>(
            "SELECT id, attack_id, target_ip, target_domain, port, protocol, tags, created_at \
             FROM targets WHERE attack_id = $1 ORDER BY created_at",
        )
        .bind(attack_id)
        .fetch_all(executor)
        .await
    }

    /// Bulk delete of an attack's targets; returns whether any row was removed.
    pub async fn delete_by_attack_id(
        &self,
        executor: impl PgExecutor<'_>,
        attack_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM targets WHERE attack_id = $1")
            .bind(attack_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{schema, AttackRepository};
    use crate::models::{AttackDanger, AttackFrequency, AttackType, NewAttack, Protocol};
    use sqlx::postgres::PgPoolOptions;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new().connect(&url).await.unwrap();
        schema::drop_tables(&pool).await.unwrap();
        schema::create_tables(&pool).await.unwrap();
        pool
    }

    async fn insert_attack(pool: &PgPool) -> Uuid {
        let repo = AttackRepository::new(pool.clone());
        let attack = repo
            .create(
                pool,
                &NewAttack {
                    name: "DNS amplification".to_string(),
                    frequency: AttackFrequency::Medium,
                    danger: AttackDanger::High,
                    attack_type: AttackType::Amplification,
                    source_ips: vec![],
                    affected_ports: vec![53],
                    mitigation_strategies: vec![],
                },
            )
            .await
            .unwrap();
        attack.id
    }

    #[tokio::test]
    #[ignore] // needs a local Postgres
    async fn test_update_multiple_collects_existing_rows() {
        let pool = test_pool().await;
        let attack_id = insert_attack(&pool).await;
        let repo = TargetRepository::new(pool.clone());

        let target = repo
            .create(
                &pool,
                attack_id,
                &NewTarget {
                    target_ip: "1.2.3.4".to_string(),
                    target_domain: None,
                    port: Some(53),
                    protocol: Some(Protocol::Dns),
                    tags: vec![],
                },
            )
            .await
            .unwrap();

        let updates = vec![
            (
                target.id,
                TargetUpdate {
                    port: Some(5353),
                    ..Default::default()
                },
            ),
            // unknown id is skipped, not an error
            (Uuid::new_v4(), TargetUpdate::default()),
        ];
        let updated = repo.update_multiple(&updates).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].port, Some(5353));
    }

    #[tokio::test]
    #[ignore] // needs a local Postgres
    async fn test_delete_by_attack_id_reports_removal() {
        let pool = test_pool().await;
        let attack_id = insert_attack(&pool).await;
        let repo = TargetRepository::new(pool.clone());

        assert!(!repo.delete_by_attack_id(&pool, attack_id).await.unwrap());

        repo.create(
            &pool,
            attack_id,
            &NewTarget {
                target_ip: "1.2.3.4".to_string(),
                target_domain: Some("example.com".to_string()),
                port: None,
                protocol: None,
                tags: vec!["edge".to_string()],
            },
        )
        .await
        .unwrap();

        assert!(repo.delete_by_attack_id(&pool, attack_id).await.unwrap());
        assert!(repo
            .find_by_attack_id(&pool, attack_id)
            .await
            .unwrap()
            .is_empty());
    }
}
