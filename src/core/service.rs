//! Orchestration layer: transactions across the attack and target
//! repositories, plus administrative schema operations.

use log::{info, warn};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::ServiceError;
use crate::core::schema;
use crate::core::{AttackRepository, TargetRepository};
use crate::models::{
    Attack, AttackDanger, AttackFilter, AttackFrequency, AttackStats, AttackType, AttackUpdate,
    AttackWithTargets, AvailableFilters, DatabaseStatus, NewAttack, NewTarget, Protocol, Target,
    TargetUpdate,
};

/// Service coordinating catalogue operations over both tables
#[derive(Clone)]
pub struct AttackService {
    pool: PgPool,
    attacks: AttackRepository,
    targets: TargetRepository,
}

impl AttackService {
    /// Create a new service; repositories share the injected pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            attacks: AttackRepository::new(pool.clone()),
            targets: TargetRepository::new(pool.clone()),
            pool,
        }
    }

    /// Trivial round-trip used by the liveness probe
    pub async fn ping(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert an attack and its targets atomically: either everything is
    /// persisted or the transaction rolls back.
    pub async fn create_attack_with_targets(
        &self,
        attack: NewAttack,
        targets: Vec<NewTarget>,
    ) -> Result<AttackWithTargets, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let created = self.attacks.create(&mut *tx, &attack).await?;
        let created_targets = self
            .targets
            .create_multiple(&mut tx, created.id, &targets)
            .await?;
        tx.commit().await?;
        info!(
            "Created attack {} with {} target(s)",
            created.id,
            created_targets.len()
        );
        Ok(AttackWithTargets {
            attack: created,
            targets: created_targets,
        })
    }

    pub async fn get_attack_with_targets(
        &self,
        id: Uuid,
    ) -> Result<AttackWithTargets, ServiceError> {
        let attack = self
            .attacks
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Attack"))?;
        let targets = self.targets.find_by_attack_id(&self.pool, id).await?;
        Ok(AttackWithTargets { attack, targets })
    }

    pub async fn get_all_attacks(&self) -> Result<Vec<Attack>, ServiceError> {
        Ok(self.attacks.find_all().await?)
    }

    pub async fn get_attacks_by_filters(
        &self,
        filter: &AttackFilter,
    ) -> Result<Vec<Attack>, ServiceError> {
        Ok(self.attacks.find_by_filters(filter).await?)
    }

    pub async fn get_attack_stats(&self) -> Result<AttackStats, ServiceError> {
        Ok(self.attacks.get_stats().await?)
    }

    pub async fn get_available_filters(&self) -> Result<AvailableFilters, ServiceError> {
        Ok(self.attacks.get_available_filters().await?)
    }

    pub async fn get_attacks_by_frequency(
        &self,
        frequency: AttackFrequency,
    ) -> Result<Vec<Attack>, ServiceError> {
        Ok(self.attacks.find_by_frequency(frequency).await?)
    }

    pub async fn get_attacks_by_danger(
        &self,
        danger: AttackDanger,
    ) -> Result<Vec<Attack>, ServiceError> {
        Ok(self.attacks.find_by_danger(danger).await?)
    }

    pub async fn get_attacks_by_type(
        &self,
        attack_type: AttackType,
    ) -> Result<Vec<Attack>, ServiceError> {
        Ok(self.attacks.find_by_type(attack_type).await?)
    }

    pub async fn get_attacks_by_protocol(
        &self,
        protocol: Protocol,
    ) -> Result<Vec<Attack>, ServiceError> {
        Ok(self.attacks.find_by_protocol(protocol).await?)
    }

    /// Partial in-place update of attack fields only
    pub async fn update_attack(
        &self,
        id: Uuid,
        update: &AttackUpdate,
    ) -> Result<Attack, ServiceError> {
        self.attacks
            .update(&self.pool, id, update)
            .await?
            .ok_or(ServiceError::NotFound("Attack"))
    }

    /// Update attack fields and, when a target list is supplied, replace the
    /// whole target set (delete-then-insert) in the same transaction.
    /// Without a list the existing targets are left untouched.
    pub async fn update_attack_with_targets(
        &self,
        id: Uuid,
        update: &AttackUpdate,
        targets: Option<Vec<NewTarget>>,
    ) -> Result<AttackWithTargets, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let attack = self
            .attacks
            .update(&mut *tx, id, update)
            .await?
            .ok_or(ServiceError::NotFound("Attack"))?;

        let current_targets = match targets {
            Some(replacement) => {
                self.targets.delete_by_attack_id(&mut *tx, id).await?;
                self.targets
                    .create_multiple(&mut tx, id, &replacement)
                    .await?
            }
            None => self.targets.find_by_attack_id(&mut *tx, id).await?,
        };
        tx.commit().await?;
        Ok(AttackWithTargets {
            attack,
            targets: current_targets,
        })
    }

    /// Replace an attack's target set without touching the attack itself
    pub async fn update_attack_targets(
        &self,
        id: Uuid,
        targets: Vec<NewTarget>,
    ) -> Result<Vec<Target>, ServiceError> {
        self.attacks
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Attack"))?;

        let mut tx = self.pool.begin().await?;
        self.targets.delete_by_attack_id(&mut *tx, id).await?;
        let created = self.targets.create_multiple(&mut tx, id, &targets).await?;
        tx.commit().await?;
        Ok(created)
    }

    pub async fn update_target(
        &self,
        id: Uuid,
        update: &TargetUpdate,
    ) -> Result<Target, ServiceError> {
        self.targets
            .update(&self.pool, id, update)
            .await?
            .ok_or(ServiceError::NotFound("Target"))
    }

    /// Delete one attack; the cascading foreign key removes its targets.
    /// Returns whether the attack existed.
    pub async fn delete_attack(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.attacks.delete(id).await?)
    }

    /// Idempotence-checked schema bootstrap
    pub async fn initialize_database(&self) -> Result<(), ServiceError> {
        if schema::tables_exist(&self.pool).await? {
            return Err(ServiceError::AlreadyInitialized);
        }
        schema::create_tables(&self.pool).await?;
        Ok(())
    }

    /// Drop and recreate the schema. The caller is responsible for the
    /// environment gate; this only logs the event.
    pub async fn reset_database(&self) -> Result<(), ServiceError> {
        warn!("Resetting database schema");
        schema::drop_tables(&self.pool).await?;
        schema::create_tables(&self.pool).await?;
        Ok(())
    }

    pub async fn database_status(&self) -> Result<DatabaseStatus, ServiceError> {
        let tables_exist = schema::tables_exist(&self.pool).await?;
        let (attacks_count, targets_count) = if tables_exist {
            (
                schema::count_attacks(&self.pool).await?,
                schema::count_targets(&self.pool).await?,
            )
        } else {
            (0, 0)
        };
        Ok(DatabaseStatus {
            tables_exist,
            attacks_count,
            targets_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttackDanger, AttackFrequency, AttackType};
    use sqlx::postgres::PgPoolOptions;

    async fn test_service() -> AttackService {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new().connect(&url).await.unwrap();
        let service = AttackService::new(pool);
        service.reset_database().await.unwrap();
        service
    }

    fn sample_attack(name: &str) -> NewAttack {
        NewAttack {
            name: name.to_string(),
            frequency: AttackFrequency::High,
            danger: AttackDanger::Critical,
            attack_type: AttackType::Volumetric,
            source_ips: vec![],
            affected_ports: vec![],
            mitigation_strategies: vec![],
        }
    }

    fn sample_target(ip: &str) -> NewTarget {
        NewTarget {
            target_ip: ip.to_string(),
            target_domain: None,
            port: Some(443),
            protocol: Some(Protocol::Https),
            tags: vec![],
        }
    }

    #[tokio::test]
    #[ignore] // needs a local Postgres
    async fn test_create_then_fetch_returns_owned_targets() {
        let service = test_service().await;
        let created = service
            .create_attack_with_targets(
                sample_attack("UDP flood"),
                vec![sample_target("1.2.3.4"), sample_target("5.6.7.8")],
            )
            .await
            .unwrap();

        let fetched = service
            .get_attack_with_targets(created.attack.id)
            .await
            .unwrap();
        assert_eq!(fetched.targets.len(), 2);
        assert!(fetched
            .targets
            .iter()
            .all(|t| t.attack_id == created.attack.id));
    }

    #[tokio::test]
    #[ignore] // needs a local Postgres
    async fn test_failed_target_insert_rolls_back_the_attack() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new().connect(&url).await.unwrap();
        let service = AttackService::new(pool.clone());
        service.reset_database().await.unwrap();

        let attacks = AttackRepository::new(pool.clone());
        let targets = TargetRepository::new(pool.clone());

        let mut tx = pool.begin().await.unwrap();
        let created = attacks
            .create(&mut *tx, &sample_attack("GRE flood"))
            .await
            .unwrap();
        // foreign key violation aborts the transaction
        let result = targets
            .create(&mut *tx, Uuid::new_v4(), &sample_target("1.2.3.4"))
            .await;
        assert!(result.is_err());
        drop(tx);

        let err = service.get_attack_with_targets(created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("Attack")));
        let status = service.database_status().await.unwrap();
        assert_eq!(status.attacks_count, 0);
    }

    #[tokio::test]
    #[ignore] // needs a local Postgres
    async fn test_delete_cascades_to_targets() {
        let service = test_service().await;
        let created = service
            .create_attack_with_targets(sample_attack("NTP amp"), vec![sample_target("1.2.3.4")])
            .await
            .unwrap();

        assert!(service.delete_attack(created.attack.id).await.unwrap());
        let status = service.database_status().await.unwrap();
        assert_eq!(status.targets_count, 0);
    }

    #[tokio::test]
    #[ignore] // needs a local Postgres
    async fn test_replace_targets_with_empty_list_removes_all() {
        let service = test_service().await;
        let created = service
            .create_attack_with_targets(sample_attack("Slowloris"), vec![sample_target("1.2.3.4")])
            .await
            .unwrap();

        let remaining = service
            .update_attack_targets(created.attack.id, vec![])
            .await
            .unwrap();
        assert!(remaining.is_empty());

        let fetched = service
            .get_attack_with_targets(created.attack.id)
            .await
            .unwrap();
        assert!(fetched.targets.is_empty());
    }

    #[tokio::test]
    #[ignore] // needs a local Postgres
    async fn test_stats_totals_match_per_enum_sums() {
        let service = test_service().await;
        service
            .create_attack_with_targets(sample_attack("a1"), vec![])
            .await
            .unwrap();
        service
            .create_attack_with_targets(sample_attack("a2"), vec![])
            .await
            .unwrap();

        let stats = service.get_attack_stats().await.unwrap();
        assert_eq!(stats.total, stats.by_frequency.values().sum::<i64>());
        assert_eq!(stats.total, stats.by_danger.values().sum::<i64>());
        assert_eq!(stats.total, stats.by_type.values().sum::<i64>());
        assert_eq!(stats.by_frequency.len(), AttackFrequency::ALL.len());
    }

    #[tokio::test]
    #[ignore] // needs a local Postgres
    async fn test_update_missing_attack_is_not_found() {
        let service = test_service().await;
        let err = service
            .update_attack(Uuid::new_v4(), &AttackUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("Attack")));
    }
}
