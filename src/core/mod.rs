//! Core functionality for the DDoS catalogue API.
//!
//! This module contains the persistence components of the service:
//! the attack and target repositories, the transactional service layer,
//! and the schema bootstrap.

pub mod attack_repository;
pub mod error;
pub mod schema;
pub mod service;
pub mod target_repository;

pub use attack_repository::AttackRepository;
pub use error::ServiceError;
pub use service::AttackService;
pub use target_repository::TargetRepository;
