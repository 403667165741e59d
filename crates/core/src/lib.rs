pub mod catalog;
pub mod catalog_service;
pub mod error;
pub mod memory;
pub mod pagination;
pub mod practice;
pub mod practice_log;
pub mod repository;
pub mod skill;
pub mod skill_aggregator;
pub mod types;
