//! `SeaORM` entities for the orchestrator schema.

pub mod binding;
pub mod code;
pub mod favorite;
pub mod profile;
