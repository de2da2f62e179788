//! SeaORM entity definitions for a group database.

pub mod commit;
pub mod prelude;
pub mod repository;
