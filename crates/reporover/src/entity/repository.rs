//! Repository entity - one row per tracked repository in a group's database.

use sea_orm::entity::prelude::*;

/// Stored repository row.
///
/// `last_updated` holds an RFC 3339 string in UTC with second precision
/// (`2024-05-01T12:00:00Z`). Every writer must use that exact format so the
/// string comparisons in the staleness query stay correct.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    /// Source-assigned identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: Option<String>,
    pub default_branch: Option<String>,
    pub remote_url: Option<String>,
    pub last_updated: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::commit::Entity")]
    Commits,
}

impl Related<super::commit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
