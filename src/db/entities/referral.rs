use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directed referrer -> referred edge, created once at registration and
/// never mutated. A user can be referred at most once (`referred_id` unique).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub referrer_id: i64,
    #[sea_orm(unique)]
    pub referred_id: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReferrerId",
        to = "super::user::Column::Id"
    )]
    Referrer,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReferredId",
        to = "super::user::Column::Id"
    )]
    Referred,
}

// Edges relate to users on both sides; joins resolve the referred user.
impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Referred.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
