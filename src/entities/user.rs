use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account profile. `deleted_at` soft-deletes: such rows are invisible to
/// sign-in and the auth extractors but keep their games' author references
/// resolvable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub email_verified: bool,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::auth_provider::Entity")]
    AuthProvider,
    #[sea_orm(has_many = "super::game_like::Entity")]
    GameLikes,
}

impl Related<super::auth_provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthProvider.def()
    }
}

impl Related<super::game_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameLikes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
