use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub last_updated: DateTimeWithTimeZone,
    pub title: String,
    pub description: String,
    pub category: String,
    pub game_type: String,
    /// Inline source for text-adventure games; empty for file-based games.
    pub content: String,
    pub image: String,
    /// Either a bare identifier string or an embedded object with an `id`
    /// field. Resolve through [`Model::author_ref`], never directly.
    pub author: Option<Json>,
    /// Legacy sibling field used by records that predate the `author` column.
    pub author_id: Option<String>,
    pub main_file: Option<String>,
    pub asset_files: Json,
    pub thumbnails: Json,
    pub settings_width: i32,
    pub settings_height: i32,
    pub settings_fullscreen: bool,
    pub likes: i64,
    pub plays: i64,
    /// Directory under the asset store holding this game's files. Assigned
    /// once at creation; nullable only for legacy rows.
    pub game_dir_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::game_like::Entity")]
    GameLikes,
}

impl Related<super::game_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameLikes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The three shapes an author reference can take on a stored game record.
///
/// Older records store a bare identifier string, imported ones may embed a
/// whole author object, and the oldest rows carry only the sibling
/// `author_id` column. All ownership checks go through this union so the
/// shape is resolved in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorRef {
    /// `author` is a plain identifier string.
    Id(String),
    /// `author` is an object; the identifier was pulled from its `id` field.
    Embedded(String),
    /// Identifier taken from the legacy `author_id` column.
    Legacy(String),
}

impl AuthorRef {
    /// The canonical identifier, regardless of the stored shape.
    #[must_use]
    pub fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Embedded(id) | Self::Legacy(id) => id,
        }
    }
}

impl Model {
    /// Normalize whichever author representation is present on this record.
    ///
    /// Returns `None` when no usable identifier is found; callers must treat
    /// that as "not the owner", never as a match.
    #[must_use]
    pub fn author_ref(&self) -> Option<AuthorRef> {
        match self.author.as_ref() {
            Some(Json::String(s)) if !s.is_empty() => return Some(AuthorRef::Id(s.clone())),
            Some(Json::Object(obj)) => {
                let id = obj
                    .get("id")
                    .or_else(|| obj.get("_id"))
                    .and_then(Json::as_str);
                if let Some(id) = id
                    && !id.is_empty()
                {
                    return Some(AuthorRef::Embedded(id.to_string()));
                }
            }
            _ => {}
        }

        self.author_id
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(|s| AuthorRef::Legacy(s.clone()))
    }

    /// Canonical author identifier, if any form of it is stored.
    #[must_use]
    pub fn author_id(&self) -> Option<String> {
        self.author_ref().map(AuthorRef::into_id)
    }

    /// Whether the given caller owns this game.
    ///
    /// Matches the canonical author identifier against the caller's user id
    /// or email (legacy records may store an email as the identifier).
    #[must_use]
    pub fn is_owned_by(&self, user_id: Uuid, email: &str) -> bool {
        self.author_id()
            .is_some_and(|author| author == user_id.to_string() || author == email)
    }

    /// The stored asset-file URLs as a list.
    #[must_use]
    pub fn asset_file_list(&self) -> Vec<String> {
        json_string_list(&self.asset_files)
    }

    /// The stored thumbnail URLs as a list.
    #[must_use]
    pub fn thumbnail_list(&self) -> Vec<String> {
        json_string_list(&self.thumbnails)
    }
}

fn json_string_list(value: &Json) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Json::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
