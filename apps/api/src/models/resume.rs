use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// A single resume document as stored in a user's collection.
///
/// `id` is `None` for drafts that have never been saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, deserialize_with = "default_if_null")]
    pub title: String,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "default_if_null")]
    pub content: ResumeContent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeContent {
    #[serde(default, deserialize_with = "default_if_null")]
    pub personal: PersonalInfo,
    #[serde(default, deserialize_with = "default_if_null")]
    pub summary: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "default_if_null")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "default_if_null")]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default, deserialize_with = "default_if_null")]
    pub name: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub email: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub phone: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub location: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub website: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "default_if_null")]
    pub title: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub company: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub location: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub dates: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "default_if_null")]
    pub degree: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub school: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub location: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub dates: String,
}

/// Treats an explicit JSON `null` the same as a missing field.
fn default_if_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: Json<ResumeContent>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for Resume {
    fn from(row: ResumeRow) -> Self {
        Resume {
            id: Some(row.id),
            title: row.title,
            updated_at: row.updated_at,
            content: row.content.0,
        }
    }
}
