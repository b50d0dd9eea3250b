use bson::oid::ObjectId;
use bson::{Document, doc};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::query::{Collection, Update, UpdateBuilder, fields};
use crate::errors::StoreError;

/// A record type that lives in one collection of the document store.
pub trait Resource: Serialize + Sized + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Human-readable name used in response messages.
    const NAME: &'static str;

    fn to_document(&self) -> Document;
    fn from_document(document: Document) -> Result<Self, StoreError>;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Bug {
    #[serde(serialize_with = "hex_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Lane {
    #[serde(serialize_with = "hex_id")]
    pub id: ObjectId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Task {
    #[serde(serialize_with = "hex_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    #[serde(serialize_with = "hex_id")]
    pub lane_id: ObjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Bug {
    const COLLECTION: Collection = Collection::Bugs;
    const NAME: &'static str = "Bug";

    fn to_document(&self) -> Document {
        doc! {
            (fields::ID): self.id,
            (fields::TITLE): self.title.clone(),
            (fields::DESCRIPTION): self.description.clone(),
            (fields::STATUS): self.status.clone(),
            (fields::CREATED_AT): bson::DateTime::from_chrono(self.created_at),
            (fields::UPDATED_AT): bson::DateTime::from_chrono(self.updated_at),
        }
    }

    fn from_document(document: Document) -> Result<Self, StoreError> {
        let reader = DocReader::new(&document, Self::COLLECTION);
        Ok(Self {
            id: reader.object_id(fields::ID)?,
            title: reader.text(fields::TITLE)?,
            description: reader.text(fields::DESCRIPTION)?,
            // Older documents may predate the status field.
            status: document.get_str(fields::STATUS).unwrap_or_default().to_string(),
            created_at: reader.timestamp(fields::CREATED_AT)?,
            updated_at: reader.timestamp(fields::UPDATED_AT)?,
        })
    }
}

impl Resource for Lane {
    const COLLECTION: Collection = Collection::Lanes;
    const NAME: &'static str = "Lane";

    fn to_document(&self) -> Document {
        doc! {
            (fields::ID): self.id,
            (fields::TITLE): self.title.clone(),
            (fields::CREATED_AT): bson::DateTime::from_chrono(self.created_at),
            (fields::UPDATED_AT): bson::DateTime::from_chrono(self.updated_at),
        }
    }

    fn from_document(document: Document) -> Result<Self, StoreError> {
        let reader = DocReader::new(&document, Self::COLLECTION);
        Ok(Self {
            id: reader.object_id(fields::ID)?,
            title: reader.text(fields::TITLE)?,
            created_at: reader.timestamp(fields::CREATED_AT)?,
            updated_at: reader.timestamp(fields::UPDATED_AT)?,
        })
    }
}

impl Resource for Task {
    const COLLECTION: Collection = Collection::Tasks;
    const NAME: &'static str = "Task";

    fn to_document(&self) -> Document {
        doc! {
            (fields::ID): self.id,
            (fields::TITLE): self.title.clone(),
            (fields::DESCRIPTION): self.description.clone(),
            (fields::LANE_ID): self.lane_id,
            (fields::CREATED_AT): bson::DateTime::from_chrono(self.created_at),
            (fields::UPDATED_AT): bson::DateTime::from_chrono(self.updated_at),
        }
    }

    fn from_document(document: Document) -> Result<Self, StoreError> {
        let reader = DocReader::new(&document, Self::COLLECTION);
        Ok(Self {
            id: reader.object_id(fields::ID)?,
            title: reader.text(fields::TITLE)?,
            description: reader.text(fields::DESCRIPTION)?,
            lane_id: reader.object_id(fields::LANE_ID)?,
            created_at: reader.timestamp(fields::CREATED_AT)?,
            updated_at: reader.timestamp(fields::UPDATED_AT)?,
        })
    }
}

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewBug {
    pub title: String,
    pub description: String,
    pub status: String,
}

impl NewBug {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() || self.description.is_empty() {
            return Err("Required fields are missing".into());
        }
        if !self.status.is_empty() {
            return Err("Status cannot be set when creating a bug".into());
        }
        Ok(())
    }

    pub fn into_bug(self, now: bson::DateTime) -> Bug {
        let created_at = now.to_chrono();
        Bug {
            id: ObjectId::new(),
            title: self.title,
            description: self.description,
            status: String::new(),
            created_at,
            updated_at: created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewLane {
    pub title: String,
}

impl NewLane {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() {
            return Err("Required fields are missing".into());
        }
        Ok(())
    }

    pub fn into_lane(self, now: bson::DateTime) -> Lane {
        let created_at = now.to_chrono();
        Lane {
            id: ObjectId::new(),
            title: self.title,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Body of a task creation. The lane comes from the request path.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() || self.description.is_empty() {
            return Err("Required fields are missing".into());
        }
        Ok(())
    }

    pub fn into_task(self, lane_id: ObjectId, now: bson::DateTime) -> Task {
        let created_at = now.to_chrono();
        Task {
            id: ObjectId::new(),
            title: self.title,
            description: self.description,
            lane_id,
            created_at,
            updated_at: created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BugPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl BugPatch {
    pub fn into_update(self, now: bson::DateTime) -> Option<Update> {
        UpdateBuilder::new()
            .text(fields::TITLE, self.title)
            .text(fields::DESCRIPTION, self.description)
            .text(fields::STATUS, self.status)
            .build(now)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LanePatch {
    pub title: Option<String>,
}

impl LanePatch {
    pub fn into_update(self, now: bson::DateTime) -> Option<Update> {
        UpdateBuilder::new().text(fields::TITLE, self.title).build(now)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "laneId", deserialize_with = "optional_hex_id")]
    pub lane_id: Option<ObjectId>,
}

impl TaskPatch {
    pub fn into_update(self, now: bson::DateTime) -> Option<Update> {
        UpdateBuilder::new()
            .text(fields::TITLE, self.title)
            .text(fields::DESCRIPTION, self.description)
            .object_id(fields::LANE_ID, self.lane_id)
            .build(now)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────

fn hex_id<S: Serializer>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&id.to_hex())
}

/// `null`, absent and `""` all mean "not supplied".
fn optional_hex_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ObjectId>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(hex) => ObjectId::parse_str(hex)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Typed field access that reports which collection held the bad document.
struct DocReader<'a> {
    document: &'a Document,
    collection: Collection,
}

impl<'a> DocReader<'a> {
    fn new(document: &'a Document, collection: Collection) -> Self {
        Self {
            document,
            collection,
        }
    }

    fn malformed(&self, field: &str, err: impl std::fmt::Display) -> StoreError {
        StoreError::Malformed {
            collection: self.collection.as_str(),
            reason: format!("field `{}`: {}", field, err),
        }
    }

    fn object_id(&self, field: &str) -> Result<ObjectId, StoreError> {
        self.document
            .get_object_id(field)
            .map_err(|e| self.malformed(field, e))
    }

    fn text(&self, field: &str) -> Result<String, StoreError> {
        self.document
            .get_str(field)
            .map(str::to_string)
            .map_err(|e| self.malformed(field, e))
    }

    fn timestamp(&self, field: &str) -> Result<DateTime<Utc>, StoreError> {
        self.document
            .get_datetime(field)
            .map(|dt| dt.to_chrono())
            .map_err(|e| self.malformed(field, e))
    }
}
