use bson::oid::ObjectId;
use bson::{Bson, Document, doc};

/// Named collections in the `bug-point` database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Bugs,
    Lanes,
    Tasks,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bugs => "bugs",
            Self::Lanes => "lane",
            Self::Tasks => "tasks",
        }
    }
}

/// Document field names. Every filter, update and model conversion goes
/// through these so the read and write paths agree.
pub mod fields {
    pub const ID: &str = "_id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const STATUS: &str = "status";
    pub const LANE_ID: &str = "lane_id";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

/// Conjunction of field equality clauses. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(&'static str, Bson)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: ObjectId) -> Self {
        Self::all().eq(fields::ID, id)
    }

    pub fn eq(mut self, field: &'static str, value: impl Into<Bson>) -> Self {
        self.clauses.push((field, value.into()));
        self
    }

    pub fn to_document(&self) -> Document {
        self.clauses
            .iter()
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect()
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, value)| document.get(field) == Some(value))
    }
}

/// A field-level partial update (`$set`), always carrying `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    set: Document,
}

impl Update {
    pub fn set_fields(&self) -> &Document {
        &self.set
    }

    pub fn to_document(&self) -> Document {
        doc! { "$set": self.set.clone() }
    }

    /// Apply the `$set` to a document in place.
    pub fn apply(&self, document: &mut Document) {
        for (field, value) in &self.set {
            document.insert(field.clone(), value.clone());
        }
    }
}

/// Collects the supplied fields of a partial body. Empty strings and absent
/// values are skipped, mirroring how the API treats "not supplied".
#[derive(Debug, Default)]
pub struct UpdateBuilder {
    set: Document,
}

impl UpdateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, field: &'static str, value: Option<String>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.set.insert(field, value);
        }
        self
    }

    pub fn object_id(mut self, field: &'static str, value: Option<ObjectId>) -> Self {
        if let Some(value) = value {
            self.set.insert(field, value);
        }
        self
    }

    /// Stamp `updated_at` and finish. `None` when no resource field was supplied.
    pub fn build(mut self, now: bson::DateTime) -> Option<Update> {
        if self.set.is_empty() {
            return None;
        }
        self.set.insert(fields::UPDATED_AT, now);
        Some(Update { set: self.set })
    }
}
