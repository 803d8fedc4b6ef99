use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// How a person relates to the tree owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    Father,
    Mother,
    Son,
    Daughter,
    Sibling,
    Spouse,
    Other,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Father => "FATHER",
            Relation::Mother => "MOTHER",
            Relation::Son => "SON",
            Relation::Daughter => "DAUGHTER",
            Relation::Sibling => "SIBLING",
            Relation::Spouse => "SPOUSE",
            Relation::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub full_name: String,
    pub gender: Gender,
    pub cnic: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: Uuid,
    pub full_name: String,
    pub gender: Gender,
    pub cnic: String,
    pub relation_to_owner: Relation,
    pub address: String,
}

/// A claimant family tree as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub title: String,
    pub owner: Owner,
    pub persons: Vec<Person>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// `trees` row; owner and persons are stored as jsonb.
#[derive(Debug, FromRow)]
pub struct TreeRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub title: String,
    pub owner: Json<Owner>,
    pub persons: Json<Vec<Person>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<TreeRow> for Tree {
    fn from(r: TreeRow) -> Self {
        Self {
            id: r.id,
            owner_id: r.owner_id,
            owner_email: r.owner_email,
            title: r.title,
            owner: r.owner.0,
            persons: r.persons.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTree {
    pub owner_id: Uuid,
    pub owner_email: String,
    pub title: String,
    pub owner: Owner,
    pub persons: Vec<Person>,
}

/// Fields to overwrite; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct TreePatch {
    pub title: Option<String>,
    pub owner: Option<Owner>,
    pub persons: Option<Vec<Person>>,
}

impl TreePatch {
    pub fn apply(self, tree: &mut Tree, now: OffsetDateTime) {
        if let Some(title) = self.title {
            tree.title = title;
        }
        if let Some(owner) = self.owner {
            tree.owner = owner;
        }
        if let Some(persons) = self.persons {
            tree.persons = persons;
        }
        tree.updated_at = now;
    }
}

/// One issued access code. Only the newest per tree is honoured.
#[derive(Debug, Clone, FromRow)]
pub struct TreeOtp {
    pub id: Uuid,
    pub tree_id: Uuid,
    pub code_hash: String, // sha256 hex
    pub expires_at: OffsetDateTime,
    pub superseded_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewOtp {
    pub tree_id: Uuid,
    pub code_hash: String,
    pub expires_at: OffsetDateTime,
    pub issued_at: OffsetDateTime,
}
