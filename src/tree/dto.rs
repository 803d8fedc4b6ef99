use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    otp::is_code_shaped,
    repo_types::{Gender, Owner, Person, Relation, Tree, TreePatch},
};
use crate::error::{AppError, AppResult};
use crate::validation::{self, min_chars, Validate};

const MIN_TITLE: usize = 2;
const MIN_NAME: usize = 2;
const MIN_ADDRESS: usize = 3;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerInput {
    pub full_name: String,
    pub gender: Gender,
    pub cnic: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonInput {
    pub full_name: String,
    pub gender: Gender,
    pub cnic: String,
    pub relation_to_owner: Relation,
    pub address: String,
}

/// Body of `POST /tree`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTreeRequest {
    pub title: String,
    pub owner: OwnerInput,
    pub persons: Vec<PersonInput>,
}

/// Body of `PATCH /tree/:id`; absent fields stay as stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchTreeRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub owner: Option<OwnerInput>,
    #[serde(default)]
    pub persons: Option<Vec<PersonInput>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub tree_id: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTreeResponse {
    pub ok: bool,
    pub tree_id: Uuid,
    pub emailed: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
    pub tree: Tree,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MineResponse {
    pub ok: bool,
    pub tree_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ResendCodeResponse {
    pub ok: bool,
    pub emailed: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub cnic: String,
}

/// The record that matched a CNIC search.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPerson {
    pub full_name: String,
    pub gender: Gender,
    pub cnic: String,
    /// Stored relation, or `OWNER` when the tree owner matched.
    pub relation_to_owner: &'static str,
    pub address: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub tree_id: Uuid,
    pub title: String,
    pub owner_name: String,
    pub person: Option<MatchedPerson>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub ok: bool,
    pub results: Vec<SearchResult>,
}

impl OwnerInput {
    pub fn into_owner(self) -> Owner {
        Owner {
            full_name: self.full_name.trim().to_string(),
            gender: self.gender,
            cnic: self.cnic.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }
}

impl PersonInput {
    pub fn into_person(self) -> Person {
        Person {
            id: Uuid::new_v4(),
            full_name: self.full_name.trim().to_string(),
            gender: self.gender,
            cnic: self.cnic.trim().to_string(),
            relation_to_owner: self.relation_to_owner,
            address: self.address.trim().to_string(),
        }
    }
}

impl PatchTreeRequest {
    pub fn into_patch(self) -> TreePatch {
        TreePatch {
            title: self.title.map(|t| t.trim().to_string()),
            owner: self.owner.map(OwnerInput::into_owner),
            persons: self
                .persons
                .map(|ps| ps.into_iter().map(PersonInput::into_person).collect()),
        }
    }
}

impl Validate for OwnerInput {
    fn validate(&self) -> AppResult<()> {
        min_chars(&self.full_name, MIN_NAME, "Full name")?;
        validation::cnic(&self.cnic)?;
        min_chars(&self.address, MIN_ADDRESS, "Address")
    }
}

impl Validate for PersonInput {
    fn validate(&self) -> AppResult<()> {
        min_chars(&self.full_name, MIN_NAME, "Full name")?;
        validation::cnic(&self.cnic)?;
        min_chars(&self.address, MIN_ADDRESS, "Address")
    }
}

fn validate_persons(persons: &[PersonInput]) -> AppResult<()> {
    if persons.is_empty() {
        return Err(AppError::validation("At least one person is required"));
    }
    persons.iter().try_for_each(|p| p.validate())
}

impl Validate for CreateTreeRequest {
    fn validate(&self) -> AppResult<()> {
        min_chars(&self.title, MIN_TITLE, "Title")?;
        self.owner.validate()?;
        validate_persons(&self.persons)
    }
}

impl Validate for PatchTreeRequest {
    fn validate(&self) -> AppResult<()> {
        if let Some(title) = &self.title {
            min_chars(title, MIN_TITLE, "Title")?;
        }
        if let Some(owner) = &self.owner {
            owner.validate()?;
        }
        if let Some(persons) = &self.persons {
            validate_persons(persons)?;
        }
        Ok(())
    }
}

impl Validate for VerifyRequest {
    fn validate(&self) -> AppResult<()> {
        if self.tree_id.trim().is_empty() {
            return Err(AppError::validation("Tree id is required"));
        }
        if !is_code_shaped(&self.code) {
            return Err(AppError::validation("Code must be 6 digits"));
        }
        Ok(())
    }
}
