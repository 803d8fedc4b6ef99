use tracing::debug;

use super::{
    dto::{MatchedPerson, SearchResult},
    repo_types::Tree,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    validation::is_valid_cnic,
};

/// Public lookup of every tree where `cnic` appears as the owner or a person.
/// The identifier is matched verbatim, so dashed and contiguous forms differ.
pub async fn search(state: &AppState, cnic: &str) -> AppResult<Vec<SearchResult>> {
    let cnic = cnic.trim();
    if !is_valid_cnic(cnic) {
        return Err(AppError::validation("Invalid CNIC"));
    }

    let trees = state.trees.search_by_cnic(cnic).await?;
    debug!(matches = trees.len(), "cnic search");
    Ok(trees.into_iter().map(|t| match_tree(t, cnic)).collect())
}

/// Summarises a tree for a hit on `cnic`. A listed person wins over the owner.
pub fn match_tree(tree: Tree, cnic: &str) -> SearchResult {
    let person = tree
        .persons
        .iter()
        .find(|p| p.cnic == cnic)
        .map(|p| MatchedPerson {
            full_name: p.full_name.clone(),
            gender: p.gender,
            cnic: p.cnic.clone(),
            relation_to_owner: p.relation_to_owner.as_str(),
            address: p.address.clone(),
        })
        .or_else(|| {
            (tree.owner.cnic == cnic).then(|| MatchedPerson {
                full_name: tree.owner.full_name.clone(),
                gender: tree.owner.gender,
                cnic: tree.owner.cnic.clone(),
                relation_to_owner: "OWNER",
                address: tree.owner.address.clone(),
            })
        });

    SearchResult {
        tree_id: tree.id,
        title: tree.title,
        owner_name: tree.owner.full_name,
        person,
    }
}
