//! In-memory stores and a recording mailer for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{repo::UserStore, repo_types::User},
    error::{AppError, AppResult},
    mailer::{MailError, Mailer, OutboundEmail},
    tree::{
        repo::{OtpStore, TreeStore},
        repo_types::{NewOtp, NewTree, Tree, TreeOtp, TreePatch},
    },
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::Conflict("Email already in use".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            email_verified_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryTreeStore {
    trees: Mutex<Vec<Tree>>,
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn insert(&self, new: NewTree) -> AppResult<Tree> {
        let mut trees = self.trees.lock().unwrap();
        if trees.iter().any(|t| t.owner_id == new.owner_id) {
            return Err(AppError::Conflict(
                "A tree already exists for this account".into(),
            ));
        }
        let now = OffsetDateTime::now_utc();
        let tree = Tree {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            owner_email: new.owner_email,
            title: new.title,
            owner: new.owner,
            persons: new.persons,
            created_at: now,
            updated_at: now,
        };
        trees.push(tree.clone());
        Ok(tree)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Tree>> {
        Ok(self.trees.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Option<Tree>> {
        Ok(self
            .trees
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.owner_id == owner_id)
            .cloned())
    }

    async fn update_owned(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: TreePatch,
    ) -> AppResult<Option<Tree>> {
        let mut trees = self.trees.lock().unwrap();
        let Some(tree) = trees
            .iter_mut()
            .find(|t| t.id == id && t.owner_id == owner_id)
        else {
            return Ok(None);
        };
        patch.apply(tree, OffsetDateTime::now_utc());
        Ok(Some(tree.clone()))
    }

    async fn search_by_cnic(&self, cnic: &str) -> AppResult<Vec<Tree>> {
        Ok(self
            .trees
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.owner.cnic == cnic || t.persons.iter().any(|p| p.cnic == cnic))
            .cloned()
            .collect())
    }
}

/// Keeps every issued code; the last pushed for a tree is the newest.
#[derive(Default)]
pub struct MemoryOtpStore {
    otps: Mutex<Vec<TreeOtp>>,
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn issue(&self, new: NewOtp) -> AppResult<TreeOtp> {
        let mut otps = self.otps.lock().unwrap();
        for old in otps
            .iter_mut()
            .filter(|o| o.tree_id == new.tree_id && o.superseded_at.is_none())
        {
            old.superseded_at = Some(new.issued_at);
        }
        let otp = TreeOtp {
            id: Uuid::new_v4(),
            tree_id: new.tree_id,
            code_hash: new.code_hash,
            expires_at: new.expires_at,
            superseded_at: None,
            created_at: new.issued_at,
        };
        otps.push(otp.clone());
        Ok(otp)
    }

    async fn latest_for_tree(&self, tree_id: Uuid) -> AppResult<Option<TreeOtp>> {
        Ok(self
            .otps
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|o| o.tree_id == tree_id)
            .cloned())
    }
}

/// Captures outgoing mail instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<String, MailError> {
        if self.fail {
            return Err(MailError::NotConfigured);
        }
        self.sent.lock().unwrap().push(email);
        Ok(Uuid::new_v4().to_string())
    }
}

lazy_static! {
    static ref CODE_RE: Regex = Regex::new(r"<h2>(\d{6})</h2>").unwrap();
}

/// Access code from the most recent email that carried one.
pub fn last_code(mailer: &RecordingMailer) -> Option<String> {
    mailer
        .sent()
        .iter()
        .rev()
        .find_map(|m| CODE_RE.captures(&m.html).map(|c| c[1].to_string()))
}
