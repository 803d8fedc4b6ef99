use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{NewOtp, NewTree, Tree, TreeOtp, TreePatch, TreeRow};
use crate::error::AppResult;

/// Tree store. At most one tree per owner; a second insert fails with `Conflict`.
#[async_trait]
pub trait TreeStore: Send + Sync {
    async fn insert(&self, tree: NewTree) -> AppResult<Tree>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Tree>>;
    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Option<Tree>>;

    /// Applies `patch` only when `id` belongs to `owner_id`; `None` otherwise.
    async fn update_owned(&self, id: Uuid, owner_id: Uuid, patch: TreePatch)
        -> AppResult<Option<Tree>>;

    /// Trees whose owner or any person carries exactly `cnic`.
    async fn search_by_cnic(&self, cnic: &str) -> AppResult<Vec<Tree>>;
}

/// OTP store. History is kept; issuing marks earlier live codes superseded.
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn issue(&self, otp: NewOtp) -> AppResult<TreeOtp>;
    async fn latest_for_tree(&self, tree_id: Uuid) -> AppResult<Option<TreeOtp>>;
}

const TREE_COLUMNS: &str =
    "id, owner_id, owner_email, title, owner, persons, created_at, updated_at";

#[derive(Clone)]
pub struct PgTreeStore {
    db: PgPool,
}

impl PgTreeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TreeStore for PgTreeStore {
    async fn insert(&self, tree: NewTree) -> AppResult<Tree> {
        let row = sqlx::query_as::<_, TreeRow>(&format!(
            r#"
            INSERT INTO trees (id, owner_id, owner_email, title, owner, persons)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TREE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(tree.owner_id)
        .bind(&tree.owner_email)
        .bind(&tree.title)
        .bind(Json(&tree.owner))
        .bind(Json(&tree.persons))
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Tree>> {
        let row = sqlx::query_as::<_, TreeRow>(&format!(
            "SELECT {TREE_COLUMNS} FROM trees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Option<Tree>> {
        let row = sqlx::query_as::<_, TreeRow>(&format!(
            "SELECT {TREE_COLUMNS} FROM trees WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn update_owned(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: TreePatch,
    ) -> AppResult<Option<Tree>> {
        let row = sqlx::query_as::<_, TreeRow>(&format!(
            r#"
            UPDATE trees
               SET title      = COALESCE($3, title),
                   owner      = COALESCE($4, owner),
                   persons    = COALESCE($5, persons),
                   updated_at = now()
             WHERE id = $1 AND owner_id = $2
            RETURNING {TREE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(patch.title)
        .bind(patch.owner.map(Json))
        .bind(patch.persons.map(Json))
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn search_by_cnic(&self, cnic: &str) -> AppResult<Vec<Tree>> {
        let rows = sqlx::query_as::<_, TreeRow>(&format!(
            r#"
            SELECT {TREE_COLUMNS}
              FROM trees
             WHERE owner->>'cnic' = $1
                OR persons @> jsonb_build_array(jsonb_build_object('cnic', $1::text))
             ORDER BY created_at ASC
            "#
        ))
        .bind(cnic)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(Clone)]
pub struct PgOtpStore {
    db: PgPool,
}

impl PgOtpStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OtpStore for PgOtpStore {
    async fn issue(&self, otp: NewOtp) -> AppResult<TreeOtp> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE tree_otps
               SET superseded_at = $2
             WHERE tree_id = $1 AND superseded_at IS NULL
            "#,
        )
        .bind(otp.tree_id)
        .bind(otp.issued_at)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, TreeOtp>(
            r#"
            INSERT INTO tree_otps (id, tree_id, code_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, tree_id, code_hash, expires_at, superseded_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(otp.tree_id)
        .bind(&otp.code_hash)
        .bind(otp.expires_at)
        .bind(otp.issued_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn latest_for_tree(&self, tree_id: Uuid) -> AppResult<Option<TreeOtp>> {
        let row = sqlx::query_as::<_, TreeOtp>(
            r#"
            SELECT id, tree_id, code_hash, expires_at, superseded_at, created_at
              FROM tree_otps
             WHERE tree_id = $1
             ORDER BY created_at DESC
             LIMIT 1
            "#,
        )
        .bind(tree_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
