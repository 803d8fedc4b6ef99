use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateTreeRequest, OwnerInput, PatchTreeRequest, PersonInput, VerifyRequest},
    otp::{self, OtpError},
    repo_types::{NewTree, Tree},
};
use crate::{
    auth::AuthSession,
    error::{AppError, AppResult},
    state::AppState,
    validation::Validate,
};

fn not_owned() -> AppError {
    AppError::NotFound("Tree not found or not yours")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedTree {
    pub tree_id: Uuid,
    pub emailed: bool,
}

/// Persists the caller's tree, issues its first access code and emails it.
/// A failed email leaves the tree in place and reports `emailed: false`.
pub async fn create_tree(
    state: &AppState,
    session: &AuthSession,
    req: CreateTreeRequest,
    now: OffsetDateTime,
) -> AppResult<CreatedTree> {
    req.validate()?;

    let tree = state
        .trees
        .insert(NewTree {
            owner_id: session.user_id,
            owner_email: session.email.clone(),
            title: req.title.trim().to_string(),
            owner: OwnerInput::into_owner(req.owner),
            persons: req.persons.into_iter().map(PersonInput::into_person).collect(),
        })
        .await?;
    info!(tree_id = %tree.id, user_id = %session.user_id, persons = tree.persons.len(), "tree created");

    let code = otp::issue(state.otps.as_ref(), tree.id, now).await?;
    let emailed = send_code(state, &session.email, &code, &tree.title).await;

    Ok(CreatedTree {
        tree_id: tree.id,
        emailed,
    })
}

/// Returns the tree once the newest access code for it checks out.
pub async fn verify_tree(
    state: &AppState,
    req: VerifyRequest,
    now: OffsetDateTime,
) -> AppResult<Tree> {
    req.validate()?;

    // An id that cannot exist has no code either.
    let tree_id = Uuid::parse_str(req.tree_id.trim()).map_err(|_| OtpError::NotFound)?;

    let latest = state.otps.latest_for_tree(tree_id).await?;
    if let Err(e) = otp::check(latest.as_ref(), &req.code, now) {
        warn!(tree_id = %tree_id, error = %e, "code rejected");
        return Err(e.into());
    }

    state
        .trees
        .find_by_id(tree_id)
        .await?
        .ok_or(AppError::NotFound("Tree not found"))
}

/// Overwrites the provided fields of a tree owned by the caller.
pub async fn patch_tree(
    state: &AppState,
    session: &AuthSession,
    tree_id: &str,
    req: PatchTreeRequest,
) -> AppResult<Tree> {
    req.validate()?;

    let Ok(id) = Uuid::parse_str(tree_id) else {
        return Err(not_owned());
    };

    match state
        .trees
        .update_owned(id, session.user_id, req.into_patch())
        .await?
    {
        Some(tree) => {
            info!(tree_id = %tree.id, user_id = %session.user_id, "tree updated");
            Ok(tree)
        }
        None => {
            warn!(tree_id = %id, user_id = %session.user_id, "patch on missing or foreign tree");
            Err(not_owned())
        }
    }
}

pub async fn my_tree_id(state: &AppState, user_id: Uuid) -> AppResult<Option<Uuid>> {
    Ok(state.trees.find_by_owner(user_id).await?.map(|t| t.id))
}

/// Issues a replacement code for the caller's tree and emails it.
pub async fn resend_code(
    state: &AppState,
    session: &AuthSession,
    now: OffsetDateTime,
) -> AppResult<bool> {
    let tree = state
        .trees
        .find_by_owner(session.user_id)
        .await?
        .ok_or(AppError::NotFound("Tree not found"))?;

    let code = otp::issue(state.otps.as_ref(), tree.id, now).await?;
    info!(tree_id = %tree.id, "access code reissued");
    Ok(send_code(state, &session.email, &code, &tree.title).await)
}

async fn send_code(state: &AppState, to: &str, code: &str, title: &str) -> bool {
    match state.mailer.send(otp::code_email(to, code, title)).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "access code email failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{last_code, RecordingMailer};
    use crate::tree::{
        dto::{OwnerInput, PersonInput},
        repo_types::{Gender, Relation},
    };
    use std::sync::Arc;
    use time::Duration;

    fn session() -> AuthSession {
        AuthSession {
            user_id: Uuid::new_v4(),
            email: "owner@example.com".into(),
        }
    }

    fn create_req() -> CreateTreeRequest {
        CreateTreeRequest {
            title: "Khan family".into(),
            owner: OwnerInput {
                full_name: "Imran Khan".into(),
                gender: Gender::Male,
                cnic: "35202-1234567-1".into(),
                address: "12 Mall Road, Lahore".into(),
            },
            persons: vec![PersonInput {
                full_name: "Ayesha Khan".into(),
                gender: Gender::Female,
                cnic: "35202-7654321-2".into(),
                relation_to_owner: Relation::Mother,
                address: "12 Mall Road, Lahore".into(),
            }],
        }
    }

    fn verify_req(tree_id: Uuid, code: &str) -> VerifyRequest {
        VerifyRequest {
            tree_id: tree_id.to_string(),
            code: code.into(),
        }
    }

    fn other_code(code: &str) -> String {
        if code == "000000" { "000001".into() } else { "000000".into() }
    }

    async fn created(state: &AppState, mailer: &RecordingMailer, now: OffsetDateTime) -> (AuthSession, Uuid, String) {
        let session = session();
        let created = create_tree(state, &session, create_req(), now).await.unwrap();
        assert!(created.emailed);
        let code = last_code(mailer).expect("code emailed");
        (session, created.tree_id, code)
    }

    #[tokio::test]
    async fn code_unlocks_tree_within_ttl() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::fake_with_mailer(mailer.clone());
        let now = OffsetDateTime::now_utc();
        let (session, tree_id, code) = created(&state, &mailer, now).await;

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, session.email);

        let tree = verify_tree(&state, verify_req(tree_id, &code), now + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(tree.id, tree_id);
        assert_eq!(tree.owner_id, session.user_id);
        assert_eq!(tree.owner_email, "owner@example.com");
        assert_eq!(tree.persons.len(), 1);
    }

    #[tokio::test]
    async fn code_expires_after_ten_minutes() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::fake_with_mailer(mailer.clone());
        let now = OffsetDateTime::now_utc();
        let (_, tree_id, code) = created(&state, &mailer, now).await;

        let err = verify_tree(&state, verify_req(tree_id, &code), now + Duration::minutes(11))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Otp(OtpError::Expired)));
    }

    #[tokio::test]
    async fn wrong_code_is_invalid() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::fake_with_mailer(mailer.clone());
        let now = OffsetDateTime::now_utc();
        let (_, tree_id, code) = created(&state, &mailer, now).await;

        let err = verify_tree(&state, verify_req(tree_id, &other_code(&code)), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Otp(OtpError::InvalidCode)));
    }

    #[tokio::test]
    async fn unknown_tree_has_no_code() {
        let state = AppState::fake();
        let now = OffsetDateTime::now_utc();

        let err = verify_tree(&state, verify_req(Uuid::new_v4(), "123456"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Otp(OtpError::NotFound)));

        let garbage = VerifyRequest {
            tree_id: "not-a-uuid".into(),
            code: "123456".into(),
        };
        let err = verify_tree(&state, garbage, now).await.unwrap_err();
        assert!(matches!(err, AppError::Otp(OtpError::NotFound)));
    }

    #[tokio::test]
    async fn malformed_code_is_rejected_before_lookup() {
        let state = AppState::fake();
        let err = verify_tree(
            &state,
            verify_req(Uuid::new_v4(), "abc"),
            OffsetDateTime::now_utc(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "Code must be 6 digits");
    }

    #[tokio::test]
    async fn newer_code_supersedes_older() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::fake_with_mailer(mailer.clone());
        let now = OffsetDateTime::now_utc();
        let (session, tree_id, first) = created(&state, &mailer, now).await;

        let later = now + Duration::minutes(1);
        assert!(resend_code(&state, &session, later).await.unwrap());
        let second = last_code(&mailer).unwrap();

        if first != second {
            let err = verify_tree(&state, verify_req(tree_id, &first), later)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Otp(OtpError::InvalidCode)));
        }
        verify_tree(&state, verify_req(tree_id, &second), later)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_email_keeps_tree() {
        let mailer = Arc::new(RecordingMailer::failing());
        let state = AppState::fake_with_mailer(mailer.clone());
        let session = session();

        let created = create_tree(&state, &session, create_req(), OffsetDateTime::now_utc())
            .await
            .unwrap();
        assert!(!created.emailed);
        assert_eq!(
            my_tree_id(&state, session.user_id).await.unwrap(),
            Some(created.tree_id)
        );
    }

    #[tokio::test]
    async fn second_tree_for_same_user_conflicts() {
        let state = AppState::fake();
        let session = session();
        let now = OffsetDateTime::now_utc();
        create_tree(&state, &session, create_req(), now).await.unwrap();

        let err = create_tree(&state, &session, create_req(), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_create_writes_nothing() {
        let state = AppState::fake();
        let session = session();
        let mut req = create_req();
        req.persons.clear();

        let err = create_tree(&state, &session, req, OffsetDateTime::now_utc())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(my_tree_id(&state, session.user_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn patch_updates_only_given_fields() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::fake_with_mailer(mailer.clone());
        let now = OffsetDateTime::now_utc();
        let (session, tree_id, code) = created(&state, &mailer, now).await;

        let patch = PatchTreeRequest {
            title: Some("Khan family (updated)".into()),
            ..Default::default()
        };
        patch_tree(&state, &session, &tree_id.to_string(), patch)
            .await
            .unwrap();

        let tree = verify_tree(&state, verify_req(tree_id, &code), now).await.unwrap();
        assert_eq!(tree.title, "Khan family (updated)");
        assert_eq!(tree.owner.full_name, "Imran Khan");
        assert_eq!(tree.persons.len(), 1);
    }

    #[tokio::test]
    async fn patch_on_foreign_tree_is_not_found_and_harmless() {
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::fake_with_mailer(mailer.clone());
        let now = OffsetDateTime::now_utc();
        let (_, tree_id, code) = created(&state, &mailer, now).await;

        let intruder = session();
        let patch = PatchTreeRequest {
            title: Some("Hijacked".into()),
            ..Default::default()
        };
        let err = patch_tree(&state, &intruder, &tree_id.to_string(), patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let tree = verify_tree(&state, verify_req(tree_id, &code), now).await.unwrap();
        assert_eq!(tree.title, "Khan family");
    }

    #[tokio::test]
    async fn patch_on_unknown_or_malformed_id_is_not_found() {
        let state = AppState::fake();
        let session = session();
        for id in [Uuid::new_v4().to_string(), "nope".to_string()] {
            let err = patch_tree(&state, &session, &id, PatchTreeRequest::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }
    }

    #[tokio::test]
    async fn resend_without_tree_is_not_found() {
        let state = AppState::fake();
        let err = resend_code(&state, &session(), OffsetDateTime::now_utc())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
