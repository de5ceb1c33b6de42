//! Authentication and session service.
//!
//! Sign-in is an explicit pipeline:
//!
//! 1. [`SessionManager::authenticate`] checks an email/password pair against a
//!    [`CredentialStore`] and yields an identity or nothing.
//! 2. [`SessionManager::mint_token`] builds token claims from that identity.
//!    It is pure; if the account still carries the `NO_NAME` placeholder it
//!    returns a [`NameCorrection`] alongside the claims.
//! 3. [`SessionManager::persist_name_correction`] writes that correction back.
//!    Callers log a failure here and carry on.
//!
//! On every request [`SessionManager::project_session`] turns verified claims
//! into the [`SessionView`] handlers see.

mod error;
pub mod token;

pub use error::{AuthError, TokenError};
pub use token::{TokenClaims, TokenCodec};

use std::future::Future;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use tracing::instrument;

use prostore_core::{Email, UserId, UserRole};

use crate::config::AuthConfig;
use crate::db::RepositoryError;
use crate::models::session::{SessionUser, SessionView};
use crate::models::user::{AuthenticatedUser, NO_NAME, UserRecord};

/// Minimum password length for new accounts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Where accounts and password hashes live.
pub trait CredentialStore: Send + Sync {
    /// Look up the single account registered under `email`.
    fn find_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<UserRecord>, RepositoryError>> + Send;

    /// Replace an account's display name.
    fn update_name(
        &self,
        id: UserId,
        name: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert a new account.
    fn create_user(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> impl Future<Output = Result<UserRecord, RepositoryError>> + Send;
}

/// Input to [`SessionManager::mint_token`].
#[derive(Debug, Clone, Copy)]
pub struct MintContext<'a> {
    pub user: &'a AuthenticatedUser,
    pub now: DateTime<Utc>,
}

/// A display name that must be written back to the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCorrection {
    pub user_id: UserId,
    pub name: String,
}

/// Output of [`SessionManager::mint_token`].
#[derive(Debug, Clone)]
pub struct MintedToken {
    pub claims: TokenClaims,
    pub name_correction: Option<NameCorrection>,
}

/// Client-initiated session events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTrigger<'a> {
    /// The client changed its display name.
    Update { name: &'a str },
}

/// Input to [`SessionManager::project_session`].
#[derive(Debug, Clone, Copy)]
pub struct ProjectContext<'a> {
    pub claims: &'a TokenClaims,
    pub trigger: Option<SessionTrigger<'a>>,
}

/// A freshly signed session ready to be set as a cookie.
#[derive(Debug, Clone)]
pub struct SignedSession {
    pub token: String,
    pub session: SessionView,
}

/// Issues, verifies and projects session tokens.
///
/// Built from an explicit [`AuthConfig`] so several managers (for example
/// with test and production keys) can coexist in one process.
#[derive(Debug, Clone)]
pub struct SessionManager {
    codec: TokenCodec,
    secure_cookies: bool,
}

impl SessionManager {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            codec: TokenCodec::new(&config.secret, config.session_max_age),
            secure_cookies: config.secure_cookies,
        }
    }

    #[must_use]
    pub const fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub const fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Check an email/password pair.
    ///
    /// Unknown emails, malformed emails, accounts without a password and
    /// wrong passwords all yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` only when the store itself fails.
    #[instrument(skip(self, store, password))]
    pub async fn authenticate<S: CredentialStore>(
        &self,
        store: &S,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthenticatedUser>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };

        let Some(user) = store.find_by_email(&email).await? else {
            tracing::debug!("no account for email");
            return Ok(None);
        };

        let Some(hash) = user.password_hash.as_deref() else {
            tracing::debug!(user_id = %user.id, "account has no password");
            return Ok(None);
        };

        if !verify_password(password, hash) {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Ok(None);
        }

        Ok(Some(user.identity()))
    }

    /// Build token claims for a freshly authenticated user.
    #[must_use]
    pub fn mint_token(&self, ctx: MintContext<'_>) -> MintedToken {
        let MintContext { user, now } = ctx;

        let name_correction = (user.name == NO_NAME).then(|| NameCorrection {
            user_id: user.id,
            name: derive_display_name(&user.email),
        });
        let name = name_correction
            .as_ref()
            .map_or_else(|| user.name.clone(), |c| c.name.clone());

        MintedToken {
            claims: TokenClaims {
                sub: user.id,
                role: user.role,
                name,
                email: Some(user.email.as_str().to_string()),
                iat: now.timestamp(),
                exp: (now + self.codec.max_age()).timestamp(),
            },
            name_correction,
        }
    }

    /// Re-issue claims with a new display name and a fresh expiry window.
    #[must_use]
    pub fn refresh_claims(&self, claims: &TokenClaims, name: &str, now: DateTime<Utc>) -> TokenClaims {
        TokenClaims {
            name: name.to_string(),
            iat: now.timestamp(),
            exp: (now + self.codec.max_age()).timestamp(),
            ..claims.clone()
        }
    }

    /// Project verified claims into the session view.
    ///
    /// An [`SessionTrigger::Update`] overrides the token's name with the
    /// caller-supplied one.
    #[must_use]
    pub fn project_session(&self, ctx: ProjectContext<'_>) -> SessionView {
        let ProjectContext { claims, trigger } = ctx;

        let name = match trigger {
            Some(SessionTrigger::Update { name }) => name.to_string(),
            None => claims.name.clone(),
        };

        SessionView {
            user: SessionUser {
                id: claims.sub,
                name,
                email: claims.email.clone(),
                role: claims.role,
            },
            expires: claims.expires_at(),
        }
    }

    /// Write a derived display name back to the store.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the write fails.
    #[instrument(skip(self, store), fields(user_id = %correction.user_id))]
    pub async fn persist_name_correction<S: CredentialStore>(
        &self,
        store: &S,
        correction: &NameCorrection,
    ) -> Result<(), AuthError> {
        store
            .update_name(correction.user_id, &correction.name)
            .await?;
        Ok(())
    }

    /// Sign claims and project them in one step.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn sign(&self, claims: &TokenClaims) -> Result<SignedSession, AuthError> {
        let token = self.codec.encode(claims)?;
        let session = self.project_session(ProjectContext {
            claims,
            trigger: None,
        });
        Ok(SignedSession { token, session })
    }

    /// Authenticate, mint, persist any name correction and sign.
    ///
    /// Returns `Ok(None)` when the credentials are rejected. A failed name
    /// correction is logged and does not block sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails or
    /// `AuthError::Token` if signing fails.
    pub async fn sign_in<S: CredentialStore>(
        &self,
        store: &S,
        email: &str,
        password: &str,
    ) -> Result<Option<SignedSession>, AuthError> {
        let Some(user) = self.authenticate(store, email, password).await? else {
            return Ok(None);
        };

        let minted = self.mint_token(MintContext {
            user: &user,
            now: Utc::now(),
        });

        if let Some(correction) = &minted.name_correction
            && let Err(e) = self.persist_name_correction(store, correction).await
        {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to persist display name");
        }

        tracing::info!(user_id = %user.id, role = %user.role, "User signed in");
        self.sign(&minted.claims).map(Some)
    }

    /// Verify a token and project it, or `None` if it is not acceptable.
    #[must_use]
    pub fn decode_session(&self, token: &str) -> Option<(TokenClaims, SessionView)> {
        match self.codec.decode(token) {
            Ok(claims) => {
                let session = self.project_session(ProjectContext {
                    claims: &claims,
                    trigger: None,
                });
                Some((claims, session))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                None
            }
        }
    }

    /// Register a password account with the `user` role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword`,
    /// `AuthError::PasswordHash`, or `AuthError::Repository` (including
    /// `RepositoryError::Conflict` for a taken email).
    #[instrument(skip(self, store, password))]
    pub async fn register<S: CredentialStore>(
        &self,
        store: &S,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let hash = hash_password(password)?;

        let name = name.trim();
        let name = if name.is_empty() { NO_NAME } else { name };

        let user = store
            .create_user(name, &email, &hash, UserRole::User)
            .await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.identity())
    }
}

/// Display name derived from an email: its local part.
///
/// Addresses are stored lowercased, so `Jane.Doe@x.com` yields `jane.doe`.
#[must_use]
pub fn derive_display_name(email: &Email) -> String {
    email.local_part().to_string()
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash string in constant time.
///
/// A malformed stored hash counts as a mismatch.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    //! In-memory credential store for tests.

    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        pub users: Mutex<Vec<UserRecord>>,
        pub fail_updates: bool,
        pub fail_lookups: bool,
    }

    impl MemoryStore {
        #[allow(clippy::unwrap_used)]
        pub fn with_user(name: &str, email: &str, password: Option<&str>, role: UserRole) -> Self {
            let store = Self::default();
            store.users.lock().unwrap().push(UserRecord {
                id: UserId::new(),
                name: name.to_string(),
                email: Email::parse(email).unwrap(),
                role,
                password_hash: password.map(|p| hash_password(p).unwrap()),
                created_at: Utc::now(),
            });
            store
        }

        #[allow(clippy::unwrap_used)]
        pub fn name_of(&self, email: &str) -> Option<String> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email.as_str() == email)
                .map(|u| u.name.clone())
        }
    }

    #[allow(clippy::unwrap_used)]
    impl CredentialStore for MemoryStore {
        async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, RepositoryError> {
            if self.fail_lookups {
                return Err(RepositoryError::DataCorruption("lookup failed".to_string()));
            }
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| &u.email == email)
                .cloned())
        }

        async fn update_name(&self, id: UserId, name: &str) -> Result<(), RepositoryError> {
            if self.fail_updates {
                return Err(RepositoryError::NotFound);
            }
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or(RepositoryError::NotFound)?;
            user.name = name.to_string();
            Ok(())
        }

        async fn create_user(
            &self,
            name: &str,
            email: &Email,
            password_hash: &str,
            role: UserRole,
        ) -> Result<UserRecord, RepositoryError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| &u.email == email) {
                return Err(RepositoryError::Conflict {
                    field: Some("email".to_string()),
                });
            }
            let record = UserRecord {
                id: UserId::new(),
                name: name.to_string(),
                email: email.clone(),
                role,
                password_hash: Some(password_hash.to_string()),
                created_at: Utc::now(),
            };
            users.push(record.clone());
            Ok(record)
        }
    }

    pub fn manager() -> SessionManager {
        SessionManager::new(&AuthConfig {
            secret: secrecy::SecretString::from("t7#Kp2$vQ9!mZ4@xL8^rB3&nW6*cF1%h"),
            session_max_age: chrono::Duration::days(30),
            secure_cookies: false,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::testing::{MemoryStore, manager};
    use super::*;

    #[tokio::test]
    async fn test_authenticate_success_returns_identity() {
        let store = MemoryStore::with_user("Jane", "jane@x.com", Some("hunter22"), UserRole::Admin);
        let user = manager()
            .authenticate(&store, "jane@x.com", "hunter22")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.name, "Jane");
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.email.as_str(), "jane@x.com");
    }

    #[tokio::test]
    async fn test_authenticate_rejections_are_not_errors() {
        let store = MemoryStore::with_user("Jane", "jane@x.com", Some("hunter22"), UserRole::User);
        let manager = manager();

        for (email, password) in [
            ("jane@x.com", "wrong-password"),
            ("nobody@x.com", "hunter22"),
            ("not an email", "hunter22"),
            ("", ""),
        ] {
            let result = manager.authenticate(&store, email, password).await;
            assert!(matches!(result, Ok(None)), "{email}/{password}");
        }
    }

    #[tokio::test]
    async fn test_authenticate_rejects_account_without_password() {
        let store = MemoryStore::with_user("Fed", "fed@x.com", None, UserRole::User);
        let result = manager().authenticate(&store, "fed@x.com", "").await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_authenticate_propagates_store_failure() {
        let store = MemoryStore {
            fail_lookups: true,
            ..MemoryStore::default()
        };
        let result = manager().authenticate(&store, "jane@x.com", "pw").await;
        assert!(matches!(result, Err(AuthError::Repository(_))));
    }

    #[test]
    fn test_mint_token_derives_name_from_email() {
        let user = AuthenticatedUser {
            id: UserId::new(),
            name: NO_NAME.to_string(),
            email: Email::parse("jane@x.com").unwrap(),
            role: UserRole::User,
        };
        let now = Utc::now();
        let minted = manager().mint_token(MintContext { user: &user, now });

        assert_eq!(minted.claims.name, "jane");
        assert_eq!(
            minted.name_correction,
            Some(NameCorrection {
                user_id: user.id,
                name: "jane".to_string(),
            })
        );
        assert_eq!(minted.claims.exp - minted.claims.iat, Duration::days(30).num_seconds());
    }

    #[test]
    fn test_derived_name_uses_normalized_local_part() {
        let email = Email::parse("Jane.Doe@X.com").unwrap();
        assert_eq!(derive_display_name(&email), "jane.doe");
    }

    #[test]
    fn test_mint_token_copies_role_and_keeps_real_name() {
        let user = AuthenticatedUser {
            id: UserId::new(),
            name: "Ada".to_string(),
            email: Email::parse("ada@x.com").unwrap(),
            role: UserRole::Admin,
        };
        let minted = manager().mint_token(MintContext {
            user: &user,
            now: Utc::now(),
        });
        assert_eq!(minted.claims.role, UserRole::Admin);
        assert_eq!(minted.claims.sub, user.id);
        assert_eq!(minted.claims.name, "Ada");
        assert!(minted.name_correction.is_none());
    }

    #[test]
    fn test_project_session_with_and_without_update() {
        let manager = manager();
        let claims = TokenClaims {
            sub: UserId::new(),
            role: UserRole::User,
            name: "jane".to_string(),
            email: None,
            iat: 0,
            exp: 1_000,
        };

        let plain = manager.project_session(ProjectContext {
            claims: &claims,
            trigger: None,
        });
        assert_eq!(plain.user.id, claims.sub);
        assert_eq!(plain.user.name, "jane");
        assert!(!plain.is_admin());

        let updated = manager.project_session(ProjectContext {
            claims: &claims,
            trigger: Some(SessionTrigger::Update { name: "Jane Doe" }),
        });
        assert_eq!(updated.user.name, "Jane Doe");
        assert_eq!(updated.expires.timestamp(), 1_000);
    }

    #[tokio::test]
    async fn test_sign_in_persists_name_correction() {
        let store = MemoryStore::with_user(NO_NAME, "jane@x.com", Some("hunter22"), UserRole::User);
        let signed = manager()
            .sign_in(&store, "jane@x.com", "hunter22")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(signed.session.user.name, "jane");
        assert_eq!(store.name_of("jane@x.com").as_deref(), Some("jane"));
    }

    #[tokio::test]
    async fn test_sign_in_survives_failed_name_write() {
        let store = MemoryStore {
            fail_updates: true,
            ..MemoryStore::with_user(NO_NAME, "jane@x.com", Some("hunter22"), UserRole::User)
        };
        let signed = manager()
            .sign_in(&store, "jane@x.com", "hunter22")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signed.session.user.name, "jane");
        assert_eq!(store.name_of("jane@x.com").as_deref(), Some(NO_NAME));
    }

    #[tokio::test]
    async fn test_signed_token_decodes_to_same_session() {
        let store = MemoryStore::with_user("Ada", "ada@x.com", Some("hunter22"), UserRole::Admin);
        let manager = manager();
        let signed = manager
            .sign_in(&store, "ada@x.com", "hunter22")
            .await
            .unwrap()
            .unwrap();

        let (_, session) = manager.decode_session(&signed.token).unwrap();
        assert_eq!(session, signed.session);
        assert!(session.is_admin());
    }

    #[test]
    fn test_decode_session_rejects_tampered_token() {
        assert!(manager().decode_session("eyJhbGciOiJIUzI1NiJ9.e30.bad").is_none());
    }

    #[test]
    fn test_refresh_claims_slides_window() {
        let manager = manager();
        let old = TokenClaims {
            sub: UserId::new(),
            role: UserRole::Admin,
            name: "old".to_string(),
            email: Some("a@b.c".to_string()),
            iat: 10,
            exp: 20,
        };
        let now = Utc::now();
        let fresh = manager.refresh_claims(&old, "new", now);
        assert_eq!(fresh.name, "new");
        assert_eq!(fresh.role, UserRole::Admin);
        assert_eq!(fresh.sub, old.sub);
        assert_eq!(fresh.iat, now.timestamp());
        assert!(fresh.exp > old.exp);
    }

    #[tokio::test]
    async fn test_register_then_sign_in() {
        let store = MemoryStore::default();
        let manager = manager();
        let user = manager
            .register(&store, "  ", "New@X.com", "secret1")
            .await
            .unwrap();
        assert_eq!(user.name, NO_NAME);
        assert_eq!(user.role, UserRole::User);

        let signed = manager
            .sign_in(&store, "new@x.com", "secret1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signed.session.user.name, "new");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_weak_passwords() {
        let store = MemoryStore::with_user("Jane", "jane@x.com", Some("hunter22"), UserRole::User);
        let manager = manager();

        let dup = manager.register(&store, "J", "jane@x.com", "hunter22").await;
        assert!(matches!(
            dup,
            Err(AuthError::Repository(RepositoryError::Conflict { .. }))
        ));

        let weak = manager.register(&store, "K", "k@x.com", "123").await;
        assert!(matches!(weak, Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }
}
