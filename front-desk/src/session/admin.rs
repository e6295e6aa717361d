//! Admin session
//!
//! Staff sign in with the backend auth service; the profile snapshot and
//! auth session are persisted in the [`LocalStore`] and revalidated on the
//! next start. Every staff route is gated on a valid session.

use super::store::{ADMIN_PROFILE_KEY, AUTH_SESSION_KEY, LocalStore};
use crate::utils::validation::{MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};
use crate::utils::{AppError, AppResult, ErrorCode};
use chrono::Utc;
use desk_client::{AuthGateway, AuthSession, ClientError, RemoteGateway};
use serde::Serialize;
use shared::models::StaffProfile;
use std::fmt;
use std::sync::Arc;

/// Length at which a password counts as strong
const STRONG_PASSWORD_LEN: usize = 12;

/// Staff-facing pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRoute {
    Login,
    Dashboard,
    QueueManage,
    TableManagement,
    Analytics,
    MyAccount,
}

impl StaffRoute {
    pub fn path(&self) -> &'static str {
        match self {
            StaffRoute::Login => "/login",
            StaffRoute::Dashboard => "/dashboard",
            StaffRoute::QueueManage => "/dashboard/queue",
            StaffRoute::TableManagement => "/dashboard/tables",
            StaffRoute::Analytics => "/dashboard/analytics",
            StaffRoute::MyAccount => "/dashboard/account",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, StaffRoute::Login)
    }
}

impl fmt::Display for StaffRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Strength shown next to the new password field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordStrength {
    Weak,
    Good,
    Strong,
}

pub fn password_strength(password: &str) -> PasswordStrength {
    match password.chars().count() {
        n if n < MIN_PASSWORD_LEN => PasswordStrength::Weak,
        n if n < STRONG_PASSWORD_LEN => PasswordStrength::Good,
        _ => PasswordStrength::Strong,
    }
}

/// Signed-in staff member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub session: AuthSession,
    pub profile: StaffProfile,
}

impl SignedIn {
    /// Tenant every staff read and write is scoped to
    pub fn restaurant_slug(&self) -> &str {
        self.profile.restaurant_slug()
    }
}

pub struct AdminSession {
    auth: Arc<dyn AuthGateway>,
    gateway: Arc<dyn RemoteGateway>,
    store: LocalStore,
    current: Option<SignedIn>,
}

impl fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSession")
            .field("user", &self.current.as_ref().map(|s| s.profile.id))
            .finish()
    }
}

fn login_required(code: ErrorCode) -> AppError {
    AppError::new(code).with_detail("route", StaffRoute::Login.path())
}

impl AdminSession {
    pub fn new(
        auth: Arc<dyn AuthGateway>,
        gateway: Arc<dyn RemoteGateway>,
        store: LocalStore,
    ) -> Self {
        Self {
            auth,
            gateway,
            store,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&SignedIn> {
        self.current.as_ref()
    }

    /// Gate for staff routes
    pub fn require(&self) -> AppResult<&SignedIn> {
        self.current
            .as_ref()
            .ok_or_else(|| login_required(ErrorCode::NotAuthenticated))
    }

    /// Route to render for a requested one
    pub fn guard(&self, requested: StaffRoute) -> StaffRoute {
        match (&self.current, requested.requires_auth()) {
            (None, true) => StaffRoute::Login,
            (Some(_), false) => StaffRoute::Dashboard,
            _ => requested,
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> AppResult<&SignedIn> {
        let session = self
            .auth
            .sign_in(email.trim(), password)
            .await
            .map_err(|e| match e {
                ClientError::Unauthorized(msg) => {
                    AppError::with_message(ErrorCode::InvalidCredentials, msg)
                }
                other => other.into(),
            })?;

        let profile = match self.gateway.get_profile(session.user.id).await? {
            Some(profile) => profile,
            None => {
                tracing::warn!(user_id = %session.user.id, "Signed in user has no staff profile");
                if let Err(e) = self.auth.sign_out(&session).await {
                    tracing::warn!(error = %e, "Sign out after missing profile failed");
                }
                return Err(AppError::permission_denied("No staff profile for this account"));
            }
        };

        self.store.put(AUTH_SESSION_KEY, &session)?;
        self.store.put(ADMIN_PROFILE_KEY, &profile)?;
        tracing::info!(
            user_id = %profile.id,
            restaurant = %profile.restaurant_slug(),
            "Staff signed in"
        );
        Ok(&*self.current.insert(SignedIn { session, profile }))
    }

    /// Revalidate the persisted session on start
    ///
    /// The backend user must match the stored profile and the profile is
    /// refreshed; anything else forces a sign-out.
    pub async fn restore(&mut self) -> AppResult<&SignedIn> {
        let session: Option<AuthSession> = self.store.get(AUTH_SESSION_KEY)?;
        let stored: Option<StaffProfile> = self.store.get(ADMIN_PROFILE_KEY)?;
        let (Some(session), Some(stored)) = (session, stored) else {
            return Err(self.expire("no stored session").await);
        };
        if session.is_expired_at(Utc::now().timestamp()) {
            return Err(self.expire("stored session expired").await);
        }

        let user = match self.auth.current_user(&session).await {
            Ok(user) => user,
            Err(e) if e.is_auth() => return Err(self.expire("session rejected").await),
            Err(e) => return Err(e.into()),
        };
        if user.id != stored.id {
            return Err(self.expire("session belongs to another user").await);
        }

        let profile = match self.gateway.get_profile(user.id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return Err(self.expire("profile no longer exists").await),
            Err(e) if e.is_auth() => return Err(self.expire("profile read rejected").await),
            Err(e) => return Err(e.into()),
        };
        self.store.put(ADMIN_PROFILE_KEY, &profile)?;
        tracing::info!(user_id = %profile.id, "Staff session restored");
        Ok(&*self.current.insert(SignedIn { session, profile }))
    }

    async fn expire(&mut self, reason: &str) -> AppError {
        tracing::info!(reason, "Forcing sign-out");
        if let Err(e) = self.logout().await {
            return e;
        }
        login_required(ErrorCode::SessionExpired).with_detail("reason", reason)
    }

    /// Sign out and clear local state; always lands on the login route
    pub async fn logout(&mut self) -> AppResult<StaffRoute> {
        let session = match self.current.take() {
            Some(signed_in) => Some(signed_in.session),
            None => self.store.get::<AuthSession>(AUTH_SESSION_KEY).ok().flatten(),
        };
        if let Some(session) = session
            && let Err(e) = self.auth.sign_out(&session).await
        {
            tracing::warn!(error = %e, "Backend sign out failed");
        }
        self.store.remove(AUTH_SESSION_KEY)?;
        self.store.remove(ADMIN_PROFILE_KEY)?;
        Ok(StaffRoute::Login)
    }

    pub async fn change_password(&self, new_password: &str, confirm: &str) -> AppResult<()> {
        let signed_in = self.require()?;
        if new_password != confirm {
            return Err(AppError::new(ErrorCode::PasswordMismatch));
        }
        let len = new_password.chars().count();
        if len < MIN_PASSWORD_LEN {
            return Err(AppError::new(ErrorCode::PasswordTooShort)
                .with_detail("min_len", MIN_PASSWORD_LEN));
        }
        if len > MAX_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password is too long ({} chars, max {})",
                len, MAX_PASSWORD_LEN
            )));
        }
        self.auth
            .update_password(&signed_in.session, new_password)
            .await?;
        tracing::info!(user_id = %signed_in.profile.id, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desk_client::InMemoryGateway;
    use shared::models::Restaurant;
    use uuid::Uuid;

    const EMAIL: &str = "manager@spice.house";
    const PASSWORD: &str = "correct horse";

    fn profile(id: Uuid) -> StaffProfile {
        StaffProfile {
            id,
            email: EMAIL.into(),
            full_name: Some("Meera".into()),
            restaurant: Restaurant {
                id: 1,
                name: "Spice House".into(),
                slug: "spice-house".into(),
            },
        }
    }

    fn setup() -> (InMemoryGateway, LocalStore, Uuid) {
        let gateway = InMemoryGateway::new();
        let id = Uuid::new_v4();
        gateway.add_staff(EMAIL, PASSWORD, profile(id));
        (gateway, LocalStore::open_in_memory().unwrap(), id)
    }

    fn admin(gateway: &InMemoryGateway, store: &LocalStore) -> AdminSession {
        AdminSession::new(
            Arc::new(gateway.clone()),
            Arc::new(gateway.clone()),
            store.clone(),
        )
    }

    #[test]
    fn test_password_strength() {
        assert_eq!(password_strength("short"), PasswordStrength::Weak);
        assert_eq!(password_strength("eightchr"), PasswordStrength::Good);
        assert_eq!(password_strength("twelve chars"), PasswordStrength::Strong);
    }

    #[test]
    fn test_route_guard() {
        let (gateway, store, _) = setup();
        let session = admin(&gateway, &store);
        assert_eq!(session.guard(StaffRoute::Analytics), StaffRoute::Login);
        assert_eq!(session.guard(StaffRoute::Login), StaffRoute::Login);
        assert_eq!(
            session.require().unwrap_err().code,
            ErrorCode::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn test_login_persists_and_scopes_tenant() {
        let (gateway, store, id) = setup();
        let mut session = admin(&gateway, &store);

        let signed_in = session.login(EMAIL, PASSWORD).await.unwrap();
        assert_eq!(signed_in.profile.id, id);
        assert_eq!(signed_in.restaurant_slug(), "spice-house");
        assert!(store.contains(AUTH_SESSION_KEY).unwrap());
        assert_eq!(
            store.get::<StaffProfile>(ADMIN_PROFILE_KEY).unwrap(),
            Some(profile(id))
        );
        assert_eq!(session.guard(StaffRoute::Login), StaffRoute::Dashboard);
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let (gateway, store, _) = setup();
        let mut session = admin(&gateway, &store);
        let err = session.login(EMAIL, "wrong").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
        assert!(session.current().is_none());
        assert!(!store.contains(AUTH_SESSION_KEY).unwrap());
    }

    #[tokio::test]
    async fn test_restore_refreshes_profile() {
        let (gateway, store, id) = setup();
        admin(&gateway, &store).login(EMAIL, PASSWORD).await.unwrap();

        // profile renamed on the backend meanwhile
        let mut renamed = profile(id);
        renamed.full_name = Some("Meera K".into());
        gateway.add_staff(EMAIL, PASSWORD, renamed.clone());

        let mut next = admin(&gateway, &store);
        let signed_in = next.restore().await.unwrap();
        assert_eq!(signed_in.profile, renamed);
        assert_eq!(
            store.get::<StaffProfile>(ADMIN_PROFILE_KEY).unwrap(),
            Some(renamed)
        );
    }

    #[tokio::test]
    async fn test_restore_revoked_session_forces_logout() {
        let (gateway, store, _) = setup();
        let token = admin(&gateway, &store)
            .login(EMAIL, PASSWORD)
            .await
            .unwrap()
            .session
            .access_token
            .clone();
        gateway.revoke_session(&token);

        let mut next = admin(&gateway, &store);
        let err = next.restore().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionExpired);
        assert_eq!(err.detail("route"), Some(&serde_json::Value::from("/login")));
        assert!(!store.contains(AUTH_SESSION_KEY).unwrap());
        assert!(!store.contains(ADMIN_PROFILE_KEY).unwrap());
    }

    #[tokio::test]
    async fn test_restore_user_mismatch_forces_logout() {
        let (gateway, store, _) = setup();
        admin(&gateway, &store).login(EMAIL, PASSWORD).await.unwrap();
        store
            .put(ADMIN_PROFILE_KEY, &profile(Uuid::new_v4()))
            .unwrap();

        let err = admin(&gateway, &store).restore().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionExpired);
        assert!(!store.contains(AUTH_SESSION_KEY).unwrap());
    }

    #[tokio::test]
    async fn test_restore_without_state() {
        let (gateway, store, _) = setup();
        let err = admin(&gateway, &store).restore().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionExpired);
    }

    #[tokio::test]
    async fn test_change_password_rules() {
        let (gateway, store, _) = setup();
        let mut session = admin(&gateway, &store);
        assert_eq!(
            session
                .change_password("newpassword", "newpassword")
                .await
                .unwrap_err()
                .code,
            ErrorCode::NotAuthenticated
        );

        session.login(EMAIL, PASSWORD).await.unwrap();
        let err = session.change_password("abcdefgh", "abcdefgX").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PasswordMismatch);
        let err = session.change_password("short", "short").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PasswordTooShort);

        session
            .change_password("a much better one", "a much better one")
            .await
            .unwrap();
        session.logout().await.unwrap();
        assert!(session.login(EMAIL, PASSWORD).await.is_err());
        assert!(session.login(EMAIL, "a much better one").await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let (gateway, store, _) = setup();
        let mut session = admin(&gateway, &store);
        session.login(EMAIL, PASSWORD).await.unwrap();

        assert_eq!(session.logout().await.unwrap(), StaffRoute::Login);
        assert!(session.current().is_none());
        assert!(!store.contains(AUTH_SESSION_KEY).unwrap());
        assert!(!store.contains(ADMIN_PROFILE_KEY).unwrap());
    }
}
