//! Session state shared with the whole UI.
//!
//! One [`AuthContext`] is built at the application root and handed to
//! whoever needs it. Readers take immutable [`AuthSnapshot`]s (or subscribe to
//! changes); only the context's actions publish new snapshots.

use std::sync::Arc;

use tokio::sync::watch;

use crate::client::api::ApiClient;
use crate::client::schema::{ApiError, ProfileIntake, User};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSnapshot {
    pub user: Option<User>,
    /// The intake submitted during this session, if any.
    pub profile: Option<ProfileIntake>,
    pub is_loading: bool,
}

impl AuthSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Whether the dashboard (rather than the intake form) should be shown.
    pub fn profile_complete(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.profile_complete)
    }
}

#[derive(Debug)]
pub struct AuthContext {
    client: Arc<ApiClient>,
    state: watch::Sender<AuthSnapshot>,
}

impl AuthContext {
    /// Starts in the loading state until [`AuthContext::check_session`] runs.
    pub fn new(client: Arc<ApiClient>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot {
            is_loading: true,
            ..Default::default()
        });
        Self { client, state }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Restores an existing session: health check, then the profile.
    ///
    /// Any failure just leaves the user signed out.
    pub async fn check_session(&self) -> AuthSnapshot {
        self.set_loading(true);

        let user = match self.client.health().await {
            Ok(_) => match self.client.profile().await {
                Ok(profile) => Some(profile.user),
                Err(e) => {
                    tracing::debug!(error = %e, "No active session");
                    None
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "Health check failed");
                None
            }
        };

        self.state.send_modify(|s| {
            s.user = user;
            s.is_loading = false;
        });
        self.snapshot()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        self.set_loading(true);
        let result = self.client.login(email, password).await;

        self.state.send_modify(|s| {
            if let Ok(response) = &result {
                s.user = Some(response.user.clone());
            }
            s.is_loading = false;
        });

        result.map(|r| r.user)
    }

    /// A freshly registered user has not filled in the intake yet.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, ApiError> {
        self.set_loading(true);
        let result = self
            .client
            .register(name, email, password)
            .await
            .map(|r| User {
                profile_complete: false,
                ..r.user
            });

        self.state.send_modify(|s| {
            if let Ok(user) = &result {
                s.user = Some(user.clone());
                s.profile = None;
            }
            s.is_loading = false;
        });

        result
    }

    /// Signs out locally even when the backend call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.client.logout().await {
            tracing::warn!(error = %e, "Logout request failed");
        }
        self.state.send_modify(|s| {
            s.user = None;
            s.profile = None;
        });
    }

    pub async fn update_profile(&self, intake: ProfileIntake) -> Result<(), ApiError> {
        self.set_loading(true);
        let result = self.client.save_profile(&intake).await;

        self.state.send_modify(|s| {
            if result.is_ok() {
                if let Some(user) = s.user.as_mut() {
                    user.profile_complete = true;
                    s.profile = Some(intake);
                }
            }
            s.is_loading = false;
        });

        result.map(|_| ())
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_modify(|s| s.is_loading = loading);
    }
}
