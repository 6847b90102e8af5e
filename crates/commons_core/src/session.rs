//! Session resolution
//!
//! The auth collaborator is external; this module defines the seam the
//! messaging core consumes. Components never read ambient session state
//! themselves: the resolved identity is passed into every operation
//! explicitly, which keeps them testable without a live auth provider.

use std::sync::RwLock;

use async_trait::async_trait;
use surrealdb::{Connection, Surreal};
use tokio::sync::watch;

use crate::error::Result;
use crate::profile::{self, Profile};

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    pub profile: Profile,
}

/// Seam over the external auth provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current session, or None when nobody is signed in.
    /// Re-queried per page view; never cached across navigations.
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Notifies on sign-out / session expiry
    fn on_auth_change(&self) -> watch::Receiver<Option<Session>>;
}

/// Resolve the current identity, if any
pub async fn current_identity(auth: &dyn AuthProvider) -> Result<Option<Profile>> {
    Ok(auth.get_session().await?.map(|session| session.profile))
}

/// Auth provider backed by a configured contact address.
///
/// This is the CLI's stand-in for the hosted auth service: the signed-in
/// identity is whichever profile the configured email resolves to.
pub struct ConfigAuth<C: Connection> {
    db: Surreal<C>,
    email: RwLock<Option<String>>,
    changes: watch::Sender<Option<Session>>,
}

impl<C: Connection> ConfigAuth<C> {
    pub fn new(db: Surreal<C>, email: Option<String>) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            db,
            email: RwLock::new(email),
            changes,
        }
    }

    /// Drop the session and notify watchers
    pub fn sign_out(&self) {
        *self.email.write().expect("auth lock poisoned") = None;
        let _ = self.changes.send(None);
    }
}

#[async_trait]
impl<C: Connection> AuthProvider for ConfigAuth<C> {
    async fn get_session(&self) -> Result<Option<Session>> {
        let email = self.email.read().expect("auth lock poisoned").clone();
        let Some(email) = email else {
            return Ok(None);
        };

        let profile = profile::find_profile_by_email(&self.db, email.trim()).await?;
        Ok(profile.map(|profile| Session { profile }))
    }

    fn on_auth_change(&self) -> watch::Receiver<Option<Session>> {
        self.changes.subscribe()
    }
}
