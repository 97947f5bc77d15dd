//! Session bootstrap: acquires the bearer credential once per application lifetime.

use std::sync::{Arc, OnceLock};

use shared::domain::Credential;
use tracing::{error, info};

use crate::{
    error::{ClientError, ErrorKind, AUTH_FAILED_MESSAGE},
    notifications::NotificationCenter,
    transport::DocumentApi,
};

pub struct SessionBootstrapper {
    api: Arc<dyn DocumentApi>,
    notifications: NotificationCenter,
    credential: OnceLock<Credential>,
}

impl SessionBootstrapper {
    pub fn new(api: Arc<dyn DocumentApi>, notifications: NotificationCenter) -> Self {
        Self {
            api,
            notifications,
            credential: OnceLock::new(),
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.get()
    }

    /// Logs in as `identity`. Failures are published and never retried; once a
    /// credential is held it is returned without touching the network.
    pub async fn acquire_credential(&self, identity: &str) -> Result<Credential, ClientError> {
        if let Some(credential) = self.credential.get() {
            return Ok(credential.clone());
        }

        match self.api.login(identity).await {
            Ok(credential) => {
                info!(identity, "session: credential acquired");
                Ok(self.credential.get_or_init(|| credential).clone())
            }
            Err(err) => {
                error!(identity, error = %err, "session: authentication failed");
                let message = match err.kind() {
                    ErrorKind::Transport => err.user_message(),
                    _ => AUTH_FAILED_MESSAGE.to_string(),
                };
                self.notifications.publish_error(message);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
