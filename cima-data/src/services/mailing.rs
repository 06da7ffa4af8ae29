//! Mailing list service

use crate::error::{AppError, Result};
use crate::source::DataSource;
use std::sync::Arc;

#[derive(Clone)]
pub struct MailingService {
    source: Arc<dyn DataSource>,
}

impl MailingService {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// Add `email` to the mailing list.
    ///
    /// The address is trimmed and checked before anything is sent.
    pub async fn subscribe(&self, email: &str) -> Result<()> {
        let email = email.trim();
        if !is_plausible_email(email) {
            tracing::warn!("Rejected mailing list address {:?}", email);
            return Err(AppError::InvalidEmail(email.to_string()));
        }

        self.source.subscribe_to_mailing_list(email).await?;
        tracing::info!("Subscribed {} to the mailing list", email);
        Ok(())
    }
}

/// One `@`, a non-empty local part and a dotted domain
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
