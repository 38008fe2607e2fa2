//! The alert pipeline.
//!
//! Turns a detected danger condition into one Alert plus one companion
//! chat Message per guardian. Location is attached best-effort through
//! the fallback ladder; guardians are fanned out concurrently with no
//! ordering or atomicity across them; every record is written to the
//! local cache synchronously and to the remote store best-effort. The
//! alert counts as sent once local persistence and the fan-out loop
//! complete, whatever the remote outcome.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info};

use vigil_remote::{paths, RemoteStore};
use vigil_sense::Fix;
use vigil_shared::{Address, Alert, AlertReason, Message, User};

use crate::location::LocationLadder;
use crate::replicate;
use crate::{lock_db, Result, SharedDb};

/// What a completed trigger looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertOutcome {
    /// Guardians whose Alert and Message reached the local cache.
    pub guardians_alerted: usize,
    pub location_attached: bool,
}

pub struct AlertPipeline {
    db: SharedDb,
    remote: Arc<dyn RemoteStore>,
    ladder: Arc<LocationLadder>,
}

impl AlertPipeline {
    pub fn new(db: SharedDb, remote: Arc<dyn RemoteStore>, ladder: Arc<LocationLadder>) -> Self {
        Self { db, remote, ladder }
    }

    /// Raise an alert for `user` toward every configured guardian.
    ///
    /// An empty guardian set is a no-op, not an error. Location failure
    /// degrades to records without coordinates. Per-guardian local
    /// failures are logged and excluded from the count; they never fail
    /// the trigger as a whole.
    pub async fn trigger(&self, user: &User, reason: AlertReason) -> Result<AlertOutcome> {
        let fix = self.ladder.acquire(&user.address).await;

        if user.guardians.is_empty() {
            info!(user = %user.address, reason = %reason, "no guardians configured, nothing to send");
            return Ok(AlertOutcome {
                guardians_alerted: 0,
                location_attached: fix.is_some(),
            });
        }

        let deliveries = user
            .guardians
            .iter()
            .map(|guardian| self.alert_guardian(user, guardian, &reason, fix));
        let results = join_all(deliveries).await;

        let mut alerted = 0;
        for (guardian, result) in user.guardians.iter().zip(results) {
            match result {
                Ok(()) => alerted += 1,
                Err(e) => {
                    error!(guardian = %guardian, error = %e, "guardian delivery failed locally");
                }
            }
        }

        info!(
            user = %user.address,
            reason = %reason,
            guardians = alerted,
            with_location = fix.is_some(),
            "alert sent"
        );

        Ok(AlertOutcome {
            guardians_alerted: alerted,
            location_attached: fix.is_some(),
        })
    }

    /// One guardian's Alert + companion Message: local cache writes are
    /// synchronous and decide success; remote writes are best-effort.
    async fn alert_guardian(
        &self,
        user: &User,
        guardian: &Address,
        reason: &AlertReason,
        fix: Option<Fix>,
    ) -> Result<()> {
        let mut message = Message::new(
            user.address.clone(),
            guardian.clone(),
            &alert_text(&user.name, reason),
        );
        let mut alert = Alert::new(user.address.clone(), guardian.clone(), reason.clone());
        if let Some(f) = fix {
            message = message.with_location(f.latitude, f.longitude);
            alert = alert.with_location(f.latitude, f.longitude);
        }

        {
            let db = lock_db(&self.db)?;
            db.insert_message(&message)?;
            db.insert_alert(&alert)?;
        }

        let message_path = paths::message(&message.pair_key(), &message.id);
        replicate::set(self.remote.as_ref(), &message_path, &message).await;
        let alert_path = paths::alert(guardian, &alert.id);
        replicate::set(self.remote.as_ref(), &alert_path, &alert).await;

        Ok(())
    }
}

/// The human-readable companion message body. Reason codes stay raw in
/// the Alert record; this string is what lands in the chat thread.
fn alert_text(name: &str, reason: &AlertReason) -> String {
    let cause = match reason {
        AlertReason::PhraseDetected => "their danger phrase was heard",
        AlertReason::DistressDetected => "sounds of distress were detected",
        AlertReason::Manual => "they pressed the emergency button",
        AlertReason::TimerExpired => "their safety timer ran out",
        AlertReason::Other(text) => text,
    };
    format!("EMERGENCY: {name} may be in danger: {cause}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_text_names_the_user_and_cause() {
        let text = alert_text("Ana", &AlertReason::TimerExpired);
        assert!(text.contains("Ana"));
        assert!(text.contains("safety timer"));
    }
}
