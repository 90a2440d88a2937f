use anyhow::{Error, Result};
use tracing::{debug, info, warn};

use crate::{
    clients::{fcm::PushGateway, firestore::MessageStore},
    models::{
        message::NotificationRequest, status::MessageStatus, validation::validate_token_list,
    },
};

/// Dispatch one created fcm_messages document. The trigger system invokes
/// this at least once per document; a duplicate invocation after the status
/// write is skipped by the guard below. Every outcome terminates in exactly
/// one status write; there is no retry and no caller to report to, so
/// failures surface only through the status fields and the logs.
pub async fn process_message<G, S>(
    message_id: &str,
    request: &NotificationRequest,
    gateway: &G,
    store: &S,
) -> Result<(), Error>
where
    G: PushGateway,
    S: MessageStore,
{
    info!(
        message_id,
        recipients = request.tokens.len(),
        "Processing notification message"
    );

    // Guard against duplicate trigger invocations. Best effort: a failed
    // read must not block dispatch, since the store is also where the
    // outcome gets written.
    match store.message_status(message_id).await {
        Ok(Some(status)) if status.is_terminal() => {
            info!(message_id, status = %status, "Message already processed, skipping");
            return Ok(());
        }
        Ok(_) => {}
        Err(e) => {
            warn!(message_id, error = %e, "Failed to read current message status, continuing");
        }
    }

    if let Err(e) = validate_token_list(&request.tokens) {
        info!(message_id, "No valid tokens provided for notification");
        store
            .update_message_status(message_id, MessageStatus::Failed, &e.to_string())
            .await?;
        return Ok(());
    }

    let outcome = match gateway
        .send_multicast(&request.tokens, &request.notification, &request.data)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(message_id, error = %e, "Gateway send failed");
            store
                .update_message_status(message_id, MessageStatus::Failed, &e.to_string())
                .await?;
            return Ok(());
        }
    };

    store
        .update_message_status(message_id, MessageStatus::Sent, &outcome.summary())
        .await?;

    info!(
        message_id,
        success = outcome.success_count,
        failed = outcome.failure_count,
        "Notification message processed"
    );

    if outcome.failure_count > 0 {
        match &request.user_id {
            Some(user_id) => {
                let failed_tokens = outcome.failed_tokens(&request.tokens);

                // Cleanup is best effort; the message outcome is already
                // recorded and must not be rewritten over a cleanup error.
                if let Err(e) = cleanup_failed_tokens(store, user_id, &failed_tokens).await {
                    warn!(user_id = %user_id, error = %e, "Device token cleanup failed");
                }
            }
            None => {
                debug!(message_id, "Failed recipients but no user id, skipping token cleanup");
            }
        }
    }

    Ok(())
}

/// Remove tokens the gateway confirmed invalid from the user's document.
/// Read-modify-write with no locking; concurrent cleanup of the same user
/// is last-writer-wins.
pub async fn cleanup_failed_tokens<S>(
    store: &S,
    user_id: &str,
    failed_tokens: &[String],
) -> Result<(), Error>
where
    S: MessageStore,
{
    let Some(current_tokens) = store.user_device_tokens(user_id).await? else {
        info!(user_id, "User does not exist, can't clean up tokens");
        return Ok(());
    };

    let valid_tokens: Vec<String> = current_tokens
        .into_iter()
        .filter(|token| !failed_tokens.contains(token))
        .collect();

    store
        .replace_user_device_tokens(user_id, &valid_tokens)
        .await?;

    info!(
        user_id,
        removed = failed_tokens.len(),
        "Cleaned up invalid device tokens"
    );

    Ok(())
}
