//! Status transition rules.
//!
//! `queued -> in_progress -> {completed | queued}` and `queued -> cancelled`.
//! Every function here validates the current status first and leaves the item
//! untouched when the precondition fails.

use chrono::{DateTime, Utc};

use crate::error::{QueueError, Result};
use crate::item::{new_claim_token, Item, ItemStatus};

/// Index of the queued item with the smallest `created_at`, ignoring where it
/// sits in the collection.
pub fn next_queued_index(items: &[Item]) -> Option<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.status == ItemStatus::Queued)
        .min_by_key(|(_, item)| item.created_at)
        .map(|(idx, _)| idx)
}

pub fn claim(item: &mut Item, agent: Option<&str>, now: DateTime<Utc>) -> Result<()> {
    require(item, ItemStatus::Queued, "claim")?;
    item.status = ItemStatus::InProgress;
    item.claimed_at = Some(now);
    item.claimed_by = agent.map(str::to_string);
    item.claim_token = Some(new_claim_token());
    Ok(())
}

/// Claim fields other than the token are kept as a record of who did the work.
pub fn complete(
    item: &mut Item,
    agent: Option<&str>,
    result: Option<&str>,
    now: DateTime<Utc>,
) -> Result<()> {
    require(item, ItemStatus::InProgress, "complete")?;
    item.status = ItemStatus::Completed;
    item.completed_at = Some(now);
    item.completed_by = agent.map(str::to_string);
    item.result = result.map(str::to_string);
    item.claim_token = None;
    Ok(())
}

pub fn requeue(item: &mut Item, reason: &str, agent: Option<&str>) -> Result<()> {
    validate_reason(reason)?;
    require(item, ItemStatus::InProgress, "requeue")?;
    item.status = ItemStatus::Queued;
    item.claimed_at = None;
    item.claimed_by = None;
    item.claim_token = None;
    item.requeue_reason = Some(reason.to_string());
    item.requeued_by = agent.map(str::to_string);
    Ok(())
}

pub fn cancel(item: &mut Item, now: DateTime<Utc>) -> Result<()> {
    require(item, ItemStatus::Queued, "cancel")?;
    item.status = ItemStatus::Cancelled;
    item.cancelled_at = Some(now);
    Ok(())
}

pub fn validate_reason(reason: &str) -> Result<()> {
    if reason.trim().is_empty() {
        return Err(QueueError::Validation(
            "A requeue reason is required".to_string(),
        ));
    }
    Ok(())
}

fn require(item: &Item, expected: ItemStatus, action: &'static str) -> Result<()> {
    if item.status != expected {
        return Err(QueueError::InvalidState {
            action,
            id: item.short_id().to_string(),
            status: item.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap()
    }

    fn queued(title: &str, created_at: DateTime<Utc>) -> Item {
        Item::with_created_at(title, "desc", created_at)
    }

    #[test]
    fn next_queued_picks_oldest_regardless_of_position() {
        let items = vec![
            queued("Newer", at(2025, 6)),
            queued("Older", at(2025, 1)),
        ];
        assert_eq!(next_queued_index(&items), Some(1));
    }

    #[test]
    fn next_queued_skips_non_queued() {
        let mut old = queued("In progress", at(2024, 1));
        claim(&mut old, None, at(2024, 2)).expect("claim");
        let items = vec![old, queued("Queued", at(2025, 1))];
        assert_eq!(next_queued_index(&items), Some(1));
        assert_eq!(next_queued_index(&items[..1]), None);
    }

    #[test]
    fn claim_sets_token_and_claim_fields() {
        let mut item = queued("A", at(2025, 1));
        claim(&mut item, Some("agent-1"), at(2025, 2)).expect("claim");
        assert_eq!(item.status, ItemStatus::InProgress);
        assert_eq!(item.claimed_by.as_deref(), Some("agent-1"));
        assert_eq!(item.claimed_at, Some(at(2025, 2)));
        assert!(item.claim_token.is_some());
    }

    #[test]
    fn complete_clears_token_but_keeps_claim_record() {
        let mut item = queued("A", at(2025, 1));
        claim(&mut item, Some("agent"), at(2025, 2)).expect("claim");
        complete(&mut item, Some("agent"), Some("done"), at(2025, 3)).expect("complete");
        assert_eq!(item.status, ItemStatus::Completed);
        assert!(item.claim_token.is_none());
        assert_eq!(item.claimed_at, Some(at(2025, 2)));
        assert_eq!(item.completed_at, Some(at(2025, 3)));
        assert_eq!(item.result.as_deref(), Some("done"));
        assert_eq!(item.created_at, at(2025, 1));
    }

    #[test]
    fn requeue_clears_claim_and_records_reason() {
        let mut item = queued("A", at(2025, 1));
        claim(&mut item, Some("agent"), at(2025, 2)).expect("claim");
        requeue(&mut item, "blocked", Some("agent")).expect("requeue");
        assert_eq!(item.status, ItemStatus::Queued);
        assert!(item.claimed_at.is_none());
        assert!(item.claimed_by.is_none());
        assert!(item.claim_token.is_none());
        assert_eq!(item.requeue_reason.as_deref(), Some("blocked"));
        assert_eq!(item.requeued_by.as_deref(), Some("agent"));
        assert_eq!(item.created_at, at(2025, 1));
    }

    #[test]
    fn requeue_rejects_empty_reason_before_status_check() {
        let mut item = queued("A", at(2025, 1));
        let err = requeue(&mut item, "  ", None).unwrap_err();
        assert!(matches!(err, QueueError::Validation(_)));
        assert_eq!(item.status, ItemStatus::Queued);
    }

    #[test]
    fn requeue_rejects_queued_item() {
        let mut item = queued("A", at(2025, 1));
        let err = requeue(&mut item, "reason", None).unwrap_err();
        assert!(matches!(
            err,
            QueueError::InvalidState {
                status: ItemStatus::Queued,
                ..
            }
        ));
    }

    #[test]
    fn cancel_only_from_queued() {
        let mut item = queued("A", at(2025, 1));
        claim(&mut item, None, at(2025, 2)).expect("claim");
        let err = cancel(&mut item, at(2025, 3)).unwrap_err();
        assert!(err.to_string().contains("\"in_progress\""));
        assert!(item.cancelled_at.is_none());

        let mut fresh = queued("B", at(2025, 1));
        cancel(&mut fresh, at(2025, 3)).expect("cancel");
        assert_eq!(fresh.status, ItemStatus::Cancelled);
        assert_eq!(fresh.cancelled_at, Some(at(2025, 3)));
    }

    #[test]
    fn terminal_items_reject_every_transition() {
        let mut done = queued("A", at(2025, 1));
        claim(&mut done, None, at(2025, 2)).expect("claim");
        complete(&mut done, None, None, at(2025, 3)).expect("complete");

        assert!(claim(&mut done, None, at(2025, 4)).is_err());
        assert!(complete(&mut done, None, None, at(2025, 4)).is_err());
        assert!(requeue(&mut done, "again", None).is_err());
        assert!(cancel(&mut done, at(2025, 4)).is_err());
        assert_eq!(done.status, ItemStatus::Completed);
    }
}
