use crate::error::{QueueError, Result};
use crate::item::Item;

/// Map a full id or an unambiguous id prefix to a position in `items`.
///
/// An exact id match wins even when the same string prefixes another id.
pub fn resolve_index(items: &[Item], input: &str) -> Result<usize> {
    if input.is_empty() {
        return Err(QueueError::NotFound(input.to_string()));
    }
    if let Some(idx) = items.iter().position(|item| item.id == input) {
        return Ok(idx);
    }
    let matches: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.id.starts_with(input))
        .map(|(idx, _)| idx)
        .collect();
    match matches.as_slice() {
        [] => Err(QueueError::NotFound(input.to_string())),
        [idx] => Ok(*idx),
        many => Err(QueueError::AmbiguousPrefix {
            prefix: input.to_string(),
            count: many.len(),
        }),
    }
}

/// Claim tokens are matched exactly, never by prefix.
pub fn resolve_token_index(items: &[Item], token: &str) -> Result<usize> {
    items
        .iter()
        .position(|item| item.claim_token.as_deref() == Some(token))
        .ok_or_else(|| QueueError::TokenNotFound(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_id(id: &str) -> Item {
        let mut item = Item::new("Title", "desc");
        item.id = id.to_string();
        item
    }

    #[test]
    fn resolves_full_id_and_unique_prefix() {
        let items = vec![
            item_with_id("abcd0000-0000-0000-0000-000000000000"),
            item_with_id("ef012345-0000-0000-0000-000000000000"),
        ];
        assert_eq!(
            resolve_index(&items, "ef012345-0000-0000-0000-000000000000").expect("full"),
            1
        );
        assert_eq!(resolve_index(&items, "ef").expect("prefix"), 1);
    }

    #[test]
    fn ambiguous_prefix_reports_count() {
        let items = vec![
            item_with_id("abcd0000-0000-0000-0000-000000000000"),
            item_with_id("abcd1111-0000-0000-0000-000000000000"),
        ];
        let err = resolve_index(&items, "abcd").unwrap_err();
        assert!(matches!(
            err,
            QueueError::AmbiguousPrefix { ref prefix, count: 2 } if prefix == "abcd"
        ));
        assert!(err.to_string().contains("Ambiguous id prefix"));
        assert_eq!(resolve_index(&items, "abcd0").expect("longer prefix"), 0);
    }

    #[test]
    fn exact_match_beats_longer_ids_sharing_the_prefix() {
        let items = vec![item_with_id("12"), item_with_id("1")];
        assert_eq!(resolve_index(&items, "1").expect("exact"), 1);
    }

    #[test]
    fn no_match_and_empty_input_are_not_found() {
        let items = vec![item_with_id("abcd")];
        let err = resolve_index(&items, "zzz").unwrap_err();
        assert!(err.to_string().contains("No item found"));
        assert!(matches!(resolve_index(&items, ""), Err(QueueError::NotFound(_))));
    }

    #[test]
    fn tokens_are_never_prefix_matched() {
        let mut item = item_with_id("abcd");
        item.claim_token = Some("token-123".to_string());
        let items = vec![item];
        assert_eq!(resolve_token_index(&items, "token-123").expect("token"), 0);
        assert!(matches!(
            resolve_token_index(&items, "token"),
            Err(QueueError::TokenNotFound(_))
        ));
    }
}
