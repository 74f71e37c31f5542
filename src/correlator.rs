use crate::slack::ChatMessage;

/// Finds the first message whose link points at `/pull/{pr_number}`.
///
/// Matching is plain substring containment on the extracted URL, so
/// `/pull/12` also matches a link to `/pull/123`. Messages without a link
/// never match.
pub fn find_correlated_message(pr_number: u64, messages: &[ChatMessage]) -> Option<&ChatMessage> {
    let needle = format!("/pull/{pr_number}");
    messages
        .iter()
        .find(|message| message.link().is_some_and(|link| link.contains(&needle)))
}
