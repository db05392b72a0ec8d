//! Builds the ordered message list handed to a completion request.

use crate::provider::Message;

/// Prepend the system prompt to the prior turns.
///
/// Prior messages are forwarded in order with their role untouched; the
/// result always has exactly one system message at index 0 that came from
/// `system_prompt`.
pub fn assemble<I>(system_prompt: impl Into<String>, prior: I) -> Vec<Message>
where
    I: IntoIterator<Item = Message>,
{
    let prior = prior.into_iter();
    let mut messages = Vec::with_capacity(1 + prior.size_hint().0);
    messages.push(Message::system(system_prompt));
    messages.extend(prior);
    messages
}
