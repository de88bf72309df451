//! Messages between accounts, and the booking-time note to a listing owner.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use studio_shared::constants::GUEST_PARTICIPANT_NAME;
use studio_shared::error::DomainResult;
use studio_shared::models::{ConversationSummary, Message};
use studio_shared::repository::Repositories;
use studio_shared::{AccountId, Actor, DomainError, MessageId};
use tracing::debug;

#[derive(Clone)]
pub struct MessageSideEffect {
    repo: Arc<dyn Repositories>,
}

impl MessageSideEffect {
    pub fn new(repo: Arc<dyn Repositories>) -> Self {
        Self { repo }
    }

    /// Persist a message to `receiver`. Fails with `InvalidReceiver` when the
    /// receiver does not resolve; no other authorization is applied.
    pub fn record(
        &self,
        sender: Option<AccountId>,
        receiver: AccountId,
        content: String,
        guest_name: Option<String>,
    ) -> DomainResult<Message> {
        if self.repo.get_account(receiver)?.is_none() {
            return Err(DomainError::InvalidReceiver(receiver));
        }

        let message = Message {
            id: MessageId::new(),
            sender_id: sender,
            receiver_id: receiver,
            guest_name,
            content,
            created_at: Utc::now(),
        };
        self.repo.create_message(&message)?;
        debug!(message_id = %message.id, receiver = %receiver, "Recorded message");
        Ok(message)
    }

    /// Account-to-account send.
    pub fn send(&self, actor: &Actor, receiver: AccountId, content: &str) -> DomainResult<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::validation("Message content is required"));
        }
        if actor.id == receiver {
            return Err(DomainError::validation("Cannot send a message to yourself"));
        }
        self.record(Some(actor.id), receiver, content.to_string(), None)
    }

    /// Messages exchanged with `other`, oldest first.
    pub fn conversation(&self, actor: &Actor, other: AccountId) -> DomainResult<Vec<Message>> {
        Ok(self.repo.conversation(actor.id, other)?)
    }

    /// One entry per counterpart account and one per guest message, newest
    /// first.
    pub fn conversation_summaries(&self, actor: &Actor) -> DomainResult<Vec<ConversationSummary>> {
        let messages = self.repo.messages_involving(actor.id)?;
        let mut seen: HashSet<AccountId> = HashSet::new();
        let mut summaries = Vec::new();

        for message in messages {
            let Some(sender) = message.sender_id else {
                summaries.push(ConversationSummary {
                    id: message.id,
                    participant_id: None,
                    participant_name: message
                        .guest_name
                        .clone()
                        .unwrap_or_else(|| GUEST_PARTICIPANT_NAME.to_string()),
                    participant_avatar: None,
                    last_message: message.content,
                    last_message_at: message.created_at,
                });
                continue;
            };

            let counterpart = if sender == actor.id {
                message.receiver_id
            } else {
                sender
            };
            if !seen.insert(counterpart) {
                continue;
            }

            let Some(account) = self.repo.get_account(counterpart)? else {
                debug!(account = %counterpart, "Skipping conversation with missing account");
                continue;
            };
            summaries.push(ConversationSummary {
                id: message.id,
                participant_id: Some(counterpart),
                participant_name: account.name,
                participant_avatar: account.avatar,
                last_message: message.content,
                last_message_at: message.created_at,
            });
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_account, store};
    use studio_shared::Role;

    #[test]
    fn record_requires_resolvable_receiver() {
        let repo = store();
        let messages = MessageSideEffect::new(repo);
        let ghost = AccountId::new();
        assert_eq!(
            messages.record(None, ghost, "hi".into(), Some("Guest".into())),
            Err(DomainError::InvalidReceiver(ghost))
        );
    }

    #[test]
    fn send_validates_content_and_receiver() {
        let repo = store();
        let alice = seed_account(&repo, "alice@example.com", Role::Client);
        let bob = seed_account(&repo, "bob@example.com", Role::ListingOwner);
        let messages = MessageSideEffect::new(repo);

        assert!(matches!(
            messages.send(&alice, bob.id, "   "),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            messages.send(&alice, alice.id, "hello me"),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            messages.send(&alice, AccountId::new(), "hello"),
            Err(DomainError::InvalidReceiver(_))
        ));

        let sent = messages.send(&alice, bob.id, "  hello  ").unwrap();
        assert_eq!(sent.content, "hello");
        assert_eq!(sent.sender_id, Some(alice.id));
    }

    #[test]
    fn summaries_group_accounts_and_list_each_guest() {
        let repo = store();
        let owner = seed_account(&repo, "owner@example.com", Role::ListingOwner);
        let client = seed_account(&repo, "client@example.com", Role::Client);
        let messages = MessageSideEffect::new(repo);

        messages.send(&client, owner.id, "first").unwrap();
        messages.send(&owner, client.id, "reply").unwrap();
        messages
            .record(None, owner.id, "guest note".into(), Some("Jean".into()))
            .unwrap();
        messages.record(None, owner.id, "anon".into(), None).unwrap();

        let summaries = messages.conversation_summaries(&owner).unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].participant_name, GUEST_PARTICIPANT_NAME);
        assert_eq!(summaries[1].participant_name, "Jean");
        assert_eq!(summaries[2].participant_id, Some(client.id));
        assert_eq!(summaries[2].last_message, "reply");

        let thread = messages.conversation(&owner, client.id).unwrap();
        let contents: Vec<_> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "reply"]);
    }
}
