use crate::{bot::Origin, widget::Widget};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use teloxide::types::ChatId;

#[derive(Default)]
pub struct State {
    pub view: Option<Widget>,
    pub origin: Option<Origin>,
}

/// Per-chat widget stacks. A state is taken out for the duration of an update
/// and put back once the update is handled.
#[derive(Default, Clone)]
pub struct StateHolder {
    map: Arc<Mutex<HashMap<ChatId, State>>>,
    tokens: Tokens,
}

impl StateHolder {
    pub fn get_state(&self, chat_id: ChatId) -> Option<State> {
        self.map.lock().remove(&chat_id)
    }

    pub fn set_state(&self, chat_id: ChatId, state: State) {
        self.map.lock().insert(chat_id, state);
    }

    pub fn get_token(&self, chat_id: ChatId) -> ValidToken {
        self.tokens.get_token(chat_id)
    }

    pub fn tokens(&self) -> Tokens {
        self.tokens.clone()
    }
}

/// Validity flags of the origin message of every chat.
#[derive(Default, Clone)]
pub struct Tokens {
    map: Arc<Mutex<HashMap<ChatId, ValidToken>>>,
}

impl Tokens {
    pub fn get_token(&self, chat_id: ChatId) -> ValidToken {
        self.map.lock().entry(chat_id).or_default().clone()
    }
}

/// Shared flag telling whether a chat's origin message is still the last
/// message of the chat and can be edited in place.
#[derive(Clone, Debug)]
pub struct ValidToken(Arc<AtomicBool>);

impl ValidToken {
    pub fn is_valid(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn invalidate(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn set_valid(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Default for ValidToken {
    fn default() -> Self {
        ValidToken(Arc::new(AtomicBool::new(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_taken_out() {
        let holder = StateHolder::default();
        let chat = ChatId(1);
        holder.set_state(chat, State::default());
        assert!(holder.get_state(chat).is_some());
        assert!(holder.get_state(chat).is_none());
    }

    #[test]
    fn test_tokens_are_shared_per_chat() {
        let holder = StateHolder::default();
        let token = holder.get_token(ChatId(1));
        holder.tokens().get_token(ChatId(1)).invalidate();
        assert!(!token.is_valid());
        assert!(holder.get_token(ChatId(2)).is_valid());
    }
}
