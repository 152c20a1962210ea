use std::ops::{Deref, DerefMut};

use mongodb::ClientSession;

/// Telegram id used as the actor of background jobs.
pub const SYSTEM_ACTOR: i64 = 0;

pub struct Session {
    client_session: ClientSession,
    actor: i64,
}

impl Session {
    pub fn new(client_session: ClientSession, actor: i64) -> Self {
        Session {
            client_session,
            actor,
        }
    }

    /// Telegram id of whoever caused the changes made in this session.
    pub fn actor(&self) -> i64 {
        self.actor
    }
}

impl Deref for Session {
    type Target = ClientSession;

    fn deref(&self) -> &Self::Target {
        &self.client_session
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.client_session
    }
}

impl<'a> From<&'a mut Session> for &'a mut ClientSession {
    fn from(session: &'a mut Session) -> &'a mut ClientSession {
        &mut session.client_session
    }
}
