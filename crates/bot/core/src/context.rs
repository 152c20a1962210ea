use crate::bot::TgBot;
use env::Env;
use ledger::{channel::ChannelManager, Ledger};
use model::{
    rights::{Rights, Rule},
    session::Session,
    user::User,
};
use std::ops::{Deref, DerefMut};

pub struct Context {
    pub bot: TgBot,
    pub me: User,
    pub rights: Rights,
    pub ledger: Ledger,
    pub channel: ChannelManager,
    pub env: Env,
    pub session: Session,
}

impl Context {
    pub fn new(
        bot: TgBot,
        me: User,
        ledger: Ledger,
        channel: ChannelManager,
        env: Env,
        session: Session,
    ) -> Context {
        let rights = if env.is_admin(me.tg_id) {
            Rights::full()
        } else {
            Rights::customer()
        };
        Context {
            bot,
            me,
            rights,
            ledger,
            channel,
            env,
            session,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.rights.is_admin()
    }

    pub fn has_right(&self, rule: Rule) -> bool {
        self.rights.has_rule(rule)
    }
}

impl Deref for Context {
    type Target = TgBot;

    fn deref(&self) -> &Self::Target {
        &self.bot
    }
}

impl DerefMut for Context {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bot
    }
}
