use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use eyre::Result;
use ledger::channel::{ChannelGateway, ChannelInfo, Membership};
use teloxide::{
    payloads::{CreateChatInviteLinkSetters as _, UnbanChatMemberSetters as _},
    prelude::Requester as _,
    types::{ChatId, UserId},
    Bot, RequestError,
};

/// [`ChannelGateway`] over the Bot API. The bot must be an administrator of
/// the channel with the right to invite and ban users.
pub struct TgChannel {
    bot: Bot,
    channel_id: ChatId,
}

impl TgChannel {
    pub fn new(bot: Bot, channel_id: i64) -> Self {
        TgChannel {
            bot,
            channel_id: ChatId(channel_id),
        }
    }
}

fn user_id(tg_id: i64) -> UserId {
    UserId(tg_id as u64)
}

#[async_trait]
impl ChannelGateway for TgChannel {
    async fn create_single_use_invite(&self, ttl: Duration) -> Result<String> {
        let expire_date = Utc::now() + chrono::Duration::from_std(ttl)?;
        let link = self
            .bot
            .create_chat_invite_link(self.channel_id)
            .member_limit(1)
            .expire_date(expire_date)
            .await?;
        Ok(link.invite_link)
    }

    async fn send_message(&self, tg_id: i64, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(tg_id), text).await?;
        Ok(())
    }

    async fn kick_then_unban(&self, tg_id: i64) -> Result<()> {
        self.bot
            .ban_chat_member(self.channel_id, user_id(tg_id))
            .await?;
        self.bot
            .unban_chat_member(self.channel_id, user_id(tg_id))
            .only_if_banned(true)
            .await?;
        Ok(())
    }

    async fn membership(&self, tg_id: i64) -> Result<Membership> {
        let member = match self
            .bot
            .get_chat_member(self.channel_id, user_id(tg_id))
            .await
        {
            Ok(member) => member,
            Err(RequestError::Api(err)) => {
                log::debug!("Membership of {} is unknown: {}", tg_id, err);
                return Ok(Membership::NotFound);
            }
            Err(err) => return Err(err.into()),
        };
        let kind = &member.kind;
        Ok(if kind.is_owner() {
            Membership::Owner
        } else if kind.is_administrator() {
            Membership::Administrator
        } else if kind.is_member() {
            Membership::Member
        } else {
            Membership::Other
        })
    }

    async fn channel_info(&self) -> Result<ChannelInfo> {
        let chat = self.bot.get_chat(self.channel_id).await?;
        let member_count = self.bot.get_chat_member_count(self.channel_id).await?;
        Ok(ChannelInfo {
            title: chat.title().unwrap_or_default().to_owned(),
            member_count,
            description: chat.description().map(ToOwned::to_owned),
        })
    }
}
