use crate::{
    state::{Tokens, ValidToken},
    sys_button,
};
use eyre::{Context as _, Error, Result};
use log::{error, info};
use std::ops::Deref;
use teloxide::{
    payloads::{EditMessageTextSetters as _, SendMessageSetters as _},
    prelude::Requester as _,
    types::{ChatId, InlineKeyboardMarkup, InputFile, MessageId, ParseMode},
    utils::markdown::escape,
    ApiError, Bot, RequestError,
};

/// Placeholder text of a freshly opened origin message.
const BLANK: &str = "\\.";

/// Bot handle bound to one chat. Screens are rendered by editing the chat's
/// origin message; anything sent below it invalidates the origin so the next
/// screen starts a fresh one.
pub struct TgBot {
    bot: Bot,
    tokens: Tokens,
    origin: Origin,
    can_go_back: bool,
}

impl TgBot {
    pub fn new(bot: Bot, tokens: Tokens, origin: Origin) -> Self {
        TgBot {
            bot,
            tokens,
            origin,
            can_go_back: false,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.origin.chat_id
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn set_system_go_back(&mut self, can_go_back: bool) {
        self.can_go_back = can_go_back;
    }

    async fn send_markdown(&self, chat_id: ChatId, text: &str) -> Result<MessageId> {
        let msg = self
            .bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::MarkdownV2)
            .await
            .with_context(|| format!("Failed to send message: {}", text))?;
        Ok(msg.id)
    }

    pub async fn send_msg(&self, text: &str) -> Result<MessageId> {
        self.origin.invalidate();
        self.send_markdown(self.chat_id(), text).await
    }

    pub async fn send_document(&self, data: Vec<u8>, name: &'static str) -> Result<()> {
        self.origin.invalidate();
        self.bot
            .send_document(self.chat_id(), InputFile::memory(data).file_name(name))
            .await?;
        Ok(())
    }

    /// Sends `msg` below the current screen and opens a new origin under it.
    /// Text rejected by the MarkdownV2 parser is retried escaped.
    pub async fn send_notification(&mut self, msg: &str) {
        info!("Sending notification: {}", msg);
        if let Err(err) = self.send_msg(msg).await {
            error!("{:#}", err);
            if let Err(err) = self.send_msg(&escape(msg)).await {
                error!("{:#}", err);
            }
        }
        if let Err(err) = self.open_origin().await {
            error!("Failed to open origin after notification: {:#}", err);
        }
    }

    async fn open_origin(&mut self) -> Result<()> {
        self.origin.message_id = self.send_msg(BLANK).await?;
        self.origin.set_valid();
        Ok(())
    }

    /// Renders a screen into the origin message, opening a new one if the
    /// old origin is buried under other messages.
    pub async fn edit_origin(&mut self, text: &str, markup: InlineKeyboardMarkup) -> Result<()> {
        if !self.origin.is_valid() {
            self.open_origin().await?;
        }

        let result = self
            .bot
            .edit_message_text(self.chat_id(), self.origin.message_id, text)
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(sys_button(markup, self.can_go_back))
            .await;
        match result {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(err) => {
                error!("Failed to render screen: {}: {}", err, text);
                Err(Error::from(err))
            }
        }
    }

    pub async fn delete_msg(&self, id: MessageId) -> Result<()> {
        if self.origin.message_id == id {
            self.origin.invalidate();
        }
        self.bot.delete_message(self.chat_id(), id).await?;
        Ok(())
    }

    /// Sends a message to another chat and drops that chat's origin.
    pub async fn notify(&self, chat_id: ChatId, text: &str) -> Option<MessageId> {
        match self.send_markdown(chat_id, text).await {
            Ok(id) => {
                self.tokens.get_token(chat_id).invalidate();
                Some(id)
            }
            Err(err) => {
                error!("Failed to notify {}: {:#}", chat_id, err);
                None
            }
        }
    }
}

impl Deref for TgBot {
    type Target = Bot;

    fn deref(&self) -> &Self::Target {
        &self.bot
    }
}

/// The message a chat's screens are drawn into.
#[derive(Clone, Debug)]
pub struct Origin {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub tkn: ValidToken,
}

impl Origin {
    pub fn is_valid(&self) -> bool {
        self.tkn.is_valid()
    }

    pub fn invalidate(&self) {
        self.tkn.invalidate();
    }

    pub fn set_valid(&self) {
        self.tkn.set_valid();
    }
}
