use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub mod bot;
pub mod callback_data;
pub mod context;
pub mod err;
pub mod gateway;
pub mod handlers;
pub mod state;
pub mod widget;

pub const ERROR: &str = "Что-то пошло не так. Пожалуйста, попробуйте позже.";
pub const ACCESS_DENIED: &str = "❌ У вас нет прав для выполнения этой команды.";

const HOME_DESCRIPTION: &str = "🏠 Меню";
pub const HOME_NAME: &str = "/start";

const BACK_DESCRIPTION: &str = "🔙 Назад";
pub const BACK_NAME: &str = "/back";

pub(crate) fn sys_button(keymap: InlineKeyboardMarkup, can_back: bool) -> InlineKeyboardMarkup {
    let mut row = vec![];
    if can_back {
        row.push(InlineKeyboardButton::callback(BACK_DESCRIPTION, BACK_NAME));
    }
    row.push(InlineKeyboardButton::callback(HOME_DESCRIPTION, HOME_NAME));
    keymap.append_row(row)
}
