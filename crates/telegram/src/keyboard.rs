use balloonbot_core::flows::{KeyboardHint, Reply};

use crate::api::{
    KeyboardButton, ReplyKeyboardMarkup, ReplyKeyboardRemove, ReplyMarkup, SendMessageRequest,
};

/// A reply ready to be sent to one chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub markup: Option<ReplyMarkup>,
}

impl OutgoingMessage {
    pub fn from_reply(chat_id: i64, reply: &Reply) -> Self {
        Self { chat_id, text: reply.text.clone(), markup: Some(markup_for(&reply.keyboard)) }
    }

    pub fn to_request(&self) -> SendMessageRequest {
        SendMessageRequest {
            chat_id: self.chat_id,
            text: self.text.clone(),
            reply_markup: self.markup.clone(),
        }
    }
}

pub fn markup_for(hint: &KeyboardHint) -> ReplyMarkup {
    match hint {
        KeyboardHint::Remove => remove_keyboard(),
        KeyboardHint::Choices(choices) if choices.is_empty() => remove_keyboard(),
        KeyboardHint::Choices(choices) => one_row_keyboard(choices),
    }
}

/// Single-row keyboard that hides itself after one tap.
pub fn one_row_keyboard<S: AsRef<str>>(labels: &[S]) -> ReplyMarkup {
    let row = labels.iter().map(|label| KeyboardButton { text: label.as_ref().to_owned() });
    ReplyMarkup::Keyboard(ReplyKeyboardMarkup {
        keyboard: vec![row.collect()],
        one_time_keyboard: true,
        resize_keyboard: true,
    })
}

pub fn remove_keyboard() -> ReplyMarkup {
    ReplyMarkup::Remove(ReplyKeyboardRemove { remove_keyboard: true })
}
