//! Message rendering
//!
//! One render function over an exhaustive style enum, plus the inline
//! keyboard that accompanies each style. The confirm/delete buttons carry
//! `"<action>_<reminderId>"` callback payloads.

use crate::db::schemas::ReminderDoc;
use crate::telegram::client::InlineKeyboard;

/// Presentation variant for an outgoing reminder message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    /// Fire-once reminder: delivered once, delete button only
    Plain,
    /// First delivery of a fire-until-acknowledged reminder
    ConfirmInitial,
    /// Re-notification of an unconfirmed reminder
    ConfirmRepeat,
}

/// Render the message body for a reminder in the given style
pub fn render(reminder: &ReminderDoc, style: MessageStyle) -> String {
    match style {
        MessageStyle::Plain => format!("🔔 Напоминание:\n\n{}", reminder.text),
        MessageStyle::ConfirmInitial => format!(
            "🔔 Напоминание:\n\n{}\n\n<i>Нажмите кнопку, чтобы подтвердить</i>",
            reminder.text
        ),
        MessageStyle::ConfirmRepeat => format!(
            "🔁 <b>Повторное напоминание:</b>\n\n{}\n\n<i>Нажмите кнопку, чтобы подтвердить</i>",
            reminder.text
        ),
    }
}

/// The inline keyboard matching a style
pub fn keyboard(reminder: &ReminderDoc, style: MessageStyle) -> InlineKeyboard {
    match style {
        MessageStyle::Plain => {
            InlineKeyboard::single("🗑️ Delete", format!("delete_{}", reminder.id))
        }
        MessageStyle::ConfirmInitial | MessageStyle::ConfirmRepeat => {
            InlineKeyboard::single("✅ Confirm", format!("confirm_{}", reminder.id))
        }
    }
}

/// Replacement text after the user confirms
pub fn confirmed_text() -> &'static str {
    "✅ <b>CONFIRMED!</b>"
}

/// Keyboard offered on a confirmed message (manual cleanup)
pub fn confirmed_keyboard(reminder_id: &str) -> InlineKeyboard {
    InlineKeyboard::single("🗑️ Delete", format!("delete_{}", reminder_id))
}

/// Replacement text when the message could not be deleted outright
pub fn deleted_text() -> &'static str {
    "🗑️ <i>Deleted</i>"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder() -> ReminderDoc {
        ReminderDoc::new(
            "r-1".into(),
            "take the medication".into(),
            "2025-06-01".into(),
            "09:30".into(),
            42,
        )
    }

    #[test]
    fn plain_carries_bell_header_and_delete_button() {
        let r = reminder();
        let text = render(&r, MessageStyle::Plain);
        assert!(text.starts_with("🔔"));
        assert!(text.contains("take the medication"));

        let kb = keyboard(&r, MessageStyle::Plain);
        assert_eq!(kb.inline_keyboard[0][0].callback_data, "delete_r-1");
    }

    #[test]
    fn confirm_styles_carry_confirm_button() {
        let r = reminder();
        for style in [MessageStyle::ConfirmInitial, MessageStyle::ConfirmRepeat] {
            let kb = keyboard(&r, style);
            assert_eq!(kb.inline_keyboard[0][0].callback_data, "confirm_r-1");
        }
    }

    #[test]
    fn repeat_is_visually_distinct_from_initial() {
        let r = reminder();
        let initial = render(&r, MessageStyle::ConfirmInitial);
        let repeat = render(&r, MessageStyle::ConfirmRepeat);
        assert_ne!(initial, repeat);
        assert!(repeat.contains("🔁"));
    }

    #[test]
    fn confirmed_keyboard_targets_same_reminder() {
        let kb = confirmed_keyboard("r-1");
        assert_eq!(kb.inline_keyboard[0][0].callback_data, "delete_r-1");
    }
}
