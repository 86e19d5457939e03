use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::action::Action;
use crate::store::UserId;

fn button(label: &str, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.to_string())
}

pub fn start_keyboard(is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![button("💬 Send Feedback", Action::SendFeedback)],
        vec![button("📊 My Last Feedback", Action::ViewLast)],
        vec![button("❓ Help", Action::Help)],
    ];
    if is_admin {
        rows.push(vec![button("🛠 Admin Panel", Action::AdminPanel)]);
        rows.push(vec![button("📊 View Average Rating", Action::ViewAverage)]);
        rows.push(vec![button("✉️ Submit Feedback (as user)", Action::SendFeedback)]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn rating_keyboard() -> InlineKeyboardMarkup {
    let row = (1..=5)
        .map(|n| button(&format!("⭐ {}", n), Action::Rate(n)))
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![row])
}

pub fn admin_panel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("📋 View Blocked Users", Action::ViewBlocked)],
        vec![button("🧹 Clear Feedback Records", Action::ClearFeedback)],
    ])
}

/// Attached to every feedback notification an admin receives.
pub fn feedback_alert_keyboard(author: UserId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button("💬 Reply", Action::Reply(author)),
        button("🚫 Block", Action::Block(author)),
        button("❌ Ignore", Action::Ignore),
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(kb: &InlineKeyboardMarkup) -> Vec<String> {
        kb.inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.text.clone())
            .collect()
    }

    #[test]
    fn user_menu_has_no_admin_buttons() {
        let labels = labels(&start_keyboard(false));
        assert_eq!(
            labels,
            vec!["💬 Send Feedback", "📊 My Last Feedback", "❓ Help"]
        );
    }

    #[test]
    fn admin_menu_adds_panel_and_stats() {
        let labels = labels(&start_keyboard(true));
        for expected in [
            "🛠 Admin Panel",
            "📊 View Average Rating",
            "✉️ Submit Feedback (as user)",
            "💬 Send Feedback",
        ] {
            assert!(
                labels.iter().any(|l| l == expected),
                "missing button: {}",
                expected
            );
        }
    }

    #[test]
    fn rating_row_has_five_stars() {
        let kb = rating_keyboard();
        assert_eq!(kb.inline_keyboard.len(), 1);
        assert_eq!(kb.inline_keyboard[0].len(), 5);
        assert_eq!(kb.inline_keyboard[0][4].text, "⭐ 5");
    }
}
