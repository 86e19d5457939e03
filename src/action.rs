use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::store::UserId;

/// Everything a button can ask for. Encoded as callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SendFeedback,
    ViewLast,
    Help,
    AdminPanel,
    ViewAverage,
    Rate(u8),
    Reply(UserId),
    Block(UserId),
    Ignore,
    ViewBlocked,
    ClearFeedback,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionParseError {
    #[error("unknown callback data: {0}")]
    Unknown(String),
    #[error("rating out of range: {0}")]
    RatingRange(String),
    #[error("bad user id in callback data: {0}")]
    UserId(String),
}

impl Action {
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Action::AdminPanel
                | Action::ViewAverage
                | Action::Reply(_)
                | Action::Block(_)
                | Action::Ignore
                | Action::ViewBlocked
                | Action::ClearFeedback
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SendFeedback => f.write_str("send_feedback"),
            Action::ViewLast => f.write_str("view_last"),
            Action::Help => f.write_str("help"),
            Action::AdminPanel => f.write_str("admin_panel"),
            Action::ViewAverage => f.write_str("view_avg_rating"),
            Action::Rate(n) => write!(f, "rate_{}", n),
            Action::Reply(id) => write!(f, "reply:{}", id),
            Action::Block(id) => write!(f, "block:{}", id),
            Action::Ignore => f.write_str("ignore"),
            Action::ViewBlocked => f.write_str("view_blocked"),
            Action::ClearFeedback => f.write_str("clear_feedback"),
        }
    }
}

fn parse_user(data: &str, rest: &str) -> Result<UserId, ActionParseError> {
    rest.parse()
        .map_err(|_| ActionParseError::UserId(data.to_string()))
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let action = match data {
            "send_feedback" => Action::SendFeedback,
            "view_last" => Action::ViewLast,
            "help" => Action::Help,
            "admin_panel" => Action::AdminPanel,
            "view_avg_rating" => Action::ViewAverage,
            "ignore" => Action::Ignore,
            "view_blocked" => Action::ViewBlocked,
            "clear_feedback" => Action::ClearFeedback,
            _ => {
                if let Some(rest) = data.strip_prefix("rate_") {
                    match rest.parse::<u8>() {
                        Ok(n) if (1..=5).contains(&n) => Action::Rate(n),
                        _ => return Err(ActionParseError::RatingRange(data.to_string())),
                    }
                } else if let Some(rest) = data.strip_prefix("reply:") {
                    Action::Reply(parse_user(data, rest)?)
                } else if let Some(rest) = data.strip_prefix("block:") {
                    Action::Block(parse_user(data, rest)?)
                } else {
                    return Err(ActionParseError::Unknown(data.to_string()));
                }
            }
        };
        Ok(action)
    }
}
