use std::collections::HashMap;

use crate::store::UserId;

/// Where a user is in the feedback flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Idle,
    RatingPending,
    AwaitingText,
}

/// Per-user transient state. Lost on restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    stage: Stage,
    pub pending_rating: Option<u8>,
    /// Admin only: the user the next typed message goes to.
    pub reply_target: Option<UserId>,
}

impl Session {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn request_rating(&mut self) {
        self.stage = Stage::RatingPending;
    }

    /// Accepted from any stage, so stale rating keyboards keep working.
    pub fn select_rating(&mut self, rating: u8) {
        self.pending_rating = Some(rating);
        self.stage = Stage::AwaitingText;
    }

    /// Text refused at commit time. The picked rating is kept.
    pub fn reject_text(&mut self) {
        self.stage = Stage::Idle;
    }

    /// Back to idle after a committed submission.
    pub fn finish_feedback(&mut self) {
        self.stage = Stage::Idle;
        self.pending_rating = None;
    }
}

#[derive(Debug, Default)]
pub struct Sessions {
    by_user: HashMap<UserId, Session>,
}

impl Sessions {
    pub fn get(&self, user: UserId) -> Session {
        self.by_user.get(&user).cloned().unwrap_or_default()
    }

    pub fn get_mut(&mut self, user: UserId) -> &mut Session {
        self.by_user.entry(user).or_default()
    }

    pub fn take_reply_target(&mut self, user: UserId) -> Option<UserId> {
        self.by_user.get_mut(&user)?.reply_target.take()
    }
}
