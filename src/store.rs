use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Telegram user id. Private chats share the id of their user.
pub type UserId = i64;

/// Star rating attached to a feedback record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RatingRepr", into = "RatingRepr")]
pub enum Rating {
    Stars(u8),
    Unrated,
}

// On disk a rating is a number or a marker string. Anything that is not
// 1..=5 reads back as unrated instead of failing the whole document.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RatingRepr {
    Stars(u8),
    Marker(String),
    Other(serde_json::Value),
}

impl From<RatingRepr> for Rating {
    fn from(r: RatingRepr) -> Self {
        match r {
            RatingRepr::Stars(n) if (1..=5).contains(&n) => Rating::Stars(n),
            _ => Rating::Unrated,
        }
    }
}

impl From<Rating> for RatingRepr {
    fn from(r: Rating) -> Self {
        match r {
            Rating::Stars(n) => RatingRepr::Stars(n),
            Rating::Unrated => RatingRepr::Marker("unrated".to_string()),
        }
    }
}

impl From<Option<u8>> for Rating {
    fn from(r: Option<u8>) -> Self {
        r.map_or(Rating::Unrated, Rating::Stars)
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rating::Stars(n) => write!(f, "{}", n),
            Rating::Unrated => f.write_str("unrated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub text: String,
    pub rating: Rating,
}

/// The whole persisted document. Rewritten in full on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackData {
    #[serde(default)]
    pub blocked_users: BTreeSet<UserId>,
    #[serde(default, deserialize_with = "de_epoch_secs")]
    pub user_last_feedback: BTreeMap<UserId, i64>,
    #[serde(default)]
    pub feedback_records: BTreeMap<UserId, FeedbackRecord>,
}

// Older files carry float seconds; keep whole seconds.
fn de_epoch_secs<'de, D>(d: D) -> std::result::Result<BTreeMap<UserId, i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<UserId, f64>::deserialize(d)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.trunc() as i64)).collect())
}

impl FeedbackData {
    pub fn is_blocked(&self, user: UserId) -> bool {
        self.blocked_users.contains(&user)
    }

    /// Returns `true` if the user was not blocked before.
    pub fn block(&mut self, user: UserId) -> bool {
        self.blocked_users.insert(user)
    }

    /// Seconds left before `user` may submit again, if any.
    pub fn cooldown_remaining(&self, user: UserId, now: i64, cooldown_secs: i64) -> Option<i64> {
        let last = *self.user_last_feedback.get(&user)?;
        let elapsed = now.saturating_sub(last);
        if elapsed < cooldown_secs {
            Some(cooldown_secs.saturating_sub(elapsed))
        } else {
            None
        }
    }

    /// Stores the record and the submission time together.
    pub fn record(&mut self, user: UserId, text: String, rating: Rating, now: i64) {
        self.feedback_records
            .insert(user, FeedbackRecord { text, rating });
        self.user_last_feedback.insert(user, now);
    }

    /// Drops all records. Submission times are kept so cooldowns survive.
    pub fn clear_records(&mut self) -> usize {
        let n = self.feedback_records.len();
        self.feedback_records.clear();
        n
    }

    /// Mean of numeric ratings and how many went into it.
    pub fn average_rating(&self) -> Option<(f64, usize)> {
        let stars: Vec<u8> = self
            .feedback_records
            .values()
            .filter_map(|r| match r.rating {
                Rating::Stars(n) => Some(n),
                Rating::Unrated => None,
            })
            .collect();
        if stars.is_empty() {
            return None;
        }
        let sum: u32 = stars.iter().map(|&n| u32::from(n)).sum();
        Some((f64::from(sum) / stars.len() as f64, stars.len()))
    }
}

/// JSON file holding [`FeedbackData`].
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or unreadable file yields empty data.
    pub fn load(&self) -> FeedbackData {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no data file at {}, starting empty", self.path.display());
                return FeedbackData::default();
            }
            Err(e) => {
                warn!("cannot read {}: {}; starting empty", self.path.display(), e);
                return FeedbackData::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(e) => {
                warn!("cannot parse {}: {}; starting empty", self.path.display(), e);
                FeedbackData::default()
            }
        }
    }

    pub fn save(&self, data: &FeedbackData) -> Result<()> {
        let json = serde_json::to_string_pretty(data).context("serializing feedback data")?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}
