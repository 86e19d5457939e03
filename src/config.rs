use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;

use crate::store::UserId;

pub const DEFAULT_COOLDOWN_SECS: i64 = 60 * 60;
pub const DEFAULT_DATA_FILE: &str = "bot_data.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub admin_ids: Vec<UserId>,
    pub cooldown_secs: i64,
    pub data_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let bot_token = non_empty("BOT_TOKEN")
            .or_else(|| non_empty("TG_BOT_TOKEN"))
            .ok_or_else(|| anyhow!("Missing BOT_TOKEN"))?;

        let admins_raw = non_empty("ADMIN_IDS")
            .or_else(|| non_empty("ADMIN_ID"))
            .ok_or_else(|| anyhow!("Missing ADMIN_IDS"))?;
        let admin_ids = parse_admin_ids(&admins_raw)?;

        let cooldown_secs = match non_empty("FEEDBACK_COOLDOWN_SECS") {
            Some(v) => {
                let secs: i64 = v
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid FEEDBACK_COOLDOWN_SECS: {}", v))?;
                if secs < 0 {
                    return Err(anyhow!("FEEDBACK_COOLDOWN_SECS must not be negative"));
                }
                secs
            }
            None => DEFAULT_COOLDOWN_SECS,
        };

        let data_file = non_empty("FEEDBACK_DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

        Ok(Config {
            bot_token,
            admin_ids,
            cooldown_secs,
            data_file,
        })
    }
}

fn parse_admin_ids(raw: &str) -> Result<Vec<UserId>> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: UserId = part
            .parse()
            .with_context(|| format!("Invalid admin id: {}", part))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(anyhow!("ADMIN_IDS lists no admins"));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("BOT_TOKEN", "t"), ("ADMIN_ID", "370884641")]).unwrap();
        assert_eq!(cfg.bot_token, "t");
        assert_eq!(cfg.admin_ids, vec![370884641]);
        assert_eq!(cfg.cooldown_secs, 3600);
        assert_eq!(cfg.data_file, PathBuf::from("bot_data.json"));
    }

    #[test]
    fn admin_list_is_parsed_and_deduplicated() {
        let cfg = load(&[("BOT_TOKEN", "t"), ("ADMIN_IDS", " 1, 2,,1 ")]).unwrap();
        assert_eq!(cfg.admin_ids, vec![1, 2]);
    }

    #[test]
    fn overrides_are_read() {
        let cfg = load(&[
            ("TG_BOT_TOKEN", "t"),
            ("ADMIN_IDS", "5"),
            ("FEEDBACK_COOLDOWN_SECS", "60"),
            ("FEEDBACK_DATA_FILE", "/tmp/x.json"),
        ])
        .unwrap();
        assert_eq!(cfg.cooldown_secs, 60);
        assert_eq!(cfg.data_file, PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn missing_token_or_admins_is_fatal() {
        assert!(load(&[("ADMIN_IDS", "1")]).is_err());
        assert!(load(&[("BOT_TOKEN", "t")]).is_err());
        assert!(load(&[("BOT_TOKEN", "t"), ("ADMIN_IDS", "abc")]).is_err());
        assert!(load(&[("BOT_TOKEN", "t"), ("ADMIN_IDS", " , ")]).is_err());
    }

    #[test]
    fn bad_cooldown_is_fatal() {
        assert!(load(&[("BOT_TOKEN", "t"), ("ADMIN_IDS", "1"), ("FEEDBACK_COOLDOWN_SECS", "soon")]).is_err());
        assert!(load(&[("BOT_TOKEN", "t"), ("ADMIN_IDS", "1"), ("FEEDBACK_COOLDOWN_SECS", "-5")]).is_err());
    }
}
