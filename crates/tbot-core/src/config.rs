use std::{env, fs, path::Path, str::FromStr, time::Duration};

use chrono::FixedOffset;

use crate::{
    domain::ChatId, errors::Error, filter::FilterCriteria, pagination::WalkSettings,
    scheduler::ScheduleConfig, Result,
};

pub const DEFAULT_BASE_URL: &str = "https://public.api.openprocurement.org/api/2.5";

const DEFAULT_CPV_CODES: &[&str] = &[
    "15420000", "15330000", "15320000", "15610000", "15620000", "15810000", "15820000",
    "15830000", "15840000", "15850000", "15860000", "15870000", "15980000",
];
const DEFAULT_REGIONS: &[&str] = &[
    "Київська",
    "Черкаська",
    "м. Київ",
    "Київська область",
    "Черкаська область",
];
const DEFAULT_REGION_KEYWORDS: &[&str] = &["Київ", "Черка"];

/// Settings of the registry HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Retries after the first attempt.
    pub retry_max: u32,
    /// First backoff; doubled on every retry.
    pub retry_backoff: Duration,
}

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub chat_id: ChatId,
    pub send_delay: Duration,
    pub telegram_global_interval: Duration,

    // Registry
    pub registry: RegistryConfig,
    pub walk: WalkSettings,

    // Schedule
    pub check_interval: Duration,
    pub first_check_delay: Duration,

    // Filtering / rendering
    pub filter: FilterCriteria,
    pub deadline_offset: FixedOffset,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in `load`).
    ///
    /// Blank scalar values count as unset. List values are only defaulted when
    /// unset; a blank list is an empty list.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("TELEGRAM_TOKEN"))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;
        let chat_id = get("TELEGRAM_CHAT_ID")
            .or_else(|| get("CHAT_ID"))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_CHAT_ID environment variable is required".to_string())
            })?;
        let chat_id = ChatId(parse_value::<i64>("TELEGRAM_CHAT_ID", &chat_id)?);

        // Registry
        let base_url = get("PROZORRO_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let user_agent = get("USER_AGENT").unwrap_or_else(|| {
            format!(
                "tender-bot/{} (+https://prozorro.gov.ua)",
                env!("CARGO_PKG_VERSION")
            )
        });
        let request_timeout = Duration::from_secs(env_num(&get, "REQUEST_TIMEOUT_SECS", 15)?);
        let retry_max = env_num(&get, "RETRY_MAX", 3)?;
        let retry_backoff = Duration::from_millis(env_num(&get, "RETRY_BACKOFF_MS", 500)?);

        let page_limit: usize = env_num(&get, "PAGE_LIMIT", 100)?;
        let max_pages: usize = env_num(&get, "MAX_PAGES", 15)?;
        let request_delay = Duration::from_millis(env_num(&get, "REQUEST_DELAY_MS", 100)?);
        if page_limit == 0 || max_pages == 0 {
            return Err(Error::Config(
                "PAGE_LIMIT and MAX_PAGES must be greater than zero".to_string(),
            ));
        }

        // Schedule
        let check_interval = Duration::from_secs(env_num(&get, "CHECK_INTERVAL_SECS", 600)?);
        if check_interval.is_zero() {
            return Err(Error::Config(
                "CHECK_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        let first_check_delay = Duration::from_secs(env_num(&get, "FIRST_CHECK_DELAY_SECS", 10)?);

        // Telegram pacing
        let send_delay = Duration::from_millis(env_num(&get, "SEND_DELAY_MS", 200)?);
        let telegram_global_interval =
            Duration::from_millis(env_num(&get, "TELEGRAM_GLOBAL_INTERVAL_MS", 40)?);

        // Filter
        let filter = FilterCriteria {
            required_status: get("REQUIRED_STATUS")
                .unwrap_or_else(|| "active.tendering".to_string()),
            category_prefixes: parse_csv(lookup("CPV_CODES"), DEFAULT_CPV_CODES),
            regions: parse_csv(lookup("ALLOWED_REGIONS"), DEFAULT_REGIONS),
            region_keywords: parse_csv(
                lookup("ALLOWED_REGION_KEYWORDS"),
                DEFAULT_REGION_KEYWORDS,
            ),
        };
        if filter.category_prefixes.is_empty() {
            return Err(Error::Config("CPV_CODES must not be empty".to_string()));
        }
        if filter.regions.is_empty() && filter.region_keywords.is_empty() {
            return Err(Error::Config(
                "ALLOWED_REGIONS and ALLOWED_REGION_KEYWORDS are both empty".to_string(),
            ));
        }

        let offset_hours: i32 = env_num(&get, "DEADLINE_UTC_OFFSET_HOURS", 3)?;
        let deadline_offset = FixedOffset::east_opt(offset_hours * 3600).ok_or_else(|| {
            Error::Config(format!(
                "DEADLINE_UTC_OFFSET_HOURS out of range: {offset_hours}"
            ))
        })?;

        Ok(Self {
            telegram_bot_token,
            chat_id,
            send_delay,
            telegram_global_interval,
            registry: RegistryConfig {
                base_url,
                user_agent,
                request_timeout,
                retry_max,
                retry_backoff,
            },
            walk: WalkSettings {
                page_limit,
                max_pages,
                request_delay,
            },
            check_interval,
            first_check_delay,
            filter,
            deadline_offset,
        })
    }

    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig {
            destination: self.chat_id,
            interval: self.check_interval,
            first_delay: self.first_check_delay,
        }
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn env_num<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
    match get(key) {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw:?}")))
}

fn parse_csv(v: Option<String>, default: &[&str]) -> Vec<String> {
    let Some(v) = v else {
        return default.iter().map(|s| s.to_string()).collect();
    };
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
