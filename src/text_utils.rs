use std::ops::Index;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

fn to_int<T: std::str::FromStr>(num_str: &str, date_str: &str) -> Result<T, String> {
    match num_str.parse::<T>() {
        Ok(x) => Ok(x),
        Err(_) => Err(format!("Error parsing {} from the date {}", num_str, date_str)),
    }
}

pub fn parse_date_time(buf: &str) -> Result<NaiveDateTime, String> {
    lazy_static! {
        static ref DATE_TIME_REGEX: Regex = Regex::new(
            r#"^(\d{4})-(\d{1,2})-(\d{1,2})[ T](\d{1,2}):(\d{1,2}):(\d{1,2})(\.\d{0,9})?$"#
        ).unwrap();
    }

    let Some(caps) = DATE_TIME_REGEX.captures(buf) else {
        return Err(format!("Unable to parse date time {}", buf));
    };

    let to_i32 = |num_str: &str| to_int::<i32>(num_str, buf);
    let to_u32 = |num_str: &str| to_int::<u32>(num_str, buf);

    let y: i32 = to_i32(caps.index(1))?;
    let m: u32 = to_u32(caps.index(2))?;
    let d: u32 = to_u32(caps.index(3))?;
    let h: u32 = to_u32(caps.index(4))?;
    let mn: u32 = to_u32(caps.index(5))?;
    let s: u32 = to_u32(caps.index(6))?;

    let date = NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| format!("Invalid date {}", buf))?;
    let time = NaiveTime::from_hms_opt(h, mn, s).ok_or_else(|| format!("Invalid time {}", buf))?;

    Ok(NaiveDateTime::new(date, time))
}

/// A timestamp as found in the post data. The raw text is kept so a value
/// we cannot parse is still shown.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDate {
    pub raw: String,
    pub parsed: Option<DateTime<Utc>>,
}

impl PostDate {
    pub fn parse(raw: &str) -> Option<PostDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let parsed = match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            // Dates without offset are taken as UTC
            Err(_) => parse_date_time(raw).ok().map(|naive| naive.and_utc()),
        };

        Some(PostDate {
            raw: raw.to_string(),
            parsed,
        })
    }

    /// Accepts date strings and unix timestamps in seconds.
    pub fn from_value(value: &Value) -> Option<PostDate> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => {
                let secs = n.as_i64()?;
                let parsed = DateTime::from_timestamp(secs, 0)?;
                Some(PostDate {
                    raw: parsed.to_rfc3339(),
                    parsed: Some(parsed),
                })
            }
            _ => None,
        }
    }

    /// Value for a `<time datetime>` attribute.
    pub fn iso(&self) -> String {
        match self.parsed {
            Some(dt) => dt.to_rfc3339(),
            None => self.raw.clone(),
        }
    }

    pub fn human(&self) -> String {
        match self.parsed {
            Some(dt) => format_human(&dt),
            None => self.raw.clone(),
        }
    }

    pub fn same_instant(&self, other: &PostDate) -> bool {
        match (self.parsed, other.parsed) {
            (Some(a), Some(b)) => a == b,
            _ => self.raw == other.raw,
        }
    }
}

pub fn format_human(date_time: &DateTime<Utc>) -> String {
    date_time.format("%d.%m.%Y at %H:%M UTC").to_string()
}

/// Trimmed text, or `None` when there is nothing but whitespace.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
