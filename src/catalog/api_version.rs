//! API version strings (`YYYY-MM-DD` or `YYYY-MM-DD-preview`)

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const PREVIEW_SUFFIX: &str = "-preview";

/// Parsed ARM API version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiVersion {
    date: NaiveDate,
    preview: bool,
    raw: String,
}

impl ApiVersion {
    pub fn parse(raw: &str) -> Result<Self> {
        let (date_part, preview) = match raw.strip_suffix(PREVIEW_SUFFIX) {
            Some(date_part) => (date_part, true),
            None => (raw, false),
        };

        let well_formed = date_part.len() == 10
            && date_part.bytes().enumerate().all(|(i, b)| match i {
                4 | 7 => b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !well_formed {
            bail!(
                "API version '{}' is not YYYY-MM-DD or YYYY-MM-DD-preview",
                raw
            );
        }

        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .with_context(|| format!("API version '{}' is not a calendar date", raw))?;

        Ok(Self {
            date,
            preview,
            raw: raw.to_string(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ApiVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Later dates sort higher; on the same date a stable release outranks its preview.
impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.date, !self.preview).cmp(&(other.date, !other.preview))
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Latest stable version, or the latest preview when no stable one exists
pub fn pick_preferred<'a, I>(versions: I) -> Option<&'a ApiVersion>
where
    I: IntoIterator<Item = &'a ApiVersion>,
{
    let (stable, preview): (Vec<_>, Vec<_>) =
        versions.into_iter().partition(|version| !version.preview);

    stable.into_iter().max().or_else(|| preview.into_iter().max())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(raw: &[&str]) -> Vec<ApiVersion> {
        raw.iter().map(|v| ApiVersion::parse(v).unwrap()).collect()
    }

    #[test]
    fn test_parse_stable_and_preview() {
        let stable = ApiVersion::parse("2019-07-01").unwrap();
        assert!(!stable.is_preview());
        assert_eq!(stable.date(), NaiveDate::from_ymd_opt(2019, 7, 1).unwrap());

        let preview = ApiVersion::parse("2017-10-01-preview").unwrap();
        assert!(preview.is_preview());
        assert_eq!(preview.to_string(), "2017-10-01-preview");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["2019-7-01", "2019-07-01-beta", "v1", "", "2019-02-30", "2019/07/01"] {
            assert!(ApiVersion::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_stable_outranks_preview_on_same_date() {
        let stable = ApiVersion::parse("2019-06-01").unwrap();
        let preview = ApiVersion::parse("2019-06-01-preview").unwrap();
        assert!(stable > preview);
    }

    #[test]
    fn test_pick_preferred_chooses_latest_stable() {
        let versions = parse_all(&[
            "2019-10-01-preview",
            "2019-08-01-preview",
            "2019-07-01",
            "2019-06-01",
            "2019-05-01-preview",
        ]);

        let picked = pick_preferred(&versions).unwrap();
        assert_eq!(picked.as_str(), "2019-07-01");
    }

    #[test]
    fn test_pick_preferred_falls_back_to_latest_preview() {
        let versions = parse_all(&[
            "2019-10-01-preview",
            "2019-08-01-preview",
            "2019-05-01-preview",
        ]);

        let picked = pick_preferred(&versions).unwrap();
        assert_eq!(picked.as_str(), "2019-10-01-preview");
    }

    #[test]
    fn test_pick_preferred_empty() {
        assert!(pick_preferred(&Vec::<ApiVersion>::new()).is_none());
    }
}
