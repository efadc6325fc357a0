//! Input checks shared by the handlers.
//!
//! The free tier of the statistics API only serves the current and the
//! previous season, so requests for older seasons are turned away here with a
//! descriptive message rather than an opaque upstream rejection.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::{America::Vancouver, Tz};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

use crate::error::ServiceError;

/// Season boundaries are computed in this zone, whatever the host clock says.
pub const REFERENCE_TZ: Tz = Vancouver;

/// The only response format the reshapers can consume.
pub const FORMAT: &str = "json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeasonType {
    Regular,
    Preseason,
    Postseason,
}

impl SeasonType {
    pub const ALL: [SeasonType; 3] = [
        SeasonType::Regular,
        SeasonType::Preseason,
        SeasonType::Postseason,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonType::Regular => "REG",
            SeasonType::Preseason => "PRE",
            SeasonType::Postseason => "POST",
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeasonType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        SeasonType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| ServiceError::invalid_input("type must be one of 'REG', 'PRE', or 'POST'"))
    }
}

/// The `year` field as callers send it: a JSON number or a string.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum YearInput {
    Number(f64),
    Text(String),
}

impl From<i32> for YearInput {
    fn from(year: i32) -> Self {
        YearInput::Number(year as f64)
    }
}

impl From<&str> for YearInput {
    fn from(year: &str) -> Self {
        YearInput::Text(year.to_owned())
    }
}

/// Decode a handler payload. A missing or null payload means "all
/// defaults"; anything other than a JSON object is rejected.
pub fn parse_request<T: DeserializeOwned + Default>(
    payload: Option<Value>,
) -> Result<T, ServiceError> {
    match payload {
        None | Some(Value::Null) => Ok(T::default()),
        Some(obj @ Value::Object(_)) => serde_json::from_value(obj)
            .map_err(|e| ServiceError::invalid_input(format!("malformed request: {e}"))),
        Some(_) => Err(ServiceError::invalid_input("request must be a JSON object")),
    }
}

pub fn validate_type(season_type: &str) -> Result<SeasonType, ServiceError> {
    season_type.parse()
}

/// A team, if given, is the 1-3 letter acronym of its city.
pub fn validate_team(team: Option<&str>) -> Result<Option<&str>, ServiceError> {
    match team {
        Some(t) if !(1..=3).contains(&t.chars().count()) => Err(ServiceError::invalid_input(
            "team should be the 2-3 letter acronymn for the team's city",
        )),
        other => Ok(other),
    }
}

pub fn validate_format(format: &str) -> Result<&'static str, ServiceError> {
    if format.eq_ignore_ascii_case(FORMAT) {
        Ok(FORMAT)
    } else {
        Err(ServiceError::invalid_input("format must be json"))
    }
}

/// Read a season year the way a lenient integer parse would: leading
/// whitespace and a sign are allowed, and digits are read up to the first
/// character that is not one. Fractional numbers truncate.
pub fn parse_year(year: &YearInput) -> Result<i32, ServiceError> {
    let invalid = || ServiceError::invalid_input("year is not valid");

    match year {
        YearInput::Number(n) => {
            let n = n.trunc();
            if n.is_finite() && n >= i32::MIN as f64 && n <= i32::MAX as f64 {
                Ok(n as i32)
            } else {
                Err(invalid())
            }
        }

        YearInput::Text(text) => {
            let text = text.trim_start();
            let (negative, rest) = match text.as_bytes().first() {
                Some(b'-') => (true, &text[1..]),
                Some(b'+') => (false, &text[1..]),
                _ => (false, text),
            };

            let n_digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if n_digits == 0 {
                return Err(invalid());
            }

            let magnitude: i32 = rest[..n_digits].parse().map_err(|_| invalid())?;
            Ok(if negative { -magnitude } else { magnitude })
        }
    }
}

/// The season currently being played or about to be played. Through August
/// that is next calendar year's label; from September on it is this year's.
pub fn season_year_bound(now: DateTime<Utc>) -> i32 {
    let local = now.with_timezone(&REFERENCE_TZ);

    if local.month0() <= 7 {
        local.year() + 1
    } else {
        local.year()
    }
}

/// Reject seasons older than the previous one.
pub fn check_season_bound(year: i32, now: DateTime<Utc>) -> Result<(), ServiceError> {
    if year < season_year_bound(now) - 1 {
        return Err(ServiceError::invalid_input(
            "year is not valid: cannot look beyond the previous season",
        ));
    }

    Ok(())
}

/// Like [`check_season_bound`], but reported as a failure of the
/// `validateYear` helper.
pub fn validate_year(year: i32, now: DateTime<Utc>) -> Result<(), ServiceError> {
    check_season_bound(year, now).map_err(|e| ServiceError::validation("validateYear", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[derive(Debug, Default, Deserialize)]
    struct Probe {
        year: Option<YearInput>,
    }

    #[test]
    fn request_payload_shapes() {
        let p: Probe = parse_request(None).unwrap();
        assert_eq!(p.year, None);

        let p: Probe = parse_request(Some(Value::Null)).unwrap();
        assert_eq!(p.year, None);

        let p: Probe = parse_request(Some(serde_json::json!({ "year": "2024", "x": 1 }))).unwrap();
        assert_eq!(p.year, Some(YearInput::Text("2024".to_owned())));

        let err = parse_request::<Probe>(Some(serde_json::json!("2024"))).unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = parse_request::<Probe>(Some(serde_json::json!({ "year": true }))).unwrap_err();
        assert!(err.to_string().starts_with("malformed request"));
    }

    #[test]
    fn season_type_is_case_insensitive() {
        assert_eq!(validate_type("reg").unwrap(), SeasonType::Regular);
        assert_eq!(validate_type("Pre").unwrap(), SeasonType::Preseason);
        assert_eq!(validate_type("POST").unwrap(), SeasonType::Postseason);
        assert_eq!(validate_type("post").unwrap().as_str(), "POST");
    }

    #[test]
    fn unknown_season_type_rejected() {
        for bad in ["", "regular", "STAR", "PRE "] {
            let err = validate_type(bad).unwrap_err();
            assert_eq!(err.status_code(), 400, "{bad:?}");
        }
    }

    #[test]
    fn team_length() {
        assert_eq!(validate_team(None).unwrap(), None);
        assert_eq!(validate_team(Some("SEA")).unwrap(), Some("SEA"));
        assert_eq!(validate_team(Some("NE")).unwrap(), Some("NE"));
        assert_eq!(validate_team(Some("G")).unwrap(), Some("G"));
        assert!(validate_team(Some("")).is_err());
        assert!(validate_team(Some("SEAH")).is_err());
    }

    #[test]
    fn format_must_be_json() {
        assert_eq!(validate_format("JSON").unwrap(), "json");
        assert_eq!(validate_format("xml").unwrap_err().status_code(), 400);
    }

    #[test]
    fn year_parses_leniently() {
        assert_eq!(parse_year(&"2024".into()).unwrap(), 2024);
        assert_eq!(parse_year(&"  2023abc".into()).unwrap(), 2023);
        assert_eq!(parse_year(&"+2022".into()).unwrap(), 2022);
        assert_eq!(parse_year(&2021.into()).unwrap(), 2021);
        assert_eq!(parse_year(&YearInput::Number(2020.7)).unwrap(), 2020);
    }

    #[test]
    fn unparseable_year_is_invalid_input() {
        for bad in ["", "abc", "-", "twenty", "99999999999"] {
            let err = parse_year(&bad.into()).unwrap_err();
            assert_eq!(err.status_code(), 400, "{bad:?}");
            assert_eq!(err.to_string(), "year is not valid");
        }
    }

    #[test]
    fn spring_belongs_to_next_season() {
        let now = at(2024, 3, 15, 12);
        assert_eq!(season_year_bound(now), 2025);
        assert!(check_season_bound(2023, now).is_err());
        assert!(check_season_bound(2024, now).is_ok());
        assert!(check_season_bound(2025, now).is_ok());
    }

    #[test]
    fn autumn_belongs_to_this_season() {
        let now = at(2024, 10, 1, 12);
        assert_eq!(season_year_bound(now), 2024);
        assert!(check_season_bound(2022, now).is_err());
        assert!(check_season_bound(2023, now).is_ok());
    }

    #[test]
    fn bound_uses_reference_zone() {
        // 05:00 UTC on Sept 1 is still Aug 31 on the Pacific coast.
        assert_eq!(season_year_bound(at(2024, 9, 1, 5)), 2025);
        assert_eq!(season_year_bound(at(2024, 9, 1, 8)), 2024);
    }

    #[test]
    fn validate_year_wraps_failure() {
        let err = validate_year(2020, at(2024, 3, 15, 12)).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.description().as_deref(), Some("validateYear error"));
        assert_eq!(
            err.to_string(),
            "year is not valid: cannot look beyond the previous season"
        );
    }
}
