//! The bye-week lookup service.
//!
//! Given a season (and optionally a single team), report which teams are off
//! in each week. The upstream `Byes` resource is a flat list of week/team
//! pairs; we regroup it by week.

use chrono::{DateTime, Utc};
use lambda_runtime::tracing::info;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::{
    error::{ErrorInfo, ServiceError},
    upstream::UpstreamClient,
    validation::{
        check_season_bound, parse_request, parse_year, validate_format, validate_team,
        validate_type, YearInput,
    },
};

const DEFAULT_YEAR: &str = "2020";
const DEFAULT_TYPE: &str = "REG";

#[derive(Debug, Default, Deserialize)]
pub struct Request {
    year: Option<YearInput>,
    #[serde(rename = "type")]
    season_type: Option<String>,
    team: Option<String>,
    format: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ByeRecord {
    pub week: u32,
    pub team: String,
}

/// Teams on a bye, keyed by week.
///
/// Weeks appear in the order the upstream first mentions them, and teams
/// within a week in upstream order. Serializes as a JSON object whose keys
/// are the week numbers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByeWeeks {
    weeks: Vec<(u32, Vec<String>)>,
}

impl ByeWeeks {
    #[cfg(test)]
    pub fn teams(&self, week: u32) -> Option<&[String]> {
        self.weeks
            .iter()
            .find(|(w, _)| *w == week)
            .map(|(_, teams)| &teams[..])
    }

    #[cfg(test)]
    pub fn weeks(&self) -> impl Iterator<Item = u32> + '_ {
        self.weeks.iter().map(|(w, _)| *w)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    fn push(&mut self, week: u32, team: String) {
        match self.weeks.iter_mut().find(|(w, _)| *w == week) {
            Some((_, teams)) => teams.push(team),
            None => self.weeks.push((week, vec![team])),
        }
    }
}

impl Serialize for ByeWeeks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.weeks.len()))?;
        for (week, teams) in &self.weeks {
            map.serialize_entry(&week.to_string(), teams)?;
        }
        map.end()
    }
}

/// Group bye records by week, keeping only `team` if one is given. No
/// deduplication is done.
pub fn group_byes<I>(records: I, team: Option<&str>) -> ByeWeeks
where
    I: IntoIterator<Item = ByeRecord>,
{
    let mut result = ByeWeeks::default();

    for rec in records {
        if team.map_or(true, |t| t == rec.team) {
            result.push(rec.week, rec.team);
        }
    }

    result
}

/// Handle one invocation of the bye-week service.
pub async fn handler(
    payload: Option<Value>,
    upstream: &UpstreamClient,
    now: DateTime<Utc>,
) -> Result<ByeWeeks, ErrorInfo> {
    let event = payload.clone().unwrap_or_default();
    info!(%event, "byeweek invoked");
    lookup(payload, upstream, now)
        .await
        .map_err(ServiceError::into_logged_info)
}

async fn lookup(
    payload: Option<Value>,
    upstream: &UpstreamClient,
    now: DateTime<Utc>,
) -> Result<ByeWeeks, ServiceError> {
    let request: Request = parse_request(payload)?;

    validate_format(request.format.as_deref().unwrap_or("json"))?;

    let year = request.year.unwrap_or_else(|| DEFAULT_YEAR.into());
    let year = parse_year(&year)?;
    check_season_bound(year, now)?;

    let season_type = validate_type(request.season_type.as_deref().unwrap_or(DEFAULT_TYPE))?;
    let team = validate_team(request.team.as_deref())?;

    let records = upstream.byes(year, season_type).await?;
    info!("byeweek: {} upstream records", records.len());

    Ok(group_byes(records, team))
}
