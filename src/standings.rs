//! The standings service.
//!
//! Regroups the upstream league table by conference and division, ranks each
//! division, and optionally narrows the answer down to a single team.

use chrono::{DateTime, Utc};
use lambda_runtime::tracing::info;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::{
    error::{ErrorInfo, ServiceError},
    upstream::UpstreamClient,
    validation::{parse_request, parse_year, validate_team, validate_year, YearInput},
};

#[derive(Debug, Default, Deserialize)]
pub struct Request {
    year: Option<YearInput>,
    team: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StandingRecord {
    pub team: String,
    pub wins: u32,
    pub losses: u32,
    pub net_points: i32,
    pub conference: String,
    pub division: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct StandingEntry {
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Wins")]
    pub wins: u32,
    #[serde(rename = "Losses")]
    pub losses: u32,
    #[serde(rename = "NetPoints")]
    pub net_points: i32,
    /// 1-based rank within the division.
    pub standing: usize,
}

/// One division's table. Serializes as `{"<Conference>-<Division>": [...]}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivisionStandings {
    pub key: String,
    pub entries: Vec<StandingEntry>,
}

impl Serialize for DivisionStandings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.entries)?;
        map.end()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Standings(pub Vec<DivisionStandings>);

impl Standings {
    #[cfg(test)]
    pub fn division(&self, key: &str) -> Option<&DivisionStandings> {
        self.0.iter().find(|d| d.key == key)
    }
}

/// Group `records` by conference and division, in first-seen order, then
/// rank each division by net points and then wins, both descending. Ties on
/// both keep upstream order.
///
/// When `team` is given, ranks are still computed over the full division,
/// but only that team's entry (and its division) is kept.
pub fn group_standings<I>(records: I, team: Option<&str>) -> Standings
where
    I: IntoIterator<Item = StandingRecord>,
{
    let mut divisions: Vec<DivisionStandings> = Vec::new();

    for rec in records {
        let key = format!("{}-{}", rec.conference, rec.division);
        let entry = StandingEntry {
            team: rec.team,
            wins: rec.wins,
            losses: rec.losses,
            net_points: rec.net_points,
            standing: 0,
        };

        match divisions.iter_mut().find(|d| d.key == key) {
            Some(div) => div.entries.push(entry),
            None => divisions.push(DivisionStandings {
                key,
                entries: vec![entry],
            }),
        }
    }

    for div in &mut divisions {
        div.entries.sort_by(|a, b| {
            b.net_points
                .cmp(&a.net_points)
                .then_with(|| b.wins.cmp(&a.wins))
        });

        for (i, entry) in div.entries.iter_mut().enumerate() {
            entry.standing = i + 1;
        }
    }

    if let Some(team) = team {
        for div in &mut divisions {
            div.entries.retain(|e| e.team == team);
        }
        divisions.retain(|d| !d.entries.is_empty());
    }

    Standings(divisions)
}

/// Handle one invocation of the standings service.
pub async fn handler(
    payload: Option<Value>,
    upstream: &UpstreamClient,
    now: DateTime<Utc>,
) -> Result<Standings, ErrorInfo> {
    let event = payload.clone().unwrap_or_default();
    info!(%event, "standings invoked");
    lookup(payload, upstream, now)
        .await
        .map_err(ServiceError::into_logged_info)
}

async fn lookup(
    payload: Option<Value>,
    upstream: &UpstreamClient,
    now: DateTime<Utc>,
) -> Result<Standings, ServiceError> {
    let request: Request = parse_request(payload)?;

    let year = match &request.year {
        Some(y) => parse_year(y)?,
        None => {
            let upcoming = upstream.upcoming_season().await?;
            info!("standings: no year given, using upcoming season {upcoming}");
            upcoming
        }
    };

    validate_year(year, now)?;
    let team = validate_team(request.team.as_deref())?;

    let records = upstream.standings(year).await?;
    info!("standings: {} upstream records", records.len());

    Ok(group_standings(records, team))
}
