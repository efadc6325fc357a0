//! Client for the third-party statistics API.
//!
//! Every call is a single `GET` with the API key as the `key` query
//! parameter. There is no retry: one failed call fails the invocation.

use hyper::ext::ReasonPhrase;
use lambda_runtime::tracing::{debug, info};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::time::Duration;

use crate::{
    byeweek::ByeRecord,
    config::Config,
    error::ServiceError,
    standings::StandingRecord,
    validation::{parse_year, SeasonType, YearInput, FORMAT},
};

#[derive(Clone, Debug)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(UpstreamClient {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}/{}", self.base_url, FORMAT, resource)
    }

    /// Fetch `resource` and decode its body. Only 200 and 201 count as
    /// success; any other status is reported with the upstream's own code
    /// and reason phrase.
    pub async fn get_json<T: DeserializeOwned>(&self, resource: &str) -> Result<T, ServiceError> {
        let url = self.url(resource);
        debug!("GET {url}");

        // The request URL carries the API key, so it is stripped from any
        // transport error before that error can reach a caller or a log.
        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = resp.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(ServiceError::upstream(status.as_u16(), status_text(&resp)));
        }

        let body = resp.bytes().await.map_err(reqwest::Error::without_url)?;
        info!("{resource}: received {} bytes", body.len());
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn byes(
        &self,
        year: i32,
        season_type: SeasonType,
    ) -> Result<Vec<ByeRecord>, ServiceError> {
        self.get_json(&format!("Byes/{year}{season_type}")).await
    }

    pub async fn standings(&self, year: i32) -> Result<Vec<StandingRecord>, ServiceError> {
        self.get_json(&format!("Standings/{year}")).await
    }

    /// The season the API considers current or next. The API answers with a
    /// bare scalar, which may come back as a number or a string.
    pub async fn upcoming_season(&self) -> Result<i32, ServiceError> {
        let value: Value = self.get_json("UpcomingSeason").await?;
        let year = YearInput::deserialize(&value).map_err(|_| {
            ServiceError::Unknown(format!("unexpected UpcomingSeason response: {value}"))
        })?;
        parse_year(&year)
    }
}

/// The reason phrase the upstream actually sent. hyper only records it when it
/// differs from the canonical one for the status.
fn status_text(resp: &Response) -> String {
    resp.extensions()
        .get::<ReasonPhrase>()
        .and_then(|r| std::str::from_utf8(r.as_bytes()).ok())
        .or_else(|| resp.status().canonical_reason())
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    pub const TEST_KEY: &str = "test-key";

    pub fn client_for(server: &MockServer) -> UpstreamClient {
        let config = Config {
            api_key: TEST_KEY.to_owned(),
            base_url: server.uri(),
            timeout_secs: 5,
        };
        UpstreamClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn sends_key_and_builds_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/Byes/2024REG"))
            .and(query_param("key", TEST_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "Week": 5, "Team": "DET", "Season": 2024 },
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let byes = client_for(&server)
            .byes(2024, SeasonType::Regular)
            .await
            .unwrap();
        assert_eq!(byes.len(), 1);
        assert_eq!(byes[0].week, 5);
        assert_eq!(byes[0].team, "DET");
    }

    #[tokio::test]
    async fn created_counts_as_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/Standings/2024"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .mount(&server)
            .await;

        let rows = client_for(&server).standings(2024).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn error_status_is_reported_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).standings(2024).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[tokio::test]
    async fn upcoming_season_number_or_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/UpcomingSeason"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(2025)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/json/UpcomingSeason"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("2026")))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.upcoming_season().await.unwrap(), 2025);
        assert_eq!(client.upcoming_season().await.unwrap(), 2026);
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).standings(2024).await.unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
        assert_eq!(err.status_code(), crate::error::UNKNOWN_STATUS);
    }

    #[tokio::test]
    async fn custom_reason_phrase_is_kept() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf).await;
            sock.write_all(
                b"HTTP/1.1 500 Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            )
            .await
            .unwrap();
        });

        let client = UpstreamClient::new(&Config {
            api_key: TEST_KEY.to_owned(),
            base_url: format!("http://{addr}"),
            timeout_secs: 5,
        })
        .unwrap();

        let err = client.standings(2024).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "Server Error");
    }

    #[tokio::test]
    async fn transport_error_hides_api_key() {
        let client = UpstreamClient::new(&Config {
            api_key: "SECRET123".to_owned(),
            base_url: "http://127.0.0.1:1".to_owned(),
            timeout_secs: 5,
        })
        .unwrap();

        let err = client.byes(2024, SeasonType::Regular).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));

        let info = crate::error::ErrorInfo::from(&err);
        assert!(!info.message.contains("SECRET123"), "{}", info.message);
        assert!(!format!("{err:?}").contains("SECRET123"));
    }
}
