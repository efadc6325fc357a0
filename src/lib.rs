//! Lambda-powered NFL statistics services
//!
//! This library crate implements a small set of functions that proxy a
//! third-party sports statistics API and regroup its flat tables into shapes
//! that are easier for a client to use. The common codebase is compiled into
//! three executables: `nfl-stats-lambda-bare` (plain JSON in, JSON out),
//! `nfl-stats-lambda-proxyevent` (for deployments behind AWS API Gateway's
//! "proxy event" framework), and `nfl-stats-lambda-oneshot`, which runs a
//! single invocation from the command line.
//!
//! No service keeps any state between invocations. Each one validates its
//! input, makes at most two upstream `GET`s, and reshapes the result.

use chrono::Utc;
use lambda_http::{
    http::header::{ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE},
    Body, Response,
};
use lambda_runtime::Error;
use serde_json::Value;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

pub mod byeweek;
pub mod config;
pub mod error;
pub mod standings;
pub mod upstream;
pub mod validation;

use crate::{config::Config, error::ErrorInfo, upstream::UpstreamClient};

/// The outcome of one service invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Success(Value),
    Failure(ErrorInfo),
}

impl Reply {
    fn from_result<T: serde::Serialize>(result: Result<T, ErrorInfo>) -> Result<Self, Error> {
        Ok(match result {
            Ok(data) => Reply::Success(serde_json::to_value(data)?),
            Err(info) => Reply::Failure(info),
        })
    }

    /// The body as a plain Lambda returns it: the data itself on success, or
    /// the error record.
    pub fn into_value(self) -> Value {
        match self {
            Reply::Success(v) => v,
            Reply::Failure(info) => serde_json::json!(info),
        }
    }

    /// The HTTP status to use when the reply goes out through API Gateway.
    /// Failure codes that are not HTTP errors map to 500.
    pub fn http_status(&self) -> u16 {
        match self {
            Reply::Success(_) => 200,
            Reply::Failure(info) if (400..=599).contains(&info.status_code) => info.status_code,
            Reply::Failure(_) => 500,
        }
    }

    /// Wrap the reply for API Gateway: a JSON body, the status from
    /// [`Reply::http_status`], and the CORS headers browser clients need.
    pub fn into_http_response(self) -> Result<Response<Body>, Error> {
        let status = self.http_status();
        let body = serde_json::to_string(&self.into_value())?;

        Ok(Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
            .header(ACCESS_CONTROL_ALLOW_CREDENTIALS, "true")
            .body(Body::from(body))?)
    }
}

pub struct Services {
    upstream: UpstreamClient,
}

impl Services {
    /// Create a state object for the statistics Lambda services.
    pub async fn init() -> Result<Self, Error> {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_target(false) // don't print the module name
            .without_time() // don't print time (CloudWatch has it)
            .init();

        let config = Config::from_env()?;
        Self::with_config(&config)
    }

    /// Create the state object from explicit settings, without touching the
    /// environment or the global logger.
    pub fn with_config(config: &Config) -> Result<Self, Error> {
        let upstream = UpstreamClient::new(config)?;
        Ok(Services { upstream })
    }

    /// Handle an invocation of one of the statistics APIs.
    ///
    /// All of the functions are bundled into one executable. We "know" which
    /// one is being invoked by looking at the suffix of the function ARN (or
    /// the bare function name, when run locally). The only error returned
    /// here is for a function we don't implement; anything that goes wrong
    /// inside a service comes back as a [`Reply::Failure`].
    pub async fn dispatch(&self, mut arn: String, payload: Option<Value>) -> Result<Reply, Error> {
        // Local testing environment?
        if arn.ends_with(":test_function") {
            arn = std::env::var("NFL_LOCALTEST_ARN")
                .map_err(|_| -> Error { "NFL_LOCALTEST_ARN must be set for local testing".into() })?;
        }

        let name = arn.to_lowercase();
        let now = Utc::now();

        if name.ends_with("byeweek") {
            Reply::from_result(byeweek::handler(payload, &self.upstream, now).await)
        } else if name.ends_with("standings") {
            Reply::from_result(standings::handler(payload, &self.upstream, now).await)
        } else {
            Err(format!("unhandled function: {}", arn).into())
        }
    }
}
