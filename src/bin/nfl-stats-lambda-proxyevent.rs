//! "Proxy event" version of the NFL statistics Lambda implementations.
//!
//! This executable defines a server that expects to be interacted with
//! according to AWS API Gateway's "proxy event" protocol. Unlike the "bare"
//! version, replies go out in a proper HTTP envelope: failures carry their
//! status code, and the CORS headers the browser clients need are attached.

use lambda_http::{run, service_fn, Error, Request, RequestExt, RequestPayloadExt};
use serde_json::Value;

use nfl_stats_lambda::Services;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let svcs = Services::init().await?;
    let ref_svcs = &svcs;

    run(service_fn(|req: Request| async move {
        let context = req.lambda_context();
        let payload: Option<Value> = req.payload()?;
        ref_svcs
            .dispatch(context.invoked_function_arn, payload)
            .await?
            .into_http_response()
    }))
    .await?;
    Ok(())
}
