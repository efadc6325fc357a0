//! "Bare" version of the NFL statistics Lambda implementations.
//!
//! This executable defines a server that you can easily interact with locally.
//! It returns the reply JSON as-is, with failures reported in-band as an
//! error record. Deployments behind API Gateway should use the "proxy event"
//! version instead, which turns failures into HTTP status codes.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

use nfl_stats_lambda::Services;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let svcs = Services::init().await?;
    let ref_svcs = &svcs;

    run(service_fn(|event: LambdaEvent<Value>| async move {
        let (payload, context) = event.into_parts();
        let reply = ref_svcs
            .dispatch(context.invoked_function_arn, Some(payload))
            .await?;
        Ok::<Value, Error>(reply.into_value())
    }))
    .await?;
    Ok(())
}
