use lambda_runtime::{service_fn, Error, LambdaEvent};
use mentorship_lambda::handlers::api::ApiGatewayResponse;
use mentorship_lambda::handlers::dispatch;
use mentorship_lambda::handlers::list::{list, ENDPOINT};
use mentorship_lambda::runtime::LambdaRuntime;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let runtime = LambdaRuntime::load(&ENDPOINT).await?;
    let blobs = runtime.blob_store()?;

    let runtime = &runtime;
    let blobs = &blobs;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let response = dispatch(
            &ENDPOINT,
            runtime.environment(),
            &runtime.notifier,
            event.payload,
            |request| async move { list(&request, blobs).await },
        )
        .await;
        Ok::<ApiGatewayResponse, Error>(response)
    }))
    .await
}
