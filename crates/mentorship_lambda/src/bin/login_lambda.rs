use lambda_runtime::{service_fn, Error, LambdaEvent};
use mentorship_lambda::handlers::api::ApiGatewayResponse;
use mentorship_lambda::handlers::dispatch;
use mentorship_lambda::handlers::login::{login, ENDPOINT};
use mentorship_lambda::runtime::LambdaRuntime;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let runtime = LambdaRuntime::load(&ENDPOINT).await?;
    let identity = runtime.identity_provider()?;

    let runtime = &runtime;
    let identity = &identity;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let response = dispatch(
            &ENDPOINT,
            runtime.environment(),
            &runtime.notifier,
            event.payload,
            |request| async move { login(&request, identity).await },
        )
        .await;
        Ok::<ApiGatewayResponse, Error>(response)
    }))
    .await
}
