use lambda_runtime::{service_fn, Error, LambdaEvent};
use runtime_bench_core::contract::{DispatchReport, ObservedBindings, SendReceipt, TargetBindings};
use runtime_bench_lambda::adapters::queue::TriggerQueue;
use runtime_bench_lambda::handlers::dispatch::handle_dispatch_event;
use serde_json::{json, Value};

struct SqsTriggerQueue {
    sqs_client: aws_sdk_sqs::Client,
}

impl TriggerQueue for SqsTriggerQueue {
    fn resolve_queue_url(&self, queue_name: &str) -> Result<String, String> {
        let name = queue_name.to_string();
        let client = self.sqs_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_queue_url()
                    .queue_name(name)
                    .send()
                    .await
                    .map_err(|error| format!("failed to look up queue url: {error}"))?;

                output
                    .queue_url()
                    .map(str::to_string)
                    .ok_or_else(|| "queue url missing from lookup response".to_string())
            })
        })
    }

    fn send_trigger(
        &self,
        queue_url: &str,
        body: &str,
        delay_seconds: Option<u32>,
    ) -> Result<SendReceipt, String> {
        let url = queue_url.to_string();
        let message_body = body.to_string();
        let client = self.sqs_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut request = client.send_message().queue_url(url).message_body(message_body);
                if let Some(delay) = delay_seconds {
                    request = request.delay_seconds(delay as i32);
                }

                request
                    .send()
                    .await
                    .map(|output| SendReceipt {
                        message_id: output.message_id().map(str::to_string),
                        sequence_number: output.sequence_number().map(str::to_string),
                    })
                    .map_err(|error| format!("failed to send trigger message: {error}"))
            })
        })
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    observed: &ObservedBindings,
    trigger_queue: &SqsTriggerQueue,
) -> Result<DispatchReport, Error> {
    handle_dispatch_event(event.payload, observed, trigger_queue)
        .map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // The environment is read once per process; an incomplete topology is a
    // deployment defect and fails startup instead of waiting for a trigger.
    let observed = ObservedBindings::from_env();
    if let Err(error) = TargetBindings::from_observed(&observed) {
        eprintln!(
            "{}",
            json!({
                "component": "dispatcher_lambda",
                "level": "error",
                "event": "startup_config_invalid",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "details": {
                    "observed": observed,
                    "error": error.to_string(),
                },
            })
        );
        return Err(Error::from(error.to_string()));
    }

    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let trigger_queue = SqsTriggerQueue {
        sqs_client: aws_sdk_sqs::Client::new(&config),
    };

    let observed_ref = &observed;
    let queue_ref = &trigger_queue;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, observed_ref, queue_ref).await
    }))
    .await
}
