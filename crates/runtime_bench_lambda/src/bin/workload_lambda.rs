use lambda_runtime::{service_fn, Error, LambdaEvent};
use runtime_bench_lambda::handlers::workload::{handle_workload_event, WorkloadReport};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<WorkloadReport, Error> {
    handle_workload_event(&event.payload).map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::run(service_fn(handle_request)).await
}
