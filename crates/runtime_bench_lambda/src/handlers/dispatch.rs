use runtime_bench_core::burst::compute_burst_plan;
use runtime_bench_core::contract::{
    BenchTarget, DispatchError, DispatchOutcome, DispatchReport, ObservedBindings, SendStatus,
    TargetBindings, INVOKE_MAX,
};
use serde_json::{json, Value};

use crate::adapters::queue::TriggerQueue;

/// Run one benchmark burst for the target named in the trigger event.
///
/// The stages are ordered so that misconfiguration surfaces before anything
/// is sent: the whole topology is validated first (a broken binding for any
/// target fails the run, not just the target being served), then the
/// requested target is checked against the enumerated set, then its queue is
/// resolved. Only after all three pass does the burst start, and from that
/// point individual send failures are recorded but never abort the loop.
pub fn handle_dispatch_event(
    event: Value,
    observed: &ObservedBindings,
    queue: &dyn TriggerQueue,
) -> Result<DispatchReport, DispatchError> {
    let bindings = match TargetBindings::from_observed(observed) {
        Ok(value) => value,
        Err(error) => {
            log_dispatch_error(
                "missing_queue_binding",
                json!({
                    "observed": observed,
                }),
            );
            return Err(error);
        }
    };

    let raw_target = extract_target(&event).unwrap_or_default();
    let target = match BenchTarget::parse(&raw_target) {
        Some(value) => value,
        None => {
            return Err(DispatchError::UnknownTarget {
                requested: raw_target,
            });
        }
    };

    log_dispatch_info(
        "trigger_received",
        json!({
            "target": target,
            "queue_identifier": bindings.queue_identifier(target),
        }),
    );

    let queue_name = bindings.queue_name(target);
    let queue_url = match queue.resolve_queue_url(queue_name) {
        Ok(value) => value,
        Err(message) => {
            log_dispatch_error(
                "queue_resolution_failed",
                json!({
                    "target": target,
                    "queue_name": queue_name,
                    "error": message.clone(),
                }),
            );
            return Err(DispatchError::Resolution {
                queue_name: queue_name.to_string(),
                message,
            });
        }
    };

    let mut outcomes = Vec::with_capacity(INVOKE_MAX);
    for message in compute_burst_plan() {
        let status = match queue.send_trigger(&queue_url, message.body(), message.delay_seconds) {
            Ok(receipt) => SendStatus::Accepted {
                message_id: receipt.message_id,
                sequence_number: receipt.sequence_number,
            },
            Err(error) => SendStatus::Failed { error },
        };

        let outcome = DispatchOutcome {
            sequence_index: message.sequence_index,
            delay_seconds: message.delay_seconds,
            status,
        };
        match &outcome.status {
            SendStatus::Accepted { .. } => log_dispatch_info(
                "trigger_sent",
                json!({
                    "target": target,
                    "outcome": outcome,
                }),
            ),
            SendStatus::Failed { .. } => log_dispatch_error(
                "trigger_send_failed",
                json!({
                    "target": target,
                    "outcome": outcome,
                }),
            ),
        }
        outcomes.push(outcome);
    }

    let messages_accepted = outcomes.iter().filter(|outcome| outcome.accepted()).count();
    let report = DispatchReport {
        target,
        messages_attempted: outcomes.len(),
        messages_accepted,
        outcomes,
    };

    log_dispatch_info(
        "burst_complete",
        json!({
            "target": report.target,
            "messages_attempted": report.messages_attempted,
            "messages_accepted": report.messages_accepted,
        }),
    );
    Ok(report)
}

/// Pull the target name out of a trigger event. The schedule delivers an
/// EventBridge envelope whose `detail` carries the payload; direct
/// invocations pass the payload bare. Both shapes are accepted.
fn extract_target(event: &Value) -> Option<String> {
    let object = event.as_object()?;
    let payload = match object.get("detail") {
        Some(Value::Object(detail)) => detail,
        _ => object,
    };
    payload
        .get("target")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn log_dispatch_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "benchmark_dispatcher",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_dispatch_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "benchmark_dispatcher",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use runtime_bench_core::contract::SendReceipt;

    use super::*;

    struct CapturedSend {
        queue_url: String,
        body: String,
        delay_seconds: Option<u32>,
    }

    struct CapturingQueue {
        sends: Mutex<Vec<CapturedSend>>,
        failing_indexes: Vec<usize>,
    }

    impl CapturingQueue {
        fn new() -> Self {
            Self {
                sends: Mutex::new(Vec::new()),
                failing_indexes: Vec::new(),
            }
        }

        fn failing_at(indexes: Vec<usize>) -> Self {
            Self {
                sends: Mutex::new(Vec::new()),
                failing_indexes: indexes,
            }
        }

        fn send_count(&self) -> usize {
            self.sends.lock().expect("poisoned mutex").len()
        }

        fn send_at(&self, index: usize) -> (String, String, Option<u32>) {
            let sends = self.sends.lock().expect("poisoned mutex");
            let send = &sends[index];
            (send.queue_url.clone(), send.body.clone(), send.delay_seconds)
        }
    }

    impl TriggerQueue for CapturingQueue {
        fn resolve_queue_url(&self, queue_name: &str) -> Result<String, String> {
            Ok(format!("https://sqs.example/{queue_name}"))
        }

        fn send_trigger(
            &self,
            queue_url: &str,
            body: &str,
            delay_seconds: Option<u32>,
        ) -> Result<SendReceipt, String> {
            let mut sends = self.sends.lock().expect("poisoned mutex");
            let attempt_index = sends.len();
            sends.push(CapturedSend {
                queue_url: queue_url.to_string(),
                body: body.to_string(),
                delay_seconds,
            });

            if self.failing_indexes.contains(&attempt_index) {
                return Err(format!("simulated send failure at index {attempt_index}"));
            }

            Ok(SendReceipt {
                message_id: Some(format!("msg-{attempt_index}")),
                sequence_number: None,
            })
        }
    }

    struct UnresolvableQueue;

    impl TriggerQueue for UnresolvableQueue {
        fn resolve_queue_url(&self, queue_name: &str) -> Result<String, String> {
            Err(format!("no queue named {queue_name}"))
        }

        fn send_trigger(
            &self,
            _queue_url: &str,
            _body: &str,
            _delay_seconds: Option<u32>,
        ) -> Result<SendReceipt, String> {
            panic!("send_trigger should not be reached when resolution fails");
        }
    }

    fn complete_bindings() -> ObservedBindings {
        ObservedBindings {
            node_queue: Some("arn:aws:sqs:us-east-2:111122223333:node-queue".to_string()),
            deno_queue: Some("arn:aws:sqs:us-east-2:111122223333:deno-queue".to_string()),
            bun_queue: Some("arn:aws:sqs:us-east-2:111122223333:bun-queue".to_string()),
        }
    }

    fn scheduled_trigger(target: &str) -> Value {
        json!({
            "detail-type": "runtime-benchmark",
            "detail": {
                "target": target,
            }
        })
    }

    #[test]
    fn dispatches_the_full_burst_in_sequence() {
        let queue = CapturingQueue::new();
        let report = handle_dispatch_event(scheduled_trigger("NODE"), &complete_bindings(), &queue)
            .expect("dispatch should succeed");

        assert_eq!(report.target, BenchTarget::Node);
        assert_eq!(report.messages_attempted, INVOKE_MAX);
        assert_eq!(report.messages_accepted, INVOKE_MAX);
        assert_eq!(queue.send_count(), INVOKE_MAX);

        let (queue_url, body, delay) = queue.send_at(0);
        assert_eq!(queue_url, "https://sqs.example/node-queue");
        assert_eq!(body, "{}");
        assert_eq!(delay, None);

        let (_, _, delay) = queue.send_at(1);
        assert_eq!(delay, Some(900));
        let (_, _, delay) = queue.send_at(10);
        assert_eq!(delay, Some(90));

        for (index, outcome) in report.outcomes.iter().enumerate() {
            assert_eq!(outcome.sequence_index, index);
            assert!(outcome.accepted());
        }
    }

    #[test]
    fn any_missing_binding_fails_every_target_before_sending() {
        let queue = CapturingQueue::new();
        let observed = ObservedBindings {
            bun_queue: None,
            ..complete_bindings()
        };

        let error = handle_dispatch_event(scheduled_trigger("NODE"), &observed, &queue)
            .expect_err("dispatch should fail on incomplete topology");

        match error {
            DispatchError::Configuration { observed } => {
                assert_eq!(observed.missing(), vec!["ARN_BUN_QUEUE"]);
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
        assert_eq!(queue.send_count(), 0);
    }

    #[test]
    fn blank_binding_counts_as_missing() {
        let queue = CapturingQueue::new();
        let observed = ObservedBindings {
            deno_queue: Some("  ".to_string()),
            ..complete_bindings()
        };

        let error = handle_dispatch_event(scheduled_trigger("NODE"), &observed, &queue)
            .expect_err("dispatch should fail on blank binding");

        assert!(matches!(error, DispatchError::Configuration { .. }));
        assert_eq!(queue.send_count(), 0);
    }

    #[test]
    fn unknown_target_is_rejected_after_config_passes() {
        let queue = CapturingQueue::new();
        let error = handle_dispatch_event(scheduled_trigger("RUST"), &complete_bindings(), &queue)
            .expect_err("dispatch should reject targets outside the set");

        match error {
            DispatchError::UnknownTarget { requested } => assert_eq!(requested, "RUST"),
            other => panic!("expected unknown target error, got {other:?}"),
        }
        assert_eq!(queue.send_count(), 0);
    }

    #[test]
    fn configuration_is_checked_before_target_membership() {
        let queue = CapturingQueue::new();
        let observed = ObservedBindings {
            node_queue: None,
            ..complete_bindings()
        };

        let error = handle_dispatch_event(scheduled_trigger("RUST"), &observed, &queue)
            .expect_err("dispatch should fail");

        assert!(matches!(error, DispatchError::Configuration { .. }));
        assert_eq!(queue.send_count(), 0);
    }

    #[test]
    fn missing_target_field_is_an_unknown_target() {
        let queue = CapturingQueue::new();
        let error = handle_dispatch_event(json!({"detail": {}}), &complete_bindings(), &queue)
            .expect_err("dispatch should fail without a target");

        match error {
            DispatchError::UnknownTarget { requested } => assert_eq!(requested, ""),
            other => panic!("expected unknown target error, got {other:?}"),
        }
        assert_eq!(queue.send_count(), 0);
    }

    #[test]
    fn bare_payloads_are_accepted_alongside_envelopes() {
        let queue = CapturingQueue::new();
        let report = handle_dispatch_event(json!({"target": "BUN"}), &complete_bindings(), &queue)
            .expect("bare payload should dispatch");

        assert_eq!(report.target, BenchTarget::Bun);
        let (queue_url, _, _) = queue.send_at(0);
        assert_eq!(queue_url, "https://sqs.example/bun-queue");
    }

    #[test]
    fn resolution_failure_aborts_before_any_send() {
        let error = handle_dispatch_event(
            scheduled_trigger("DENO"),
            &complete_bindings(),
            &UnresolvableQueue,
        )
        .expect_err("dispatch should fail when the queue cannot be resolved");

        match error {
            DispatchError::Resolution { queue_name, message } => {
                assert_eq!(queue_name, "deno-queue");
                assert!(message.contains("no queue named"));
            }
            other => panic!("expected resolution error, got {other:?}"),
        }
    }

    #[test]
    fn failed_sends_do_not_stop_the_burst() {
        let queue = CapturingQueue::failing_at(vec![3, 17]);
        let report = handle_dispatch_event(scheduled_trigger("NODE"), &complete_bindings(), &queue)
            .expect("dispatch should report failures without aborting");

        assert_eq!(queue.send_count(), INVOKE_MAX);
        assert_eq!(report.messages_attempted, INVOKE_MAX);
        assert_eq!(report.messages_accepted, INVOKE_MAX - 2);

        assert!(!report.outcomes[3].accepted());
        assert!(!report.outcomes[17].accepted());
        match &report.outcomes[3].status {
            SendStatus::Failed { error } => assert!(error.contains("index 3")),
            other => panic!("expected failed status, got {other:?}"),
        }
        assert!(report.outcomes[4].accepted());
        assert!(report.outcomes[29].accepted());
    }

    #[test]
    fn accepted_outcomes_carry_queue_receipts() {
        let queue = CapturingQueue::new();
        let report = handle_dispatch_event(scheduled_trigger("NODE"), &complete_bindings(), &queue)
            .expect("dispatch should succeed");

        match &report.outcomes[5].status {
            SendStatus::Accepted {
                message_id,
                sequence_number,
            } => {
                assert_eq!(message_id.as_deref(), Some("msg-5"));
                assert!(sequence_number.is_none());
            }
            other => panic!("expected accepted status, got {other:?}"),
        }
    }
}
