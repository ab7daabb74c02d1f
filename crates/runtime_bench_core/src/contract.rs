use serde::{Deserialize, Serialize};

/// Number of trigger messages emitted per benchmark run.
pub const INVOKE_MAX: usize = 30;
/// Ceiling for a trigger's visibility delay, in seconds (the queue maximum).
pub const DELAY_MAX_SECS: u32 = 900;
/// Fixed body of every trigger message. The message is pure timing signal and
/// carries no task data.
pub const TRIGGER_BODY: &str = "{}";
/// Detail-type stamped on trigger events by the schedule rule.
pub const TRIGGER_DETAIL_TYPE: &str = "runtime-benchmark";

pub const ENV_NODE_QUEUE: &str = "ARN_NODE_QUEUE";
pub const ENV_DENO_QUEUE: &str = "ARN_DENO_QUEUE";
pub const ENV_BUN_QUEUE: &str = "ARN_BUN_QUEUE";

/// The three runtimes under benchmark comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BenchTarget {
    Node,
    Deno,
    Bun,
}

impl BenchTarget {
    pub const ALL: [BenchTarget; 3] = [Self::Node, Self::Deno, Self::Bun];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "NODE",
            Self::Deno => "DENO",
            Self::Bun => "BUN",
        }
    }

    /// Parse a trigger's raw target field. Matching is exact; anything else
    /// is outside the enumerated set.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "NODE" => Some(Self::Node),
            "DENO" => Some(Self::Deno),
            "BUN" => Some(Self::Bun),
            _ => None,
        }
    }

    /// Environment variable carrying this target's queue binding.
    pub fn queue_env_var(self) -> &'static str {
        match self {
            Self::Node => ENV_NODE_QUEUE,
            Self::Deno => ENV_DENO_QUEUE,
            Self::Bun => ENV_BUN_QUEUE,
        }
    }
}

impl std::fmt::Display for BenchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue bindings exactly as observed in the environment, before validation.
/// Field names serialize to the environment variable names so a failed
/// validation can log the complete observed set verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservedBindings {
    #[serde(rename = "ARN_NODE_QUEUE")]
    pub node_queue: Option<String>,
    #[serde(rename = "ARN_DENO_QUEUE")]
    pub deno_queue: Option<String>,
    #[serde(rename = "ARN_BUN_QUEUE")]
    pub bun_queue: Option<String>,
}

impl ObservedBindings {
    /// Snapshot the process environment. Values are kept as observed,
    /// including empty strings; validation happens in
    /// [`TargetBindings::from_observed`].
    pub fn from_env() -> Self {
        Self {
            node_queue: std::env::var(ENV_NODE_QUEUE).ok(),
            deno_queue: std::env::var(ENV_DENO_QUEUE).ok(),
            bun_queue: std::env::var(ENV_BUN_QUEUE).ok(),
        }
    }

    pub fn get(&self, target: BenchTarget) -> Option<&str> {
        let value = match target {
            BenchTarget::Node => &self.node_queue,
            BenchTarget::Deno => &self.deno_queue,
            BenchTarget::Bun => &self.bun_queue,
        };
        value.as_deref()
    }

    /// Environment variable names whose bindings are absent or blank.
    pub fn missing(&self) -> Vec<&'static str> {
        BenchTarget::ALL
            .into_iter()
            .filter(|target| {
                self.get(*target)
                    .map(|value| value.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(BenchTarget::queue_env_var)
            .collect()
    }
}

/// Validated, immutable mapping of every target to its queue identifier.
/// Owned by the deployment layer and treated as read-only input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetBindings {
    node_queue: String,
    deno_queue: String,
    bun_queue: String,
}

impl TargetBindings {
    /// Fail-fast whole-topology check: every enumerated target must carry a
    /// non-empty binding before any dispatch begins, not just the one being
    /// served.
    pub fn from_observed(observed: &ObservedBindings) -> Result<Self, DispatchError> {
        if !observed.missing().is_empty() {
            return Err(DispatchError::Configuration {
                observed: observed.clone(),
            });
        }

        let bound = |target: BenchTarget| -> String {
            observed
                .get(target)
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        Ok(Self {
            node_queue: bound(BenchTarget::Node),
            deno_queue: bound(BenchTarget::Deno),
            bun_queue: bound(BenchTarget::Bun),
        })
    }

    pub fn queue_identifier(&self, target: BenchTarget) -> &str {
        match target {
            BenchTarget::Node => &self.node_queue,
            BenchTarget::Deno => &self.deno_queue,
            BenchTarget::Bun => &self.bun_queue,
        }
    }

    /// Resolvable queue name for a target: the trailing segment of its
    /// committed identifier.
    pub fn queue_name(&self, target: BenchTarget) -> &str {
        queue_name_from_identifier(self.queue_identifier(target))
    }
}

/// Trailing `:`-separated segment of a queue identifier. A full ARN yields
/// its resource name; a bare queue name passes through unchanged.
pub fn queue_name_from_identifier(identifier: &str) -> &str {
    identifier.rsplit(':').next().unwrap_or(identifier)
}

/// One trigger message within a burst, positioned on the delay curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledMessage {
    /// 0-based position within the burst, `< INVOKE_MAX`.
    pub sequence_index: usize,
    /// Visibility delay in seconds; `None` means the delay attribute is not
    /// set at all and the message is immediately visible.
    pub delay_seconds: Option<u32>,
}

impl ScheduledMessage {
    pub fn body(&self) -> &'static str {
        TRIGGER_BODY
    }
}

/// Queue acknowledgement for one accepted trigger. Standard queues assign no
/// sequence number; the field is still carried so the log line records it as
/// observed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
    pub sequence_number: Option<String>,
}

/// Acceptance status of one send attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SendStatus {
    Accepted {
        message_id: Option<String>,
        sequence_number: Option<String>,
    },
    Failed {
        error: String,
    },
}

/// Per-message dispatch record. Observability only: no outcome ever triggers
/// a retry or aborts the remainder of the burst.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub sequence_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<u32>,
    #[serde(flatten)]
    pub status: SendStatus,
}

impl DispatchOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self.status, SendStatus::Accepted { .. })
    }
}

/// Summary returned to the invoking scheduler after one dispatch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub target: BenchTarget,
    pub messages_attempted: usize,
    pub messages_accepted: usize,
    pub outcomes: Vec<DispatchOutcome>,
}

/// Fatal dispatch failures. Per-message send failures are deliberately not
/// represented here; they are absorbed into [`DispatchOutcome`]s while the
/// burst continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// One or more required queue bindings are absent or blank. Carries the
    /// full observed set for diagnosis.
    Configuration { observed: ObservedBindings },
    /// The trigger named a target outside the enumerated set.
    UnknownTarget { requested: String },
    /// The bound queue identifier did not resolve to a live queue.
    Resolution { queue_name: String, message: String },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration { observed } => {
                write!(
                    f,
                    "missing queue binding environment variable(s): {}",
                    observed.missing().join(", ")
                )
            }
            Self::UnknownTarget { requested } => {
                write!(f, "unknown benchmark target \"{requested}\"")
            }
            Self::Resolution {
                queue_name,
                message,
            } => {
                write!(f, "failed to resolve queue \"{queue_name}\": {message}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn complete_bindings() -> ObservedBindings {
        ObservedBindings {
            node_queue: bound("arn:aws:sqs:us-east-2:111122223333:node-queue"),
            deno_queue: bound("arn:aws:sqs:us-east-2:111122223333:deno-queue"),
            bun_queue: bound("arn:aws:sqs:us-east-2:111122223333:bun-queue"),
        }
    }

    #[test]
    fn target_parse_is_exact() {
        assert_eq!(BenchTarget::parse("NODE"), Some(BenchTarget::Node));
        assert_eq!(BenchTarget::parse("DENO"), Some(BenchTarget::Deno));
        assert_eq!(BenchTarget::parse("BUN"), Some(BenchTarget::Bun));
        assert_eq!(BenchTarget::parse("node"), None);
        assert_eq!(BenchTarget::parse("RUST"), None);
        assert_eq!(BenchTarget::parse(""), None);
    }

    #[test]
    fn target_round_trips_through_str() {
        for target in BenchTarget::ALL {
            assert_eq!(BenchTarget::parse(target.as_str()), Some(target));
        }
    }

    #[test]
    fn complete_bindings_validate() {
        let bindings = TargetBindings::from_observed(&complete_bindings())
            .expect("complete bindings should validate");

        assert_eq!(
            bindings.queue_identifier(BenchTarget::Deno),
            "arn:aws:sqs:us-east-2:111122223333:deno-queue"
        );
    }

    #[test]
    fn absent_binding_is_a_configuration_error() {
        let observed = ObservedBindings {
            deno_queue: None,
            ..complete_bindings()
        };

        let error = TargetBindings::from_observed(&observed)
            .expect_err("absent binding should fail validation");
        match &error {
            DispatchError::Configuration { observed } => {
                assert_eq!(observed.missing(), vec![ENV_DENO_QUEUE]);
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
        assert!(error.to_string().contains(ENV_DENO_QUEUE));
    }

    #[test]
    fn blank_binding_is_a_configuration_error() {
        let observed = ObservedBindings {
            bun_queue: bound("   "),
            ..complete_bindings()
        };

        let error = TargetBindings::from_observed(&observed)
            .expect_err("blank binding should fail validation");
        assert!(error.to_string().contains(ENV_BUN_QUEUE));
    }

    #[test]
    fn missing_lists_every_unbound_target() {
        let observed = ObservedBindings {
            node_queue: bound(""),
            deno_queue: None,
            bun_queue: bound("arn:aws:sqs:us-east-2:111122223333:bun-queue"),
        };

        assert_eq!(observed.missing(), vec![ENV_NODE_QUEUE, ENV_DENO_QUEUE]);
    }

    #[test]
    fn queue_name_is_the_trailing_arn_segment() {
        assert_eq!(
            queue_name_from_identifier("arn:aws:sqs:us-east-2:111122223333:node-queue"),
            "node-queue"
        );
        assert_eq!(queue_name_from_identifier("bare-queue-name"), "bare-queue-name");

        let bindings = TargetBindings::from_observed(&complete_bindings())
            .expect("complete bindings should validate");
        assert_eq!(bindings.queue_name(BenchTarget::Node), "node-queue");
    }

    #[test]
    fn observed_bindings_serialize_under_env_var_names() {
        let observed = ObservedBindings {
            node_queue: bound("arn:node"),
            deno_queue: None,
            bun_queue: bound(""),
        };

        let value = serde_json::to_value(&observed).expect("bindings should serialize");
        assert_eq!(value["ARN_NODE_QUEUE"], "arn:node");
        assert_eq!(value["ARN_DENO_QUEUE"], serde_json::Value::Null);
        assert_eq!(value["ARN_BUN_QUEUE"], "");
    }

    #[test]
    fn outcome_log_shape_flattens_status() {
        let accepted = DispatchOutcome {
            sequence_index: 10,
            delay_seconds: Some(90),
            status: SendStatus::Accepted {
                message_id: Some("msg-10".to_string()),
                sequence_number: None,
            },
        };
        let value = serde_json::to_value(&accepted).expect("outcome should serialize");
        assert_eq!(value["sequence_index"], 10);
        assert_eq!(value["delay_seconds"], 90);
        assert_eq!(value["status"], "accepted");
        assert_eq!(value["message_id"], "msg-10");

        let failed = DispatchOutcome {
            sequence_index: 0,
            delay_seconds: None,
            status: SendStatus::Failed {
                error: "queue rejected the message".to_string(),
            },
        };
        let value = serde_json::to_value(&failed).expect("outcome should serialize");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"], "queue rejected the message");
        assert!(value.get("delay_seconds").is_none());
    }
}
