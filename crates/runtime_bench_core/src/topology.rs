//! Committed deployment topology for the benchmark fleet.
//!
//! The dispatcher never provisions anything; it receives queue identifiers
//! that a separate deployment layer committed ahead of time. This module is
//! the typed record of that commitment, including the uniform per-target
//! footprint that keeps the comparison fair: if one runtime got more memory
//! or a different batch size than the others, the benchmark would measure the
//! deployment instead of the runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contract::{BenchTarget, ObservedBindings, DELAY_MAX_SECS, TRIGGER_DETAIL_TYPE};

/// Queue visibility timeout, sized so a delayed trigger (up to
/// [`DELAY_MAX_SECS`]) plus its consumer run never re-deliver.
pub const QUEUE_VISIBILITY_TIMEOUT_SECS: u32 = 1_800;
/// Cadence of the recurring benchmark schedule.
pub const SCHEDULE_RATE_HOURS: u32 = 3;
/// Dispatcher execution ceiling; the send loop itself finishes in seconds.
pub const DISPATCHER_TIMEOUT_SECS: u32 = 900;
pub const WORKLOAD_MEMORY_MB: u32 = 128;
pub const WORKLOAD_ARCHITECTURE: &str = "arm64";
/// Every workload function consumes one trigger per execution so each timing
/// sample covers exactly one burst position.
pub const WORKLOAD_BATCH_SIZE: u32 = 1;
pub const BENCHMARK_FUNCTION_TAG: &str = "BenchmarkFunction";
pub const LOG_RETENTION_DAYS: u32 = 30;

/// Identifiers the deployment layer hands over for one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommittedTarget {
    pub queue_arn: String,
    pub function_arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueSpec {
    pub queue_arn: String,
    pub visibility_timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionSpec {
    pub function_arn: String,
    pub architecture: String,
    pub memory_mb: u32,
    pub batch_size: u32,
    pub log_retention_days: u32,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetTopology {
    pub queue: QueueSpec,
    pub function: FunctionSpec,
}

/// One scheduled trigger payload, as the schedule rule emits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriggerInput {
    pub detail_type: String,
    pub target: BenchTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleRule {
    pub rate_hours: u32,
    pub triggers: Vec<TriggerInput>,
}

/// The whole committed fleet: one queue/function pair per target, the
/// dispatcher's execution ceiling, and the schedule that fires every target
/// each cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BenchmarkTopology {
    pub targets: BTreeMap<BenchTarget, TargetTopology>,
    pub dispatcher_timeout_secs: u32,
    pub schedule: ScheduleRule,
}

impl BenchmarkTopology {
    /// Expand committed identifiers into the full topology, applying the
    /// uniform footprint to every target.
    pub fn from_committed(committed: BTreeMap<BenchTarget, CommittedTarget>) -> Self {
        let targets = committed
            .into_iter()
            .map(|(target, identifiers)| {
                let topology = TargetTopology {
                    queue: QueueSpec {
                        queue_arn: identifiers.queue_arn,
                        visibility_timeout_secs: QUEUE_VISIBILITY_TIMEOUT_SECS,
                    },
                    function: FunctionSpec {
                        function_arn: identifiers.function_arn,
                        architecture: WORKLOAD_ARCHITECTURE.to_string(),
                        memory_mb: WORKLOAD_MEMORY_MB,
                        batch_size: WORKLOAD_BATCH_SIZE,
                        log_retention_days: LOG_RETENTION_DAYS,
                        tags: BTreeMap::from([(
                            BENCHMARK_FUNCTION_TAG.to_string(),
                            "true".to_string(),
                        )]),
                    },
                };
                (target, topology)
            })
            .collect();

        let triggers = BenchTarget::ALL
            .into_iter()
            .map(|target| TriggerInput {
                detail_type: TRIGGER_DETAIL_TYPE.to_string(),
                target,
            })
            .collect();

        Self {
            targets,
            dispatcher_timeout_secs: DISPATCHER_TIMEOUT_SECS,
            schedule: ScheduleRule {
                rate_hours: SCHEDULE_RATE_HOURS,
                triggers,
            },
        }
    }

    /// Check the committed fleet against the benchmark's fairness and
    /// delivery requirements.
    pub fn validate(&self) -> Result<(), TopologyError> {
        for target in BenchTarget::ALL {
            let Some(topology) = self.targets.get(&target) else {
                return Err(TopologyError::new(format!(
                    "target {target} has no committed topology"
                )));
            };

            if topology.queue.queue_arn.trim().is_empty() {
                return Err(TopologyError::new(format!(
                    "target {target} has a blank queue identifier"
                )));
            }
            if topology.function.function_arn.trim().is_empty() {
                return Err(TopologyError::new(format!(
                    "target {target} has a blank function identifier"
                )));
            }
            if topology.queue.visibility_timeout_secs < DELAY_MAX_SECS {
                return Err(TopologyError::new(format!(
                    "target {target} visibility timeout {}s is below the maximum trigger delay {DELAY_MAX_SECS}s",
                    topology.queue.visibility_timeout_secs
                )));
            }
            if topology.function.tags.get(BENCHMARK_FUNCTION_TAG).map(String::as_str)
                != Some("true")
            {
                return Err(TopologyError::new(format!(
                    "target {target} is missing the {BENCHMARK_FUNCTION_TAG}=true tag"
                )));
            }
        }

        let reference = &self.targets[&BenchTarget::Node].function;
        for target in BenchTarget::ALL {
            let function = &self.targets[&target].function;
            if function.architecture != reference.architecture
                || function.memory_mb != reference.memory_mb
                || function.batch_size != reference.batch_size
                || function.log_retention_days != reference.log_retention_days
                || function.tags != reference.tags
            {
                return Err(TopologyError::new(format!(
                    "target {target} deviates from the uniform function footprint"
                )));
            }
        }

        for target in BenchTarget::ALL {
            let matching = self
                .schedule
                .triggers
                .iter()
                .filter(|trigger| trigger.target == target)
                .count();
            if matching != 1 {
                return Err(TopologyError::new(format!(
                    "schedule must trigger target {target} exactly once per cycle, found {matching}"
                )));
            }
        }
        if let Some(trigger) = self
            .schedule
            .triggers
            .iter()
            .find(|trigger| trigger.detail_type != TRIGGER_DETAIL_TYPE)
        {
            return Err(TopologyError::new(format!(
                "schedule trigger for {} carries detail-type '{}', expected '{TRIGGER_DETAIL_TYPE}'",
                trigger.target, trigger.detail_type
            )));
        }

        Ok(())
    }

    /// The queue bindings this topology would inject into the dispatcher's
    /// environment.
    pub fn bindings(&self) -> ObservedBindings {
        let queue_arn = |target: BenchTarget| {
            self.targets
                .get(&target)
                .map(|topology| topology.queue.queue_arn.clone())
        };
        ObservedBindings {
            node_queue: queue_arn(BenchTarget::Node),
            deno_queue: queue_arn(BenchTarget::Deno),
            bun_queue: queue_arn(BenchTarget::Bun),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyError {
    message: String,
}

impl TopologyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TopologyError {}
