pub mod dispatch;
pub mod workload;
