use runtime_bench_core::contract::SendReceipt;

pub trait TriggerQueue {
    fn resolve_queue_url(&self, queue_name: &str) -> Result<String, String>;

    fn send_trigger(
        &self,
        queue_url: &str,
        body: &str,
        delay_seconds: Option<u32>,
    ) -> Result<SendReceipt, String>;
}
