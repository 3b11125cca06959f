//! 中继指标记录模块
//!
//! 通过 `metrics` facade 上报；未安装 recorder 时所有调用都是空操作。

use metrics::{counter, gauge, histogram};

/// 记录一次被提交接口接受的 payload
pub fn record_payload_submitted() {
    counter!("relay_payloads_submitted_total").increment(1);
}

/// 记录入队成功，`depth` 为入队后的队列长度
pub fn record_message_enqueued(depth: usize) {
    counter!("relay_messages_enqueued_total").increment(1);
    histogram!("relay_queue_depth").record(depth as f64);
}

/// 记录因队列已满被丢弃的消息
pub fn record_message_dropped() {
    counter!("relay_messages_dropped_total").increment(1);
}

/// 记录一次拉取取出的消息数
pub fn record_messages_drained(count: usize) {
    counter!("relay_messages_drained_total").increment(count as u64);
    histogram!("relay_drain_batch_size").record(count as f64);
}

/// 记录当前已知的 source 数量
pub fn record_source_count(sources: usize) {
    gauge!("relay_sources").set(sources as f64);
}

/// 记录被限流拒绝的请求
pub fn record_request_throttled(route: &'static str) {
    counter!("relay_requests_throttled_total", "route" => route).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_payload_submitted();
        record_message_enqueued(3);
        record_message_dropped();
        record_messages_drained(2);
        record_source_count(1);
        record_request_throttled("ingest");
    }
}
