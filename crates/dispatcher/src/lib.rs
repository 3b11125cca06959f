//! # Dispatcher
//!
//! 消息分发与排队核心。
//!
//! 负责：
//! - 串行消费 `Payload`，惰性创建每个 source 的有界队列
//! - 队列满时丢弃新消息并继续运行
//! - 原子地取出某个 source 的全部消息

pub mod dispatcher;
pub mod handle;
pub mod metrics;
pub mod queue;
pub mod table;

pub use contracts::{ContractError, Message, Payload, SourceId};
pub use dispatcher::{create_relay, DispatchOutcome, Dispatcher};
pub use handle::RelayHandle;
pub use metrics::{MetricsSnapshot, RelayMetrics};
pub use queue::{QueueFull, SourceQueue};
pub use table::QueueTable;
