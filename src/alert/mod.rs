pub mod engine;
pub mod rules;
pub mod sink;

pub use engine::{evaluate_alerts, AlertEvent};
pub use rules::AlertEventKind;
pub use sink::{AlertSink, StdoutSink, WebhookSink};
