pub mod monitor;
pub mod notifier;
pub mod reporter;

pub use monitor::{CheckStatus, JobCheck, Monitor, MonitorReport};
pub use notifier::{NoopNotifier, Notifier, WebhookNotifier};
pub use reporter::{health_path, HealthReporter, RunCounts, HEALTH_ROOT, SYSTEM_HEALTH_PATH};
