pub mod jobs;
pub mod notifier;
pub mod poller;
pub mod scheduler;

pub use jobs::{NotificationJob, NotificationKind};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use poller::ChangeNotifier;
pub use scheduler::PollScheduler;
