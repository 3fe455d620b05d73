/// Verification pipeline
///
/// This module is responsible for:
/// - Fanning out one verification task per monitor
/// - Publishing tasks to a job service or in-process
/// - Probing a monitor and recording the outcome as a log
pub mod checker;
pub mod executor;
pub mod fanout;
pub mod publisher;
pub mod scheduler;

pub use checker::{Checker, HttpChecker, ProbeOutcome};
pub use executor::VerificationExecutor;
pub use fanout::{FailedTask, FanOutReport, VERIFY_TOPIC, VerificationFanOut};
pub use publisher::{HttpTaskPublisher, LocalTaskPublisher, Task, TaskPublisher};
pub use scheduler::FanOutScheduler;
