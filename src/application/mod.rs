pub mod fanout;
pub mod orchestrator;
pub mod payments;
pub mod report;
pub mod scheduler;
pub mod watcher;
