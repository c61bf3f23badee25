pub mod debounce;
pub mod pipeline;
pub mod scheduler;
pub mod watcher;
