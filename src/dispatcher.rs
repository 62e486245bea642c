/// Schedules work onto a designated thread, typically a host UI thread.
///
/// The settings object never runs platform code itself; it only hands tasks to
/// whatever dispatcher the host installed.
pub trait Dispatcher: Send + Sync {
    /// Queue `task` to run "soon" on the dispatcher's thread.
    fn run_async(&self, task: Box<dyn FnOnce() + Send + 'static>);
}

/// Runs every task immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn run_async(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        task();
    }
}
