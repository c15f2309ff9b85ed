use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use sitepipe::dag::Task;
use sitepipe::errors::{PipelineError, Result};
use sitepipe::exec::ExecutorBackend;

/// A fake executor that:
/// - records which tasks were "run", in order
/// - fails the tasks named in `failing` with a `SubprocessError`
/// - never finishes the tasks named in `hanging`.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            executed,
            failing: HashSet::new(),
            hanging: HashSet::new(),
        }
    }

    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }

    pub fn hanging(mut self, task: &str) -> Self {
        self.hanging.insert(task.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl ExecutorBackend for FakeExecutor {
    fn execute<'a>(
        &'a mut self,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        let executed = Arc::clone(&self.executed);
        let fail = self.failing.contains(&task.name);
        let hang = self.hanging.contains(&task.name);

        Box::pin(async move {
            executed.lock().unwrap().push(task.name.clone());
            if hang {
                std::future::pending::<()>().await;
            }
            if fail {
                return Err(PipelineError::SubprocessError {
                    cmd: format!("fake {}", task.name),
                    code: 1,
                    output: String::new(),
                });
            }
            Ok(())
        })
    }
}
