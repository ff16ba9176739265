// ABOUTME: In-memory container runtime with scripted health, exec output and stack results.
// ABOUTME: Records every call so tests can assert on ordering.

use async_trait::async_trait;
use futures::{Stream, StreamExt, stream};
use parking_lot::Mutex;
use shopstack::runtime::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, ExecConfig, ExecError, ExecOps, ExecResult, HealthState, LogError, LogLine,
    LogOps, LogOptions, LogStream, StackError, StackFile, StackOps, StackOutput,
};
use shopstack::types::ContainerId;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::pin::Pin;
use std::time::Duration;

/// Replays queued values; the last one repeats forever.
#[derive(Debug, Clone)]
struct Script<T: Clone> {
    queue: VecDeque<T>,
}

impl<T: Clone> Script<T> {
    fn new(values: Vec<T>) -> Self {
        Self {
            queue: values.into(),
        }
    }

    fn next(&mut self) -> Option<T> {
        if self.queue.len() > 1 {
            self.queue.pop_front()
        } else {
            self.queue.front().cloned()
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExecReply {
    Stdout(String),
    ExitCode(i64),
    NotRunning,
}

#[derive(Default)]
pub struct FakeRuntime {
    published: Mutex<BTreeSet<u16>>,
    health: Mutex<HashMap<String, Script<HealthState>>>,
    exec: Mutex<HashMap<String, Script<ExecReply>>>,
    up_failure: Mutex<Option<String>>,
    logs: Mutex<HashMap<String, Vec<String>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, port: u16) {
        self.published.lock().insert(port);
    }

    /// Health states reported for `container`, one per inspect.
    pub fn script_health(&self, container: &str, states: Vec<HealthState>) {
        self.health
            .lock()
            .insert(container.to_string(), Script::new(states));
    }

    /// Replies for commands whose program is `program` (e.g. "ls", "find").
    pub fn script_exec(&self, program: &str, replies: Vec<ExecReply>) {
        self.exec
            .lock()
            .insert(program.to_string(), Script::new(replies));
    }

    pub fn fail_up(&self, stderr: &str) {
        *self.up_failure.lock() = Some(stderr.to_string());
    }

    pub fn script_logs(&self, container: &str, lines: &[&str]) {
        self.logs.lock().insert(
            container.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        self.record(format!("inspect {id}"));
        let health = self
            .health
            .lock()
            .get_mut(id.as_str())
            .and_then(Script::next)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        Ok(ContainerInfo {
            id: id.clone(),
            name: id.to_string(),
            image: "fake:latest".to_string(),
            state: ContainerState::Running,
            health: Some(health),
            labels: HashMap::new(),
        })
    }

    async fn list_containers(
        &self,
        _filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let published = self.published.lock().clone();
        Ok(published
            .into_iter()
            .map(|port| ContainerSummary {
                id: ContainerId::new(format!("other_{port}")),
                name: format!("other_{port}"),
                image: "nginx:latest".to_string(),
                state: "running".to_string(),
                status: "Up".to_string(),
                labels: HashMap::new(),
                published_ports: vec![port],
            })
            .collect())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        self.record(format!("stop {id}"));
        Err(ContainerError::NotFound(id.to_string()))
    }

    async fn remove_container(&self, id: &ContainerId, _force: bool) -> Result<(), ContainerError> {
        self.record(format!("remove {id}"));
        Err(ContainerError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl ExecOps for FakeRuntime {
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError> {
        let program = config.cmd.first().cloned().unwrap_or_default();
        self.record(format!("exec {container} {program}"));

        let reply = self.exec.lock().get_mut(&program).and_then(Script::next);
        match reply {
            Some(ExecReply::Stdout(out)) => Ok(ExecResult {
                exit_code: 0,
                stdout: out.into_bytes(),
                stderr: Vec::new(),
            }),
            Some(ExecReply::ExitCode(code)) => Ok(ExecResult {
                exit_code: code,
                stdout: Vec::new(),
                stderr: b"command failed".to_vec(),
            }),
            Some(ExecReply::NotRunning) | None => {
                Err(ExecError::ContainerNotRunning(container.to_string()))
            }
        }
    }
}

#[async_trait]
impl LogOps for FakeRuntime {
    async fn container_logs(
        &self,
        id: &ContainerId,
        _opts: &LogOptions,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<LogLine, LogError>> + Send>>, LogError> {
        let lines = self
            .logs
            .lock()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| LogError::ContainerNotFound(id.to_string()))?;

        Ok(stream::iter(lines.into_iter().map(|content| {
            Ok(LogLine {
                content,
                stream: LogStream::Stdout,
            })
        }))
        .boxed())
    }
}

#[async_trait]
impl StackOps for FakeRuntime {
    async fn stack_up(
        &self,
        stack: &StackFile,
        _timeout: Duration,
    ) -> Result<StackOutput, StackError> {
        self.record(format!("up {}", stack.project));
        if let Some(stderr) = self.up_failure.lock().clone() {
            return Err(StackError::Failed {
                status: "exit status: 1".to_string(),
                stderr,
            });
        }
        Ok(StackOutput::default())
    }

    async fn stack_down(
        &self,
        stack: &StackFile,
        _timeout: Duration,
    ) -> Result<StackOutput, StackError> {
        self.record(format!("down {}", stack.project));
        Ok(StackOutput::default())
    }
}
