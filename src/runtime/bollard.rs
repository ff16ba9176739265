// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Supports both Docker and Podman via Docker-compatible API; stacks go through compose.

use crate::runtime::compose::ComposeCli;
use crate::runtime::traits::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, ExecConfig, ExecError, ExecOps, ExecResult, HealthState, LogError, LogLine,
    LogOps, LogOptions, LogStream, StackError, StackFile, StackOps, StackOutput,
};
use crate::runtime::types::{RuntimeConfig, RuntimeInfo, RuntimeType};
use crate::types::{ContainerId, ExecId};
use async_trait::async_trait;
use bollard::Docker;
use bollard::exec::StartExecOptions;
use bollard::query_parameters::{
    InspectContainerOptions, ListContainersOptions, LogsOptions, RemoveContainerOptions,
    StopContainerOptions,
};
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

/// How often a Podman exec is re-inspected while its output stream is open.
const EXEC_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Grace period for draining buffered exec output after the process exited.
const EXEC_DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Errors while connecting to a runtime socket.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("cannot open runtime socket: {0}")]
    Socket(String),

    #[error("runtime did not answer ping: {0}")]
    Ping(String),
}

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_container_stop_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::NotRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_exec_create_error(e: bollard::errors::Error) -> ExecError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ExecError::ContainerNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ExecError::ContainerNotRunning(message.clone()),
        _ => ExecError::Runtime(e.to_string()),
    }
}

fn map_exec_error(e: bollard::errors::Error) -> ExecError {
    ExecError::Runtime(e.to_string())
}

fn map_log_error(e: bollard::errors::Error) -> LogError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => LogError::ContainerNotFound(message.clone()),
        _ => LogError::StreamError(e.to_string()),
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard for containers and a
/// compose front end for stacks.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
    compose: ComposeCli,
}

impl BollardRuntime {
    /// Create a new BollardRuntime from a Docker client.
    pub fn new(client: Docker, runtime_type: RuntimeType, compose: ComposeCli) -> Self {
        Self {
            client,
            runtime_type,
            compose,
        }
    }

    /// Connect to a container runtime using detected runtime info.
    pub fn connect(info: &RuntimeInfo, compose: ComposeCli) -> Result<Self, ConnectError> {
        let client =
            Docker::connect_with_unix(&info.socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| ConnectError::Socket(e.to_string()))?;
        Ok(Self::new(client, info.runtime_type, compose))
    }

    /// Get the runtime type (Docker or Podman).
    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    /// Check the runtime answers on its socket.
    pub async fn ping(&self) -> Result<(), ConnectError> {
        self.client
            .ping()
            .await
            .map_err(|e| ConnectError::Ping(e.to_string()))?;
        Ok(())
    }

    async fn exec_create(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError> {
        let opts = bollard::models::ExecConfig {
            cmd: Some(config.cmd.clone()),
            env: if config.env.is_empty() {
                None
            } else {
                Some(config.env.clone())
            },
            working_dir: config.working_dir.clone(),
            user: config.user.clone(),
            attach_stdin: Some(false),
            attach_stdout: Some(config.attach_stdout),
            attach_stderr: Some(config.attach_stderr),
            tty: Some(false),
            ..Default::default()
        };

        let response = self
            .client
            .create_exec(container.as_str(), opts)
            .await
            .map_err(map_exec_create_error)?;

        Ok(ExecId::new(response.id))
    }

    /// Start an exec instance attached and collect its output.
    ///
    /// Podman can leave the attached stream open after the process exits, so
    /// for Podman the exec is re-inspected periodically and collection stops
    /// once it is no longer running.
    async fn exec_start(&self, exec_id: &ExecId) -> Result<ExecResult, ExecError> {
        let opts = StartExecOptions {
            detach: false,
            ..Default::default()
        };

        let started = self
            .client
            .start_exec(exec_id.as_str(), Some(opts))
            .await
            .map_err(map_exec_error)?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        if let bollard::exec::StartExecResults::Attached { mut output, .. } = started {
            let watch_exit = self.runtime_type == RuntimeType::Podman;
            let mut ticker = tokio::time::interval(EXEC_POLL_INTERVAL);

            loop {
                tokio::select! {
                    item = output.next() => match item {
                        Some(Ok(bollard::container::LogOutput::StdOut { message })) => {
                            stdout.extend(message);
                        }
                        Some(Ok(bollard::container::LogOutput::StdErr { message })) => {
                            stderr.extend(message);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(ExecError::Failed(e.to_string())),
                        None => break,
                    },
                    _ = ticker.tick(), if watch_exit => {
                        if !self.exec_running(exec_id).await? {
                            while let Ok(Some(Ok(item))) =
                                tokio::time::timeout(EXEC_DRAIN_GRACE, output.next()).await
                            {
                                match item {
                                    bollard::container::LogOutput::StdOut { message } => {
                                        stdout.extend(message)
                                    }
                                    bollard::container::LogOutput::StdErr { message } => {
                                        stderr.extend(message)
                                    }
                                    _ => {}
                                }
                            }
                            break;
                        }
                    }
                }
            }
        }

        let details = self
            .client
            .inspect_exec(exec_id.as_str())
            .await
            .map_err(map_exec_error)?;

        Ok(ExecResult {
            exit_code: details.exit_code.unwrap_or(0),
            stdout,
            stderr,
        })
    }

    async fn exec_running(&self, exec_id: &ExecId) -> Result<bool, ExecError> {
        let details = self
            .client
            .inspect_exec(exec_id.as_str())
            .await
            .map_err(map_exec_error)?;
        Ok(details.running.unwrap_or(false))
    }
}

/// Detect the local runtime and connect to it, verifying it answers.
pub async fn connect_local(
    config: &RuntimeConfig,
) -> Result<BollardRuntime, crate::runtime::RuntimeError> {
    let info = crate::runtime::detect_local(Some(config))?;
    tracing::info!(
        runtime = %info.runtime_type,
        socket = %info.socket_path,
        "connecting to container runtime"
    );

    let compose = ComposeCli::new(config.compose_command_for(info.runtime_type));
    let runtime = BollardRuntime::connect(&info, compose)?;
    runtime.ping().await?;
    Ok(runtime)
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_container_not_found_error)?;

        let state = details
            .state
            .as_ref()
            .and_then(|s| s.status)
            .map(|s| match s {
                bollard::models::ContainerStateStatusEnum::CREATED => ContainerState::Created,
                bollard::models::ContainerStateStatusEnum::RUNNING => ContainerState::Running,
                bollard::models::ContainerStateStatusEnum::PAUSED => ContainerState::Paused,
                bollard::models::ContainerStateStatusEnum::RESTARTING => ContainerState::Restarting,
                bollard::models::ContainerStateStatusEnum::REMOVING => ContainerState::Removing,
                bollard::models::ContainerStateStatusEnum::EXITED => ContainerState::Exited,
                bollard::models::ContainerStateStatusEnum::DEAD => ContainerState::Dead,
                _ => ContainerState::Exited,
            })
            .unwrap_or(ContainerState::Exited);

        let health = details
            .state
            .as_ref()
            .and_then(|s| s.health.as_ref())
            .and_then(|h| h.status)
            .map(|s| match s {
                bollard::models::HealthStatusEnum::STARTING => HealthState::Starting,
                bollard::models::HealthStatusEnum::HEALTHY => HealthState::Healthy,
                bollard::models::HealthStatusEnum::UNHEALTHY => HealthState::Unhealthy,
                _ => HealthState::None,
            });

        Ok(ContainerInfo {
            id: id.clone(),
            name: details
                .name
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image: details
                .config
                .as_ref()
                .and_then(|c| c.image.clone())
                .unwrap_or_default(),
            state,
            health,
            labels: details.config.and_then(|c| c.labels).unwrap_or_default(),
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();

        if let Some(ref name) = filters.name {
            filter_map.insert("name".to_string(), vec![name.clone()]);
        }

        for (key, value) in &filters.labels {
            filter_map
                .entry("label".to_string())
                .or_default()
                .push(format!("{}={}", key, value));
        }

        let opts = ListContainersOptions {
            all: filters.all,
            filters: Some(filter_map),
            ..Default::default()
        };

        // Podman reports "stopping" as a container state during shutdown, but bollard
        // doesn't recognize it and fails deserialization. Retry after a short delay
        // since "stopping" is a transient state.
        let mut last_error = None;
        for attempt in 0..3 {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => {
                    return Ok(containers
                        .into_iter()
                        .map(|c| {
                            let name = c
                                .names
                                .unwrap_or_default()
                                .first()
                                .map(|n| n.trim_start_matches('/').to_string())
                                .unwrap_or_default();

                            let state = c
                                .state
                                .map(|s| format!("{:?}", s).to_lowercase())
                                .unwrap_or_default();

                            let published_ports = c
                                .ports
                                .unwrap_or_default()
                                .into_iter()
                                .filter_map(|p| p.public_port)
                                .collect();

                            ContainerSummary {
                                id: ContainerId::new(c.id.unwrap_or_default()),
                                name,
                                image: c.image.unwrap_or_default(),
                                state,
                                status: c.status.unwrap_or_default(),
                                labels: c.labels.unwrap_or_default(),
                                published_ports,
                            }
                        })
                        .collect());
                }
                Err(e) => {
                    let err_str = e.to_string();
                    if (err_str.contains("unknown variant `stopping`")
                        || err_str.contains("unknown variant `stopped`"))
                        && attempt < 2
                    {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        last_error = Some(err_str);
                        continue;
                    }
                    return Err(ContainerError::Runtime(err_str));
                }
            }
        }

        Err(ContainerError::Runtime(
            last_error.unwrap_or_else(|| "list_containers failed".to_string()),
        ))
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(timeout.as_secs() as i32),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_stop_error)
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            v: true,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_not_found_error)
    }
}

#[async_trait]
impl ExecOps for BollardRuntime {
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError> {
        let run = async {
            let exec_id = self.exec_create(container, config).await?;
            self.exec_start(&exec_id).await
        };

        match config.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| ExecError::TimedOut(limit))?,
            None => run.await,
        }
    }
}

#[async_trait]
impl LogOps for BollardRuntime {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<LogLine, LogError>> + Send>>, LogError> {
        let log_opts = LogsOptions {
            stdout: opts.stdout,
            stderr: opts.stderr,
            follow: opts.follow,
            timestamps: opts.timestamps,
            tail: opts
                .tail
                .map(|n| n.to_string())
                .unwrap_or_else(|| "all".to_string()),
            ..Default::default()
        };

        let stream = self.client.logs(id.as_str(), Some(log_opts));

        let mapped_stream = stream.map(|result| {
            result
                .map(|output| {
                    let (stream_type, data) = match output {
                        bollard::container::LogOutput::StdErr { message } => {
                            (LogStream::Stderr, message)
                        }
                        bollard::container::LogOutput::StdOut { message }
                        | bollard::container::LogOutput::StdIn { message }
                        | bollard::container::LogOutput::Console { message } => {
                            (LogStream::Stdout, message)
                        }
                    };

                    LogLine {
                        content: String::from_utf8_lossy(&data).to_string(),
                        stream: stream_type,
                    }
                })
                .map_err(map_log_error)
        });

        Ok(Box::pin(mapped_stream))
    }
}

#[async_trait]
impl StackOps for BollardRuntime {
    async fn stack_up(
        &self,
        stack: &StackFile,
        timeout: Duration,
    ) -> Result<StackOutput, StackError> {
        self.compose.stack_up(stack, timeout).await
    }

    async fn stack_down(
        &self,
        stack: &StackFile,
        timeout: Duration,
    ) -> Result<StackOutput, StackError> {
        self.compose.stack_down(stack, timeout).await
    }
}
