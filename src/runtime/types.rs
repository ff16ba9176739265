// ABOUTME: Runtime type definitions for Docker and Podman.
// ABOUTME: Includes RuntimeType enum, RuntimeInfo struct and the runtime config section.

use serde::{Deserialize, Serialize};

/// The container runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    Podman,
}

impl RuntimeType {
    /// Compose front end shipped with the runtime's CLI.
    pub fn default_compose_command(&self) -> Vec<String> {
        vec![self.to_string(), "compose".to_string()]
    }
}

impl std::fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeType::Docker => write!(f, "docker"),
            RuntimeType::Podman => write!(f, "podman"),
        }
    }
}

/// Detected runtime information.
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    /// The type of runtime detected.
    pub runtime_type: RuntimeType,
    /// Path to the runtime socket.
    pub socket_path: String,
}

/// Configuration for explicit runtime override.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    /// Explicit runtime type (overrides auto-detection).
    pub runtime: Option<RuntimeType>,
    /// Explicit socket path (overrides default).
    pub socket: Option<String>,
    /// Compose invocation, e.g. `["docker-compose"]` (defaults per runtime).
    #[serde(default)]
    pub compose_command: Option<Vec<String>>,
}

impl RuntimeConfig {
    pub fn compose_command_for(&self, runtime: RuntimeType) -> Vec<String> {
        match &self.compose_command {
            Some(cmd) if !cmd.is_empty() => cmd.clone(),
            _ => runtime.default_compose_command(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_command_defaults_per_runtime() {
        let config = RuntimeConfig::default();
        assert_eq!(
            config.compose_command_for(RuntimeType::Podman),
            vec!["podman".to_string(), "compose".to_string()]
        );
    }

    #[test]
    fn explicit_compose_command_wins() {
        let config = RuntimeConfig {
            compose_command: Some(vec!["docker-compose".to_string()]),
            ..Default::default()
        };
        assert_eq!(
            config.compose_command_for(RuntimeType::Docker),
            vec!["docker-compose".to_string()]
        );
    }
}
