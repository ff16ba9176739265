// ABOUTME: Container runtime access for Docker and Podman.
// ABOUTME: Detection, the bollard API adapter, the compose driver and capability traits.

mod bollard;
mod compose;
mod detection;
mod error;
pub mod traits;
mod types;

pub use bollard::{BollardRuntime, ConnectError, connect_local};
pub use compose::ComposeCli;
pub use detection::{DetectionError, detect_local};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::*;
pub use types::{RuntimeConfig, RuntimeInfo, RuntimeType};
