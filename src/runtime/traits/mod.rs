// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ContainerOps, ExecOps, LogOps and StackOps plus the ContainerRuntime bundle.

mod container;
mod exec;
mod logs;
mod shared_types;
mod stack;

pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use exec::{ExecError, ExecOps};
pub use logs::{LogError, LogLine, LogOps, LogOptions, LogStream};
pub use shared_types::*;
pub use stack::{StackError, StackFile, StackOps, StackOutput};

/// Everything the provisioning pipeline needs from a runtime.
///
/// Implemented automatically for any type providing all four capabilities,
/// so test doubles only implement the capability traits.
pub trait ContainerRuntime: ContainerOps + ExecOps + LogOps + StackOps {}

impl<T> ContainerRuntime for T where T: ContainerOps + ExecOps + LogOps + StackOps {}
