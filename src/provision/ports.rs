// ABOUTME: Host port allocation for tenant storefronts.
// ABOUTME: Skips ports published by running containers, then confirms with a bind probe.

use super::ProvisionError;
use crate::config::PortsConfig;
use crate::runtime::ContainerOps;
use std::collections::BTreeSet;
use std::net::{Ipv4Addr, TcpListener};
use std::sync::Arc;

/// Reports whether a port can currently be bound on the host.
pub type BindProbe = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// Bind and immediately release `port` on all interfaces.
pub fn bind_all_interfaces(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).is_ok()
}

pub fn default_bind_probe() -> BindProbe {
    Arc::new(bind_all_interfaces)
}

/// Finds a free port in `[base, base + range]`.
///
/// Callers serialize allocation and pass the ports already handed to
/// in-flight tenants as `reserved`. A foreign process can still take the
/// port before the stack starts.
pub struct PortAllocator<'a, R: ?Sized> {
    runtime: &'a R,
    ports: PortsConfig,
    bind: BindProbe,
    reserved: BTreeSet<u16>,
}

impl<'a, R> PortAllocator<'a, R>
where
    R: ContainerOps + ?Sized,
{
    pub fn new(runtime: &'a R, ports: PortsConfig, bind: BindProbe) -> Self {
        Self {
            runtime,
            ports,
            bind,
            reserved: BTreeSet::new(),
        }
    }

    pub fn with_reserved(mut self, reserved: impl IntoIterator<Item = u16>) -> Self {
        self.reserved.extend(reserved);
        self
    }

    pub async fn allocate(&self) -> Result<u16, ProvisionError> {
        let in_use = self.runtime.published_ports().await?;
        tracing::debug!(published = in_use.len(), "collected runtime port exclusions");

        for candidate in self.ports.candidates() {
            if in_use.contains(&candidate) {
                tracing::debug!(port = candidate, "port published by a container");
                continue;
            }
            if self.reserved.contains(&candidate) {
                tracing::debug!(port = candidate, "port reserved by an in-flight tenant");
                continue;
            }
            if (self.bind)(candidate) {
                tracing::debug!(port = candidate, "port allocated");
                return Ok(candidate);
            }
            tracing::debug!(port = candidate, "port bound by another process");
        }

        Err(ProvisionError::AllocationExhausted {
            base: self.ports.base,
            last: self.ports.last().unwrap_or(u16::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ContainerError, ContainerFilters, ContainerInfo, ContainerSummary};
    use crate::types::ContainerId;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    struct Published(Vec<u16>);

    #[async_trait]
    impl ContainerOps for Published {
        async fn inspect_container(
            &self,
            id: &ContainerId,
        ) -> Result<ContainerInfo, ContainerError> {
            Err(ContainerError::NotFound(id.to_string()))
        }

        async fn list_containers(
            &self,
            _filters: &ContainerFilters,
        ) -> Result<Vec<ContainerSummary>, ContainerError> {
            Ok(vec![ContainerSummary {
                id: ContainerId::new("abc"),
                name: "tenant1_shop".to_string(),
                image: "shop".to_string(),
                state: "running".to_string(),
                status: "Up".to_string(),
                labels: HashMap::new(),
                published_ports: self.0.clone(),
            }])
        }

        async fn stop_container(&self, _: &ContainerId, _: Duration) -> Result<(), ContainerError> {
            Ok(())
        }

        async fn remove_container(&self, _: &ContainerId, _: bool) -> Result<(), ContainerError> {
            Ok(())
        }
    }

    fn ports(base: u16, range: u16) -> PortsConfig {
        PortsConfig { base, range }
    }

    fn bound(taken: &[u16]) -> BindProbe {
        let taken: HashSet<u16> = taken.iter().copied().collect();
        Arc::new(move |port| !taken.contains(&port))
    }

    #[tokio::test]
    async fn skips_ports_published_by_containers() {
        let runtime = Published(vec![8081]);
        let allocator = PortAllocator::new(&runtime, ports(8081, 10), bound(&[]));
        assert_eq!(allocator.allocate().await.unwrap(), 8082);
    }

    #[tokio::test]
    async fn skips_ports_bound_on_the_host() {
        let runtime = Published(vec![]);
        let allocator = PortAllocator::new(&runtime, ports(8081, 10), bound(&[8081, 8082]));
        assert_eq!(allocator.allocate().await.unwrap(), 8083);
    }

    #[tokio::test]
    async fn skips_ports_reserved_for_in_flight_tenants() {
        let runtime = Published(vec![8081]);
        let allocator =
            PortAllocator::new(&runtime, ports(8081, 10), bound(&[])).with_reserved([8082]);
        assert_eq!(allocator.allocate().await.unwrap(), 8083);
    }

    #[tokio::test]
    async fn last_port_in_range_is_a_candidate() {
        let runtime = Published(vec![8081]);
        let allocator = PortAllocator::new(&runtime, ports(8081, 1), bound(&[]));
        assert_eq!(allocator.allocate().await.unwrap(), 8082);
    }

    #[tokio::test]
    async fn exhausted_range_is_an_error() {
        let runtime = Published(vec![8081]);
        let allocator = PortAllocator::new(&runtime, ports(8081, 1), bound(&[8082]));
        let err = allocator.allocate().await.unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::AllocationExhausted {
                base: 8081,
                last: 8082
            }
        ));
    }

    #[test]
    fn bind_probe_sees_a_held_listener() {
        let held = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
        let port = held.local_addr().unwrap().port();
        assert!(!bind_all_interfaces(port));
        drop(held);
    }
}
