// ABOUTME: Host port range configuration for tenant storefronts.
// ABOUTME: Candidates run from base to base + range inclusive.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    pub base: u16,
    pub range: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        PortsConfig {
            base: 8081,
            range: 100,
        }
    }
}

impl PortsConfig {
    /// Last candidate port, or None if the range runs past 65535.
    pub fn last(&self) -> Option<u16> {
        self.base.checked_add(self.range)
    }

    /// Every candidate in ascending order.
    pub fn candidates(&self) -> impl Iterator<Item = u16> {
        let last = self.last().unwrap_or(u16::MAX);
        self.base..=last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_are_inclusive() {
        let ports = PortsConfig {
            base: 8081,
            range: 2,
        };
        assert_eq!(ports.candidates().collect::<Vec<_>>(), vec![8081, 8082, 8083]);
    }

    #[test]
    fn zero_range_has_single_candidate() {
        let ports = PortsConfig {
            base: 9000,
            range: 0,
        };
        assert_eq!(ports.candidates().count(), 1);
    }
}
