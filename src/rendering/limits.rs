use crate::error::ConfigError;
use crate::simulation::{ParticleLayout, WORKGROUP_SIZE};

/// Number of workgroups needed to give every particle one invocation.
///
/// Invocations past `capacity` exit immediately inside the kernel.
pub fn dispatch_size(capacity: u32) -> u32 {
    capacity.div_ceil(WORKGROUP_SIZE)
}

/// Compute and buffer limits reported by the adapter, as far as this subsystem cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformLimits {
    pub max_workgroups_per_dimension: u32,
    pub max_workgroup_size_x: u32,
    pub max_invocations_per_workgroup: u32,
    pub max_buffer_size: u64,
    pub max_storage_binding_size: u64,
}

impl PlatformLimits {
    pub fn from_device(device: &wgpu::Device) -> Self {
        Self::from(&device.limits())
    }

    /// Rejects configurations the adapter cannot dispatch or store.
    pub fn check(&self, capacity: u32) -> Result<(), ConfigError> {
        let checks = [
            ("max_compute_workgroup_size_x", u64::from(WORKGROUP_SIZE), u64::from(self.max_workgroup_size_x)),
            (
                "max_compute_invocations_per_workgroup",
                u64::from(WORKGROUP_SIZE),
                u64::from(self.max_invocations_per_workgroup),
            ),
            (
                "max_compute_workgroups_per_dimension",
                u64::from(dispatch_size(capacity)),
                u64::from(self.max_workgroups_per_dimension),
            ),
            ("max_buffer_size", ParticleLayout::buffer_size(capacity), self.max_buffer_size),
            (
                "max_storage_buffer_binding_size",
                ParticleLayout::buffer_size(capacity),
                self.max_storage_binding_size,
            ),
        ];

        for (limit, requested, allowed) in checks {
            if requested > allowed {
                return Err(ConfigError::PlatformLimitExceeded {
                    limit,
                    requested,
                    allowed,
                });
            }
        }
        Ok(())
    }

    pub fn log(&self) {
        log::info!(
            "max compute workgroups per dimension = {}, max workgroup size x = {}, max invocations per workgroup = {}",
            self.max_workgroups_per_dimension,
            self.max_workgroup_size_x,
            self.max_invocations_per_workgroup
        );
        log::info!(
            "max buffer size = {} bytes, max storage binding size = {} bytes",
            self.max_buffer_size,
            self.max_storage_binding_size
        );
    }
}

impl From<&wgpu::Limits> for PlatformLimits {
    fn from(limits: &wgpu::Limits) -> Self {
        Self {
            max_workgroups_per_dimension: limits.max_compute_workgroups_per_dimension,
            max_workgroup_size_x: limits.max_compute_workgroup_size_x,
            max_invocations_per_workgroup: limits.max_compute_invocations_per_workgroup,
            max_buffer_size: limits.max_buffer_size,
            max_storage_binding_size: u64::from(limits.max_storage_buffer_binding_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_covers_every_particle() {
        assert_eq!(dispatch_size(1), 1);
        assert_eq!(dispatch_size(WORKGROUP_SIZE), 1);
        assert_eq!(dispatch_size(WORKGROUP_SIZE + 1), 2);
        assert_eq!(dispatch_size(1000), 1000u32.div_ceil(WORKGROUP_SIZE));
        for capacity in [1, 255, 256, 257, 1000, 65_536] {
            assert!(dispatch_size(capacity) * WORKGROUP_SIZE >= capacity);
            assert!((dispatch_size(capacity) - 1) * WORKGROUP_SIZE < capacity);
        }
    }

    #[test]
    fn default_limits_accept_typical_capacity() {
        let limits = PlatformLimits::from(&wgpu::Limits::default());
        assert_eq!(limits.check(100_000), Ok(()));
    }

    #[test]
    fn oversized_buffer_is_rejected() {
        let limits = PlatformLimits {
            max_workgroups_per_dimension: 65_535,
            max_workgroup_size_x: 256,
            max_invocations_per_workgroup: 256,
            max_buffer_size: 1024,
            max_storage_binding_size: 1024,
        };
        assert!(matches!(
            limits.check(100),
            Err(ConfigError::PlatformLimitExceeded {
                limit: "max_buffer_size",
                requested: 4800,
                allowed: 1024,
            })
        ));
    }

    #[test]
    fn narrow_workgroups_are_rejected() {
        let limits = PlatformLimits {
            max_workgroups_per_dimension: 65_535,
            max_workgroup_size_x: 128,
            max_invocations_per_workgroup: 128,
            max_buffer_size: u64::MAX,
            max_storage_binding_size: u64::MAX,
        };
        assert!(matches!(
            limits.check(1),
            Err(ConfigError::PlatformLimitExceeded {
                limit: "max_compute_workgroup_size_x",
                ..
            })
        ));
    }
}
