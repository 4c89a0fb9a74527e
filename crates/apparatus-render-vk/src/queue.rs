// SPDX-License-Identifier: CEPL-1.0
//! Queue family resolution. Both lookups are first-match in index order:
//! the lowest qualifying family wins even when a later family could serve
//! graphics and present together.

use ash::vk;

use crate::driver::{InstanceApi, QueueRequest, SurfaceApi};
use crate::error::{DriverCallError, IncompatibleDeviceError};

pub const QUEUE_PRIORITY: f32 = 1.0;

/// Lowest family index advertising graphics support.
pub fn find_graphics_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    families
        .iter()
        .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|index| index as u32)
}

/// Lowest family index that can present to `surface`.
pub fn find_present_family<S: SurfaceApi + ?Sized>(
    surface: &S,
    physical_device: vk::PhysicalDevice,
    family_count: usize,
) -> Result<Option<u32>, DriverCallError> {
    for index in 0..family_count as u32 {
        if surface.supports_present(physical_device, index)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Graphics and present families for one (physical device, surface) pair.
/// Either may be missing; check before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// Queries the family list once and resolves both roles against it.
    pub fn resolve<I, S>(
        instance: &I,
        surface: &S,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self, DriverCallError>
    where
        I: InstanceApi + ?Sized,
        S: SurfaceApi + ?Sized,
    {
        let families = instance.queue_family_properties(physical_device);
        Ok(Self {
            graphics: find_graphics_family(&families),
            present: find_present_family(surface, physical_device, families.len())?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    pub fn require(self) -> Result<ResolvedQueueFamilies, IncompatibleDeviceError> {
        match (self.graphics, self.present) {
            (Some(graphics), Some(present)) => Ok(ResolvedQueueFamilies { graphics, present }),
            (None, _) => Err(IncompatibleDeviceError::MissingGraphicsFamily),
            (_, None) => Err(IncompatibleDeviceError::MissingPresentFamily),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedQueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl ResolvedQueueFamilies {
    /// One family serves both roles.
    pub fn is_combined(&self) -> bool {
        self.graphics == self.present
    }

    /// Distinct family indices, graphics first.
    pub fn unique(&self) -> Vec<u32> {
        if self.is_combined() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// One single-queue request per distinct family. Vulkan rejects a device
/// whose create info names the same family twice.
pub fn queue_requests(families: ResolvedQueueFamilies) -> Vec<QueueRequest> {
    families
        .unique()
        .into_iter()
        .map(|family_index| QueueRequest {
            family_index,
            count: 1,
            priority: QUEUE_PRIORITY,
        })
        .collect()
}
