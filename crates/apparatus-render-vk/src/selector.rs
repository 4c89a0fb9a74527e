// SPDX-License-Identifier: CEPL-1.0
//! Physical device selection: first device in enumeration order that
//! passes every suitability check. No ranking.

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::driver::{InstanceApi, SurfaceApi};
use crate::error::DriverCallError;
use crate::queue::QueueFamilyIndices;
use crate::util::first_missing;

/// Device extensions a selected device must support and the logical device
/// enables.
pub const REQUIRED_DEVICE_EXTENSIONS: &[&CStr] = &[ash::khr::swapchain::NAME];

/// Returns `Ok(None)` when nothing qualifies, including when the instance
/// exposes no physical devices at all.
pub fn find_suitable_device<I, S>(
    instance: &I,
    surface: &S,
) -> Result<Option<vk::PhysicalDevice>, DriverCallError>
where
    I: InstanceApi + ?Sized,
    S: SurfaceApi + ?Sized,
{
    let candidates = instance.enumerate_physical_devices()?;
    if candidates.is_empty() {
        warn!("No Vulkan physical devices visible");
        return Ok(None);
    }

    for physical_device in candidates {
        if is_device_suitable(instance, surface, physical_device)? {
            info!(
                "Selected physical device: {}",
                instance.device_name(physical_device)
            );
            return Ok(Some(physical_device));
        }
    }
    warn!("No physical device passed the suitability checks");
    Ok(None)
}

pub fn is_device_suitable<I, S>(
    instance: &I,
    surface: &S,
    physical_device: vk::PhysicalDevice,
) -> Result<bool, DriverCallError>
where
    I: InstanceApi + ?Sized,
    S: SurfaceApi + ?Sized,
{
    let supported = instance.device_extension_names(physical_device)?;
    if let Some(missing) = first_missing(REQUIRED_DEVICE_EXTENSIONS, &supported) {
        debug!(
            "Rejecting {}: missing device extension {:?}",
            instance.device_name(physical_device),
            missing
        );
        return Ok(false);
    }

    if surface.formats(physical_device)?.is_empty()
        || surface.present_modes(physical_device)?.is_empty()
    {
        debug!(
            "Rejecting {}: no surface formats or present modes",
            instance.device_name(physical_device)
        );
        return Ok(false);
    }

    let families = QueueFamilyIndices::resolve(instance, surface, physical_device)?;
    if !families.is_complete() {
        debug!(
            "Rejecting {}: queue families {:?}",
            instance.device_name(physical_device),
            families
        );
        return Ok(false);
    }

    Ok(true)
}
