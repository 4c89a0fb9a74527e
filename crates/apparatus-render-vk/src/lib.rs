// SPDX-License-Identifier: CEPL-1.0
//! Vulkan bring-up for a single window: instance and diagnostics, surface,
//! physical device selection, logical device and swapchain negotiation.
#![deny(unsafe_op_in_unsafe_fn)]

mod context;
mod debug;
mod device;
mod driver;
mod error;
mod instance;
mod queue;
mod selector;
mod surface;
mod swapchain;
mod util;

#[cfg(test)]
mod fake;

pub use ash;

pub use context::{ContextConfig, GraphicsContext};
pub use debug::{DebugCategory, DebugMessenger, DebugSeverity};
pub use device::LogicalDevice;
pub use driver::{DeviceApi, DeviceRequest, InstanceApi, QueueRequest, SurfaceApi};
pub use error::{
    BringUpError, DeviceCreationError, DriverCallError, IncompatibleDeviceError, InstanceError,
    SurfaceCreationError, SwapchainError,
};
pub use instance::{Instance, InstanceConfig, VALIDATION_LAYER};
pub use queue::{
    find_graphics_family, find_present_family, queue_requests, QueueFamilyIndices,
    ResolvedQueueFamilies, QUEUE_PRIORITY,
};
pub use selector::{find_suitable_device, is_device_suitable, REQUIRED_DEVICE_EXTENSIONS};
pub use surface::Surface;
pub use swapchain::{
    image_sharing, negotiate, select_configuration, select_extent, select_format,
    select_image_count, select_present_mode, Swapchain, SwapchainConfiguration,
    SwapchainPreferences, BASELINE_IMAGE_COUNT, UNDEFINED_EXTENT,
};
