// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{CString, NulError};

use ash::vk;
use thiserror::Error;

/// A Vulkan entry point returned something other than `VK_SUCCESS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{call} failed: {result}")]
pub struct DriverCallError {
    pub call: &'static str,
    pub result: vk::Result,
}

impl DriverCallError {
    pub const fn new(call: &'static str, result: vk::Result) -> Self {
        Self { call, result }
    }

    /// Returns a closure suitable for `map_err` on a `VkResult`.
    pub(crate) fn from_call(call: &'static str) -> impl Fn(vk::Result) -> Self {
        move |result| Self::new(call, result)
    }
}

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("Couldn't load the Vulkan library: {0}")]
    Loader(#[from] ash::LoadingError),
    #[error("Couldn't get display handle: {0}")]
    DisplayHandle(raw_window_handle::HandleError),
    #[error("Application name contains an interior NUL: {0}")]
    InvalidName(#[from] NulError),
    #[error("Required instance extension {0:?} is not supported")]
    UnsupportedExtension(CString),
    #[error("Validation layer {0:?} is not supported")]
    UnsupportedLayer(CString),
    #[error(transparent)]
    Driver(#[from] DriverCallError),
}

#[derive(Debug, Error)]
pub enum SurfaceCreationError {
    #[error("Couldn't get display handle: {0}")]
    InvalidDisplayHandle(raw_window_handle::HandleError),
    #[error("Couldn't get window handle: {0}")]
    InvalidWindowHandle(raw_window_handle::HandleError),
    #[error(transparent)]
    Driver(#[from] DriverCallError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IncompatibleDeviceError {
    #[error("No physical device was supplied")]
    NullPhysicalDevice,
    #[error("Physical device has no queue family supporting graphics")]
    MissingGraphicsFamily,
    #[error("Physical device has no queue family able to present to the surface")]
    MissingPresentFamily,
}

#[derive(Debug, Error)]
pub enum DeviceCreationError {
    #[error("Incompatible physical device: {0}")]
    Incompatible(#[from] IncompatibleDeviceError),
    #[error(transparent)]
    Driver(#[from] DriverCallError),
}

#[derive(Debug, Error)]
pub enum SwapchainError {
    #[error("Surface reports no supported formats for this device")]
    NoSurfaceFormats,
    #[error("Surface reports no supported present modes for this device")]
    NoPresentModes,
    #[error("Logical device has already been destroyed")]
    DeviceClosed,
    #[error(transparent)]
    Driver(#[from] DriverCallError),
}

#[derive(Debug, Error)]
pub enum BringUpError {
    #[error("Instance creation failed: {0}")]
    Instance(#[from] InstanceError),
    #[error("Diagnostics messenger creation failed: {0}")]
    Diagnostics(DriverCallError),
    #[error("Surface creation failed: {0}")]
    Surface(#[from] SurfaceCreationError),
    #[error("Physical device selection failed: {0}")]
    Selection(DriverCallError),
    #[error("Logical device creation failed: {0}")]
    Device(#[from] DeviceCreationError),
    #[error("Swapchain setup failed: {0}")]
    Swapchain(#[from] SwapchainError),
}
