// SPDX-License-Identifier: CEPL-1.0
//! Swapchain negotiation: pure selection of image count, format, present
//! mode and extent from what the surface reports, plus the swapchain object
//! built from the result.

use apparatus_render::FramebufferSize;
use ash::khr::swapchain;
use ash::vk;
use tracing::{debug, info};

use crate::device::LogicalDevice;
use crate::driver::{DeviceApi, SurfaceApi};
use crate::error::{DriverCallError, SwapchainError};
use crate::instance::Instance;
use crate::queue::ResolvedQueueFamilies;
use crate::surface::Surface;

/// Double buffering.
pub const BASELINE_IMAGE_COUNT: u32 = 2;

/// `current_extent` dimension meaning "the swapchain decides the size".
pub const UNDEFINED_EXTENT: u32 = u32::MAX;

/// The preference rule applied to the surface's reported capabilities.
///
/// The default is the engine's configuration constant: `B8G8R8A8_SRGB` in
/// `SRGB_NONLINEAR`, FIFO presentation, and a baseline of two images. When
/// the preferred format/color-space pair isn't offered, the first reported
/// format is used; when the preferred present mode isn't offered, FIFO is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainPreferences {
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
    pub image_count: u32,
}

impl Default for SwapchainPreferences {
    fn default() -> Self {
        Self {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            present_mode: vk::PresentModeKHR::FIFO,
            image_count: BASELINE_IMAGE_COUNT,
        }
    }
}

/// The negotiated parameters. Every field is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainConfiguration {
    pub image_count: u32,
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
}

/// Raised to `min_image_count`; lowered to `max_image_count` only when the
/// maximum is bounded (non-zero).
pub fn select_image_count(caps: &vk::SurfaceCapabilitiesKHR, baseline: u32) -> u32 {
    if baseline < caps.min_image_count {
        caps.min_image_count
    } else if caps.max_image_count != 0 && baseline > caps.max_image_count {
        caps.max_image_count
    } else {
        baseline
    }
}

pub fn select_format(
    formats: &[vk::SurfaceFormatKHR],
    prefs: &SwapchainPreferences,
) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|f| f.format == prefs.format && f.color_space == prefs.color_space)
        .or_else(|| formats.first().copied())
}

pub fn select_present_mode(
    modes: &[vk::PresentModeKHR],
    preferred: vk::PresentModeKHR,
) -> vk::PresentModeKHR {
    if modes.contains(&preferred) {
        preferred
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The surface's current extent when it dictates one, otherwise the
/// window's framebuffer size clamped per dimension into the reported bounds.
pub fn select_extent<W>(caps: &vk::SurfaceCapabilitiesKHR, window: &W) -> vk::Extent2D
where
    W: FramebufferSize + ?Sized,
{
    if caps.current_extent.width != UNDEFINED_EXTENT {
        return caps.current_extent;
    }
    let size = window.framebuffer_size();
    // max-then-min rather than clamp: malformed bounds must not panic.
    vk::Extent2D {
        width: size
            .width
            .max(caps.min_image_extent.width)
            .min(caps.max_image_extent.width),
        height: size
            .height
            .max(caps.min_image_extent.height)
            .min(caps.max_image_extent.height),
    }
}

pub fn select_configuration<W>(
    caps: &vk::SurfaceCapabilitiesKHR,
    formats: &[vk::SurfaceFormatKHR],
    present_modes: &[vk::PresentModeKHR],
    window: &W,
    prefs: &SwapchainPreferences,
) -> Result<SwapchainConfiguration, SwapchainError>
where
    W: FramebufferSize + ?Sized,
{
    let surface_format = select_format(formats, prefs).ok_or(SwapchainError::NoSurfaceFormats)?;
    if present_modes.is_empty() {
        return Err(SwapchainError::NoPresentModes);
    }
    Ok(SwapchainConfiguration {
        image_count: select_image_count(caps, prefs.image_count),
        format: surface_format.format,
        color_space: surface_format.color_space,
        present_mode: select_present_mode(present_modes, prefs.present_mode),
        extent: select_extent(caps, window),
    })
}

/// Queries the surface for `device`'s physical device and negotiates.
pub fn negotiate<D, S, W>(
    device: &LogicalDevice<D>,
    surface: &S,
    window: &W,
    prefs: &SwapchainPreferences,
) -> Result<SwapchainConfiguration, SwapchainError>
where
    D: DeviceApi,
    S: SurfaceApi + ?Sized,
    W: FramebufferSize + ?Sized,
{
    let physical_device = device.physical_device();
    let caps = surface.capabilities(physical_device)?;
    let formats = surface.formats(physical_device)?;
    let present_modes = surface.present_modes(physical_device)?;
    let config = select_configuration(&caps, &formats, &present_modes, window, prefs)?;
    debug!("Negotiated swapchain configuration {:?}", config);
    Ok(config)
}

/// Exclusive ownership when one family does both jobs, otherwise images
/// are shared between the two families.
pub fn image_sharing(families: ResolvedQueueFamilies) -> (vk::SharingMode, Vec<u32>) {
    if families.is_combined() {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    } else {
        (vk::SharingMode::CONCURRENT, families.unique())
    }
}

/// The presentation chain. Destroy before the logical device and the
/// surface.
pub struct Swapchain {
    loader: swapchain::Device,
    handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    config: SwapchainConfiguration,
}

impl Swapchain {
    /// `old` is handed to the driver for resource reuse; the caller still
    /// destroys it afterwards.
    pub fn create(
        instance: &Instance,
        device: &LogicalDevice,
        surface: &Surface,
        config: SwapchainConfiguration,
        old: Option<&Swapchain>,
    ) -> Result<Self, SwapchainError> {
        const CALL: &str = "vkCreateSwapchainKHR";
        let raw_device = device.handle().ok_or(SwapchainError::DeviceClosed)?;
        let caps = surface.capabilities(device.physical_device())?;
        let loader = swapchain::Device::new(instance.live(CALL)?, raw_device);

        let (sharing_mode, family_indices) = image_sharing(device.families());
        let info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.raw_handle())
            .min_image_count(config.image_count)
            .image_format(config.format)
            .image_color_space(config.color_space)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(&family_indices)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true)
            .old_swapchain(old.map_or(vk::SwapchainKHR::null(), |o| o.handle));

        // SAFETY: device and surface are live and belong to the same instance.
        let handle = unsafe { loader.create_swapchain(&info, None) }
            .map_err(DriverCallError::from_call(CALL))?;
        // SAFETY: `handle` was just created by this loader.
        let images = match unsafe { loader.get_swapchain_images(handle) } {
            Ok(images) => images,
            Err(result) => {
                // SAFETY: nothing references the new swapchain yet.
                unsafe { loader.destroy_swapchain(handle, None) };
                return Err(DriverCallError::new("vkGetSwapchainImagesKHR", result).into());
            }
        };

        info!(
            "Swapchain ready ({}x{}, {:?}/{:?}, {:?}, {} images)",
            config.extent.width,
            config.extent.height,
            config.format,
            config.color_space,
            config.present_mode,
            images.len()
        );

        Ok(Self {
            loader,
            handle,
            images,
            config,
        })
    }

    pub fn raw_handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn configuration(&self) -> &SwapchainConfiguration {
        &self.config
    }

    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.handle == vk::SwapchainKHR::null() {
            return;
        }
        debug!("Dropping swapchain {:?}", self.handle);
        // SAFETY: non-null means not yet destroyed; the device is idle or
        // no work was ever submitted against these images.
        unsafe { self.loader.destroy_swapchain(self.handle, None) };
        self.handle = vk::SwapchainKHR::null();
        self.images.clear();
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.destroy();
    }
}
