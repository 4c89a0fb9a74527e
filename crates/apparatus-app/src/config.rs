// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use apparatus_render::RenderSize;
use apparatus_render_vk::ash::vk;
use apparatus_render_vk::{
    ContextConfig, DebugSeverity, InstanceConfig, SwapchainPreferences, BASELINE_IMAGE_COUNT,
};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppCfg {
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub graphics: GraphicsCfg,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WindowCfg {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowCfg {
    fn default() -> Self {
        WindowCfg {
            title: "apparatus".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl WindowCfg {
    pub fn size(&self) -> RenderSize {
        RenderSize::new(self.width, self.height)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GraphicsCfg {
    pub app_name: String,
    pub validation: bool,
    pub debug_severity: SeverityCfg,
    pub present_mode: PresentModeCfg,
    pub surface_format: SurfaceFormatCfg,
    pub color_space: ColorSpaceCfg,
}

impl Default for GraphicsCfg {
    fn default() -> Self {
        GraphicsCfg {
            app_name: "Apparatus".to_string(),
            validation: cfg!(debug_assertions),
            debug_severity: SeverityCfg::default(),
            present_mode: PresentModeCfg::default(),
            surface_format: SurfaceFormatCfg::default(),
            color_space: ColorSpaceCfg::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeverityCfg {
    Verbose,
    Info,
    #[default]
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeCfg {
    #[default]
    Fifo,
    FifoRelaxed,
    Mailbox,
    Immediate,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceFormatCfg {
    #[default]
    Bgra8Srgb,
    Rgba8Srgb,
    Bgra8Unorm,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpaceCfg {
    #[default]
    SrgbNonlinear,
}

impl From<SeverityCfg> for DebugSeverity {
    fn from(s: SeverityCfg) -> Self {
        match s {
            SeverityCfg::Verbose => DebugSeverity::Verbose,
            SeverityCfg::Info => DebugSeverity::Info,
            SeverityCfg::Warning => DebugSeverity::Warning,
            SeverityCfg::Error => DebugSeverity::Error,
        }
    }
}

impl From<PresentModeCfg> for vk::PresentModeKHR {
    fn from(m: PresentModeCfg) -> Self {
        match m {
            PresentModeCfg::Fifo => vk::PresentModeKHR::FIFO,
            PresentModeCfg::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
            PresentModeCfg::Mailbox => vk::PresentModeKHR::MAILBOX,
            PresentModeCfg::Immediate => vk::PresentModeKHR::IMMEDIATE,
        }
    }
}

impl From<SurfaceFormatCfg> for vk::Format {
    fn from(f: SurfaceFormatCfg) -> Self {
        match f {
            SurfaceFormatCfg::Bgra8Srgb => vk::Format::B8G8R8A8_SRGB,
            SurfaceFormatCfg::Rgba8Srgb => vk::Format::R8G8B8A8_SRGB,
            SurfaceFormatCfg::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
        }
    }
}

impl From<ColorSpaceCfg> for vk::ColorSpaceKHR {
    fn from(c: ColorSpaceCfg) -> Self {
        match c {
            ColorSpaceCfg::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }
}

impl AppCfg {
    /// A missing file means defaults; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} not found, using defaults", path.display());
                return Ok(AppCfg::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        let cfg = toml::from_str::<AppCfg>(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        debug!("loaded {}: {:?}", path.display(), cfg);
        Ok(cfg)
    }

    pub fn context_config(&self) -> ContextConfig {
        let g = &self.graphics;
        ContextConfig {
            instance: InstanceConfig {
                app_name: g.app_name.clone(),
                validation: g.validation,
                min_severity: g.debug_severity.into(),
            },
            swapchain: SwapchainPreferences {
                format: g.surface_format.into(),
                color_space: g.color_space.into(),
                present_mode: g.present_mode.into(),
                image_count: BASELINE_IMAGE_COUNT,
            },
        }
    }
}
