// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
mod config;

use std::path::PathBuf;

use anyhow::Result;
use apparatus_core::init_tracing;
use apparatus_platform::Window;
use apparatus_render::PresentationWindow;
use apparatus_render_vk::GraphicsContext;
use clap::Parser;
use tracing::{error, info, warn};

use apparatus_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::WindowId,
};

use config::AppCfg;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "apparatus.toml")]
    config: PathBuf,
    /// Disable validation layers regardless of the config file
    #[arg(long)]
    no_validation: bool,
}

struct App {
    cfg: AppCfg,
    // Declared before `window`: the surface must go before the native window.
    graphics: Option<GraphicsContext>,
    window: Option<Window>,
}

impl App {
    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        self.graphics = None;
        self.window = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if self.window.is_some() {
            return;
        }

        let window = match Window::create(
            event_loop,
            &self.cfg.window.title,
            self.cfg.window.size(),
        ) {
            Ok(window) => window,
            Err(e) => {
                error!("{e:#}");
                event_loop.exit();
                return;
            }
        };

        match GraphicsContext::new(&window, &self.cfg.context_config()) {
            Ok(Some(graphics)) => {
                let c = graphics.configuration();
                info!(
                    "swapchain: {}x{} {:?}/{:?} {:?}, {} images",
                    c.extent.width,
                    c.extent.height,
                    c.format,
                    c.color_space,
                    c.present_mode,
                    c.image_count
                );
                self.graphics = Some(graphics);
                self.window = Some(window);
            }
            Ok(None) => {
                error!("no compatible GPU found");
                self.window = Some(window);
                self.shut_down(event_loop);
            }
            Err(e) => {
                error!("graphics bring-up failed: {e}");
                self.window = Some(window);
                self.shut_down(event_loop);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = &mut self.window else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                window.request_close();
            }

            WindowEvent::Resized(new_size) => {
                info!("Resized → {}x{}", new_size.width, new_size.height);
                if let Some(graphics) = &mut self.graphics {
                    if let Err(e) = graphics.resize(&*window) {
                        warn!("swapchain rebuild failed: {e}");
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.as_ref().is_some_and(|w| w.should_close()) {
            self.shut_down(event_loop);
        }
    }
}

fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();
    info!("apparatus {}", env!("CARGO_PKG_VERSION"));

    let mut cfg = AppCfg::load(&args.config)?;
    if args.no_validation {
        cfg.graphics.validation = false;
    }

    let event_loop: EventLoop<()> = EventLoop::new()?;
    let mut app = App {
        cfg,
        graphics: None,
        window: None,
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}
