//! Native application shell: drives a [`World`] from a winit event loop.
//!
//! The shell owns the window and the async runtime. It creates the GPU
//! surface, composes the world around it, forwards resize and mouse events,
//! pumps one world frame per redraw, and spawns the configured asset loads
//! so they run concurrently with the frame loop.

use std::sync::Arc;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{render::GpuSurface, world::World};

/// What the shell should load once the world is up.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    /// Window title; a default is used when empty.
    pub title: String,
    /// glTF model to load and spin, if any.
    pub model: Option<String>,
    /// Environment map to use as scene lighting, if any.
    pub environment: Option<String>,
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: AppConfig,
    window: Option<Arc<Window>>,
    world: Option<World>,
}

impl App {
    fn new(config: AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            config,
            window: None,
            world: None,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let title = if self.config.title.is_empty() {
            "stagecraft"
        } else {
            &self.config.title
        };
        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes().with_title(title))
                .unwrap(),
        );

        let surface = match self.async_runtime.block_on(GpuSurface::new(window.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("cannot create the render surface: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let mut world = World::new(Box::new(surface));
        let size = window.inner_size();
        world.resize(size.width, size.height);
        world.start();

        let loader = world.assets();
        let model = self.config.model.clone();
        let environment = self.config.environment.clone();
        self.async_runtime.spawn(async move {
            let gltf = async {
                match &model {
                    Some(path) => loader.load_gltf(path).await,
                    None => Ok(()),
                }
            };
            let background = async {
                match &environment {
                    Some(path) => loader.load_background(path).await,
                    None => Ok(()),
                }
            };
            // The loads run concurrently with each other and the frame loop.
            if let Err(e) = futures::future::try_join(gltf, background).await {
                log::error!("asset load failed: {e}");
            }
        });

        window.request_redraw();
        self.window = Some(window);
        self.world = Some(world);
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(world) = &mut self.world else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            world.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(world) = &mut self.world else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                world.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => world.resize(size.width, size.height),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Right,
                ..
            } => {
                world.set_orbiting(state.is_pressed());
            }
            WindowEvent::RedrawRequested => {
                world.frame(Instant::now());
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Build the event loop, window and world, and run until close.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
