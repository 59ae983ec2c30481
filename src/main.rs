//! Desktop viewer for runst-render
//!
//! Opens a glutin/winit window, loads the configured shader and model
//! directories and draws one model spinning under a perspective camera, with a
//! streamed line sweeping around it.
//!
//! Usage: `runst-render [config.json] [model-name]`

use std::error::Error;
use std::num::NonZeroU32;
use std::time::Instant;

use glam::{Vec3, Vec4};
use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::DisplayBuilder;
use log::{error, info, warn};
use raw_window_handle::HasWindowHandle;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use runst_render::engine::components::shapes;
use runst_render::engine::{
    init_logging, AssetsManager, Camera, EngineConfig, LayerId, MeshHandle, MeshUsage,
    RenderLayer, Renderer,
};

const DEFAULT_CONFIG: &str = "config.json";
const DEFAULT_MODEL: &str = "cube";
const SHADER: &str = "basic";

struct Scene {
    renderer: Renderer,
    camera: Camera,
    layer: LayerId,
    model: Option<MeshHandle>,
    sweep: Option<MeshHandle>,
}

impl Scene {
    fn load(gl: &glow::Context, config: &EngineConfig, model: &str) -> Result<Self, Box<dyn Error>> {
        let mut assets = AssetsManager::new(config.assets.normal_mode);
        assets.initialize(gl, &config.assets)?;

        let mut renderer = Renderer::new(assets, config.window.clear_color);
        let layer = renderer.add_layer(RenderLayer::new("world"));
        let (world, assets) = renderer
            .layer_and_assets_mut(layer)
            .ok_or("world layer missing")?;

        let shader = assets
            .shader_id(SHADER)
            .ok_or_else(|| format!("shader {SHADER} was not found in {}", config.assets.shader_dir.display()))?;

        let model = match assets.create_mesh(gl, model, shader, MeshUsage::Static) {
            Some(mut mesh) => {
                if let Some(contract) = assets.shader(shader) {
                    mesh.set_param(contract, "color", Vec4::new(0.85, 0.55, 0.25, 1.0))?;
                }
                Some(world.register(assets, mesh)?)
            }
            None => None,
        };

        let sweep = {
            let contract = assets.shader(shader).ok_or("shader vanished")?;
            let mut line = shapes::line("sweep", Vec3::ZERO, Vec3::X * 2.0, 0.05).with_shader(shader);
            line.init(gl, contract, MeshUsage::Stream)?;
            line.set_param(contract, "color", Vec4::new(0.3, 0.8, 1.0, 0.6))?;
            Some(world.register(assets, line)?)
        };

        let mut camera = Camera::new(Vec3::new(0.0, 1.5, 4.0));
        camera.look_at(Vec3::ZERO);

        Ok(Self {
            renderer,
            camera,
            layer,
            model,
            sweep,
        })
    }

    fn update(&mut self, gl: &glow::Context, elapsed: f32) {
        let Some((world, _)) = self.renderer.layer_and_assets_mut(self.layer) else {
            return;
        };

        if let Some(mesh) = self.model.and_then(|handle| world.mesh_mut(handle)) {
            mesh.transform_mut().set_rotation(Vec3::new(elapsed * 15.0, elapsed * 40.0, 0.0));
        }

        if let Some(line) = self.sweep.and_then(|handle| world.mesh_mut(handle)) {
            let end = Vec3::new(elapsed.cos(), elapsed.sin(), 0.0) * 2.0;
            if let Err(err) = shapes::update_line(line, gl, Vec3::ZERO, end, 0.05) {
                warn!("Sweep update failed: {}", err);
            }
        }
    }
}

struct Graphics {
    window: Window,
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    gl: glow::Context,
    scene: Scene,
}

struct App {
    config: EngineConfig,
    model: String,
    graphics: Option<Graphics>,
    start_time: Instant,
}

impl App {
    fn create_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics, Box<dyn Error>> {
        let window_config = &self.config.window;
        let window = event_loop.create_window(
            Window::default_attributes()
                .with_title(window_config.title.as_str())
                .with_inner_size(LogicalSize::new(window_config.width, window_config.height)),
        )?;

        let template = ConfigTemplateBuilder::new().with_depth_size(24);
        let (_, gl_config) = DisplayBuilder::new().build(event_loop, template, |configs| {
            configs
                .reduce(|best, next| if next.num_samples() > best.num_samples() { next } else { best })
                .expect("no OpenGL config matches the template")
        })?;

        let display = gl_config.display();
        let raw_handle = window.window_handle()?.as_raw();
        let ctx_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_handle));
        let not_current = unsafe { display.create_context(&gl_config, &ctx_attrs)? };

        let size = window.inner_size();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_handle,
            NonZeroU32::new(size.width.max(1)).unwrap_or(NonZeroU32::MIN),
            NonZeroU32::new(size.height.max(1)).unwrap_or(NonZeroU32::MIN),
        );
        let gl_surface = unsafe { display.create_window_surface(&gl_config, &attrs)? };
        let gl_context = not_current.make_current(&gl_surface)?;

        if window_config.vsync {
            if let Err(err) = gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN)) {
                warn!("Could not enable vsync: {}", err);
            }
        }

        let gl = unsafe { glow::Context::from_loader_function_cstr(|s| display.get_proc_address(s)) };

        let mut scene = Scene::load(&gl, &self.config, &self.model)?;
        scene.renderer.resize(&gl, size.width, size.height);

        Ok(Graphics {
            window,
            gl_context,
            gl_surface,
            gl,
            scene,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }

        match self.create_graphics(event_loop) {
            Ok(graphics) => {
                graphics.window.request_redraw();
                self.graphics = Some(graphics);
                info!("Renderer ready");
            }
            Err(err) => {
                error!("Failed to start renderer: {}", err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(graphics) = self.graphics.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                graphics.scene.renderer.cleanup(&graphics.gl);
                self.graphics = None;
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
                    graphics.gl_surface.resize(&graphics.gl_context, width, height);
                    graphics.scene.renderer.resize(&graphics.gl, size.width, size.height);
                }
                graphics.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let elapsed = self.start_time.elapsed().as_secs_f32();
                graphics.scene.update(&graphics.gl, elapsed);

                let scene = &mut graphics.scene;
                scene.renderer.render_frame(&graphics.gl, &scene.camera);

                if let Err(err) = graphics.gl_surface.swap_buffers(&graphics.gl_context) {
                    error!("Failed to swap buffers: {}", err);
                }
                graphics.window.request_redraw();
            }

            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let model = args.next().unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let config = EngineConfig::load(&config_path)?;
    init_logging(config.log_filter.as_deref());
    info!("Starting runst-render with model {}", model);

    let event_loop = EventLoop::new()?;
    let mut app = App {
        config,
        model,
        graphics: None,
        start_time: Instant::now(),
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}
