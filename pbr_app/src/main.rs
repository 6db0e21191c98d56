//! PBR demo application
//!
//! Loads an OBJ model (or generates a sphere), places it on a textured floor
//! under a couple of lights, and renders with the PBR engine. WASD moves the
//! camera, dragging the left mouse button looks around, arrow keys adjust
//! exposure and gamma, T cycles the tone operator, Esc quits.

use glfw::{Action, Key, MouseButton, WindowEvent};

use pbr_engine::assets::{checker_texture, ObjLoader};
use pbr_engine::config::AppConfig;
use pbr_engine::foundation::logging;
use pbr_engine::foundation::math::{Quat, Vec3};
use pbr_engine::foundation::time::Timer;
use pbr_engine::geometry::Geometry;
use pbr_engine::material::{LightingMaterial, PbrMaterial};
use pbr_engine::renderer::{Renderer, ToneOperator};
use pbr_engine::rhi::{shader, GlowBackend, RenderInterface, SamplerDesc};
use pbr_engine::scene::{Camera, Light, Scene, Shape};
use pbr_engine::window::Window;

const CONFIG_PATH: &str = "pbr_app.toml";
const MODEL_PATH: &str = "resources/model.obj";

const MOVE_SPEED: f32 = 6.0;
const LOOK_SPEED: f32 = 0.004;
const MODEL_SPIN: f32 = 0.3;

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Keys and mouse state carried between events and the update step
#[derive(Default)]
struct InputState {
    forward: bool,
    back: bool,
    left: bool,
    right: bool,
    dragging: bool,
    cursor: Option<(f64, f64)>,
}

struct PbrApp {
    window: Window,
    rhi: RenderInterface,
    renderer: Renderer,
    scene: Scene,
    camera: Camera,
    input: InputState,
    timer: Timer,
    title: String,
    spin: f32,
}

impl PbrApp {
    fn new(config: &AppConfig) -> AppResult<Self> {
        let mut window = Window::new(&config.window)?;

        let mut rhi = RenderInterface::new(Box::new(GlowBackend::new(window.load_gl())));
        rhi.initialize()?;
        let (width, height) = window.framebuffer_size();
        rhi.set_viewport(width, height);

        let mut renderer = Renderer::new(&config.renderer);
        renderer.prepare(&mut rhi)?;

        let camera = Camera::new(
            Vec3::new(-3.0, 3.0, -3.0),
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
            60.0,
            window.aspect_ratio(),
            0.1,
            500.0,
        );

        let mut scene = build_scene(&mut rhi)?;
        scene.add_camera(camera.clone());

        Ok(Self {
            window,
            rhi,
            renderer,
            scene,
            camera,
            input: InputState::default(),
            timer: Timer::new(),
            title: config.window.title.clone(),
            spin: 0.0,
        })
    }

    fn run(&mut self) -> AppResult<()> {
        while !self.window.should_close() {
            self.timer.update();
            let dt = self.timer.delta_time();

            self.window.poll_events();
            let events: Vec<(f64, WindowEvent)> = self.window.flush_events().collect();
            for (_, event) in events {
                self.handle_event(&event);
            }

            self.update(dt);

            if let Err(e) = self.renderer.render(&mut self.rhi, &self.scene, &self.camera) {
                log::error!("frame error: {e}");
            }
            self.window.swap_buffers();

            if self.timer.frame_count() % 120 == 0 {
                let title = format!("{} - {:.1} fps", self.title, self.timer.average_fps());
                self.window.set_title(&title);
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &WindowEvent) {
        match *event {
            WindowEvent::Key(key, _, action, _) => self.handle_key(key, action),
            WindowEvent::MouseButton(MouseButton::Button1, action, _) => {
                self.input.dragging = action != Action::Release;
                if !self.input.dragging {
                    self.input.cursor = None;
                }
            }
            WindowEvent::CursorPos(x, y) => {
                if self.input.dragging {
                    if let Some((last_x, last_y)) = self.input.cursor {
                        let dx = (x - last_x) as f32;
                        let dy = (y - last_y) as f32;
                        self.camera
                            .update_orientation(-dy * LOOK_SPEED, dx * LOOK_SPEED);
                    }
                    self.input.cursor = Some((x, y));
                }
            }
            WindowEvent::FramebufferSize(width, height) => {
                self.rhi.set_viewport(width.max(0) as u32, height.max(0) as u32);
                self.camera.set_aspect_ratio(self.window.aspect_ratio());
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: Key, action: Action) {
        let pressed = action != Action::Release;
        match key {
            Key::W => self.input.forward = pressed,
            Key::S => self.input.back = pressed,
            Key::A => self.input.left = pressed,
            Key::D => self.input.right = pressed,
            Key::Escape if pressed => self.window.set_should_close(true),
            Key::Up if pressed => self.adjust_exposure(1.25),
            Key::Down if pressed => self.adjust_exposure(0.8),
            Key::Right if pressed => self.adjust_gamma(0.1),
            Key::Left if pressed => self.adjust_gamma(-0.1),
            Key::T if action == Action::Press => self.cycle_tone_operator(),
            _ => {}
        }
    }

    fn adjust_exposure(&mut self, factor: f32) {
        let exposure = (self.renderer.exposure() * factor).clamp(0.05, 20.0);
        self.renderer.set_exposure(exposure);
        log::info!("exposure: {exposure:.2}");
    }

    fn adjust_gamma(&mut self, delta: f32) {
        let gamma = (self.renderer.gamma() + delta).clamp(1.0, 4.0);
        self.renderer.set_gamma(gamma);
        log::info!("gamma: {gamma:.2}");
    }

    fn cycle_tone_operator(&mut self) {
        let next = match self.renderer.tone_operator() {
            ToneOperator::Simple => ToneOperator::Reinhard,
            ToneOperator::Reinhard => ToneOperator::Uncharted,
            ToneOperator::Uncharted => ToneOperator::Simple,
        };
        self.renderer.set_tone_operator(next);
        log::info!("tone operator: {next:?}");
    }

    fn update(&mut self, dt: f32) {
        let mut direction = Vec3::zeros();
        if self.input.forward {
            direction += self.camera.front();
        }
        if self.input.back {
            direction -= self.camera.front();
        }
        if self.input.right {
            direction += self.camera.right();
        }
        if self.input.left {
            direction -= self.camera.right();
        }
        if direction.norm() > 0.0 {
            let position = self.camera.position() + direction.normalize() * MOVE_SPEED * dt;
            self.camera.set_position(position);
        }

        // Slow turntable on the model (shape 0)
        self.spin += MODEL_SPIN * dt;
        if let Some(model) = self.scene.shapes_mut().first_mut() {
            model.set_rotation(Quat::from_axis_angle(&Vec3::y_axis(), self.spin));
            model.update_matrix();
        }
    }
}

/// Model (OBJ if present, sphere otherwise) on a textured floor with a point
/// and a directional light
fn build_scene(rhi: &mut RenderInterface) -> AppResult<Scene> {
    let mut scene = Scene::new();

    let pbr_program = rhi
        .builtin_program(shader::builtin::PBR)
        .ok_or("built-in pbr program missing")?;
    let tex_program = rhi
        .builtin_program(shader::builtin::LIGHTING_TEX)
        .ok_or("built-in lighting_tex program missing")?;

    let mut model_geometry = if std::path::Path::new(MODEL_PATH).exists() {
        ObjLoader::load(MODEL_PATH)?
    } else {
        log::info!("no model at '{MODEL_PATH}', generating a sphere");
        Geometry::uv_sphere(1.0, 48, 32)
    };
    rhi.upload_geometry(&mut model_geometry)?;

    let mut material = PbrMaterial::new(pbr_program);
    material.set_metallic(0.9);
    material.set_roughness(0.35);
    let mut model = Shape::new(model_geometry, Box::new(material));
    model.set_scale(0.75, 0.75, 0.75);
    model.update_matrix();
    scene.add_shape(model);

    let checker = rhi.create_texture(
        &checker_texture(8, 32, [230, 230, 230, 255], [60, 60, 60, 255]),
        &SamplerDesc::default(),
    )?;
    let mut floor_geometry = Geometry::plane(50.0, 50.0);
    rhi.upload_geometry(&mut floor_geometry)?;
    let mut floor = Shape::new(
        floor_geometry,
        Box::new(LightingMaterial::with_texture(tex_program, checker)),
    );
    floor.set_position(Vec3::new(0.0, -3.0, 0.0));
    floor.update_matrix();
    scene.add_shape(floor);

    scene.add_light(Light::point(
        Vec3::new(4.0, 4.0, -4.0),
        Vec3::new(1.0, 0.96, 0.9),
        40.0,
        30.0,
    ));
    scene.add_light(Light::directional(
        Vec3::new(-0.3, -1.0, -0.2),
        Vec3::new(0.9, 0.9, 1.0),
        2.0,
    ));

    Ok(scene)
}

fn main() {
    logging::init_with_default("info");

    let config = AppConfig::load_or_default(CONFIG_PATH);
    let result = PbrApp::new(&config).and_then(|mut app| app.run());

    // Process-exit policy lives here, not in the engine
    if let Err(e) = result {
        log::error!("fatal: {e}");
        std::process::exit(1);
    }
}
