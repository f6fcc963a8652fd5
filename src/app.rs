use std::sync::Arc;

use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::menu::{MenuCommand, PetMenu};
use crate::pet::tuning::Tuning;
use crate::pet::{
    PetController, PetRequest, PetState, PointerButton, TickContext, PET_HEIGHT, PET_WIDTH,
};
use crate::render::instance::ShapeInstance;
use crate::render::{scene, GpuState};

/// Target simulation tick rate (seconds per tick).
const TICK_RATE: f64 = 0.030;
/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// How often to log frame stats (seconds).
const FPS_LOG_INTERVAL: f64 = 5.0;
/// Initial inset from the bottom-right corner of the primary screen.
const START_INSET_X: f32 = 120.0;
const START_INSET_Y: f32 = 180.0;

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    last_log_time: Instant,
    frame_time_sum: f64,
    frames_since_log: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            last_log_time: Instant::now(),
            frame_time_sum: 0.0,
            frames_since_log: 0,
        }
    }

    fn record_frame(&mut self, dt: f64) {
        self.frame_count += 1;
        self.frames_since_log += 1;
        self.frame_time_sum += dt;

        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        if elapsed >= FPS_LOG_INTERVAL {
            let avg_ms = (self.frame_time_sum / self.frames_since_log as f64) * 1000.0;
            let fps = self.frames_since_log as f64 / elapsed;
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | total frames: {}",
                fps,
                avg_ms,
                self.frame_count,
            );
            self.last_log_time = Instant::now();
            self.frame_time_sum = 0.0;
            self.frames_since_log = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state.
struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,

    // Simulation
    pet: PetController,

    // Context menu
    menu: PetMenu,

    // RNG (shared, deterministic per session)
    rng: fastrand::Rng,

    // Fixed timestep
    last_frame_time: Option<Instant>,
    accumulator: f64,
    tick_count: u64,

    // Frame timing
    frame_stats: FrameStats,

    // Screen dimensions
    screen_w: f32,
    screen_h: f32,

    // Last cursor position relative to the window origin.
    cursor_in_window: Vec2,

    // Reusable instance buffer (avoid per-frame allocation)
    instance_buf: Vec<ShapeInstance>,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            gpu: None,
            pet: PetController::new(Vec2::ZERO, Tuning::default()),
            menu: PetMenu::new(),
            rng: fastrand::Rng::new(),
            last_frame_time: None,
            accumulator: 0.0,
            tick_count: 0,
            frame_stats: FrameStats::new(),
            screen_w: 0.0,
            screen_h: 0.0,
            cursor_in_window: Vec2::ZERO,
            instance_buf: Vec::with_capacity(crate::render::pipeline::MAX_INSTANCES),
        }
    }

    /// Global cursor position in screen pixels.
    fn global_cursor(&self) -> Vec2 {
        #[cfg(windows)]
        {
            let (x, y) = crate::platform::win32::get_mouse_pos();
            Vec2::new(x, y)
        }
        #[cfg(not(windows))]
        {
            // Best effort: last position seen over our own window.
            self.pet.position() + self.cursor_in_window
        }
    }

    /// Run fixed-timestep simulation ticks.
    fn run_fixed_update(&mut self, dt: f64) {
        self.accumulator += dt;

        if self.accumulator > MAX_ACCUMULATOR {
            self.accumulator = MAX_ACCUMULATOR;
        }

        // Query the cursor once per frame (not per tick)
        let ctx = TickContext {
            screen_w: self.screen_w,
            screen_h: self.screen_h,
            cursor: self.global_cursor(),
        };

        while self.accumulator >= TICK_RATE {
            self.pet
                .tick((TICK_RATE * 1000.0) as f32, &ctx, &mut self.rng);

            self.accumulator -= TICK_RATE;
            self.tick_count += 1;
        }
    }

    fn apply_menu_command(&mut self, cmd: MenuCommand, event_loop: &ActiveEventLoop) {
        match cmd {
            MenuCommand::Follow => self.pet.set_behavior(PetState::Follow),
            MenuCommand::Idle => self.pet.set_behavior(PetState::Idle),
            MenuCommand::Sleep => self.pet.set_behavior(PetState::Sleep),
            MenuCommand::Exit => {
                log::info!("Exit chosen from menu");
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .expect("no monitor found");
        let screen_size = monitor.size();
        self.screen_w = screen_size.width as f32;
        self.screen_h = screen_size.height as f32;

        // Park the pet near the bottom-right corner to start.
        let start = Vec2::new(
            self.screen_w - PET_WIDTH - START_INSET_X,
            self.screen_h - PET_HEIGHT - START_INSET_Y,
        );
        self.pet = PetController::new(start, Tuning::default());

        // A small borderless transparent window that IS the pet. Start
        // hidden so DWM doesn't cache stale frame state before our overlay
        // style changes take effect.
        let attrs = WindowAttributes::default()
            .with_title("DeskPal")
            .with_decorations(false)
            .with_visible(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                PET_WIDTH as u32,
                PET_HEIGHT as u32,
            ))
            .with_position(winit::dpi::PhysicalPosition::new(
                start.x as i32,
                start.y as i32,
            ));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("failed to create window"),
        );

        #[cfg(windows)]
        crate::platform::win32::setup_overlay(&window);

        log::info!(
            "Pet window created at ({:.0}, {:.0}) on {:?} ({}x{})",
            start.x,
            start.y,
            monitor.name().unwrap_or_default(),
            screen_size.width,
            screen_size.height,
        );

        // Initialize wgpu + pet pipeline
        let gpu = GpuState::new(window.clone());
        self.gpu = Some(gpu);
        log::info!("wgpu + pet pipeline initialized");

        // Continuous loop; the fixed-timestep accumulator paces the sim.
        event_loop.set_control_flow(ControlFlow::Poll);

        // Show window now that all styles and GPU resources are ready.
        window.set_visible(true);

        self.window = Some(window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_in_window = Vec2::new(position.x as f32, position.y as f32);
                let global = self.pet.position() + self.cursor_in_window;
                self.pet.pointer_moved(global);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pointer = match button {
                    MouseButton::Left => Some(PointerButton::Primary),
                    MouseButton::Right => Some(PointerButton::Secondary),
                    _ => None,
                };
                let Some(pointer) = pointer else { return };

                match state {
                    ElementState::Pressed => {
                        let global = self.pet.position() + self.cursor_in_window;
                        if let Some(PetRequest::MenuRequested) =
                            self.pet.pointer_pressed(pointer, global)
                        {
                            self.menu.show(global.x as i32, global.y as i32);
                        }
                    }
                    ElementState::Released => {
                        self.pet.pointer_released(pointer);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                // --- Timing ---
                let now = Instant::now();
                if let Some(last) = self.last_frame_time {
                    let dt = now.duration_since(last).as_secs_f64();

                    self.frame_stats.record_frame(dt);

                    // Fixed timestep sim
                    self.run_fixed_update(dt);
                }
                self.last_frame_time = Some(now);

                // --- Menu commands ---
                if let Some(cmd) = self.menu.poll() {
                    self.apply_menu_command(cmd, event_loop);
                }

                // --- Build the shape list from the pet snapshot ---
                self.instance_buf.clear();
                scene::build_scene(&self.pet.view(), &mut self.instance_buf);

                // --- Render ---
                if let Some(gpu) = &mut self.gpu {
                    gpu.update_instances(&self.instance_buf);
                    if let Some(mut frame) = gpu.begin_frame() {
                        gpu.draw_pet(&mut frame.encoder, &frame.view);
                        gpu.finish_frame(frame.encoder, frame.output);
                    }
                }

                // --- Move the OS window to the pet's position ---
                if let Some(w) = &self.window {
                    let pos = self.pet.position();
                    w.set_outer_position(winit::dpi::PhysicalPosition::new(
                        pos.x.round() as i32,
                        pos.y.round() as i32,
                    ));
                }
            }
            _ => {}
        }
    }
}

/// Entry point — create event loop and run.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}
