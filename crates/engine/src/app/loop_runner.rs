use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use super::input::{InputAction, InputState};
use super::scene::SceneRuntime;
use super::{InputSnapshot, Renderer, Scene, SceneCommand, SceneWorld, VirtualPad};

pub const MAX_FPS_ENV_VAR: &str = "ROAM_MAX_FPS";
pub const SHOW_HITBOXES_ENV_VAR: &str = "ROAM_SHOW_HITBOXES";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    /// Window size is the scene size times this factor.
    pub window_scale: u32,
    pub max_frame_delta: Duration,
    pub max_render_fps: Option<u32>,
    pub text_reveal_delay: Duration,
    pub pad_repeat_interval: Duration,
    pub show_hitboxes: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Roam".to_string(),
            window_scale: 1,
            max_frame_delta: Duration::from_millis(250),
            max_render_fps: Some(60),
            text_reveal_delay: Duration::from_millis(30),
            pad_repeat_interval: Duration::from_millis(100),
            show_hitboxes: false,
        }
    }
}

impl LoopConfig {
    /// Applies `ROAM_MAX_FPS` and `ROAM_SHOW_HITBOXES`. Unreadable or
    /// invalid values are logged and the configured value is kept.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(cap) = read_env_override(MAX_FPS_ENV_VAR, parse_render_fps_cap) {
            self.max_render_fps = cap;
        }
        if let Some(show) = read_env_override(SHOW_HITBOXES_ENV_VAR, parse_flag) {
            self.show_hitboxes = show;
        }
        self
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("scene has empty bounds {width}x{height}")]
    EmptyScene { width: u32, height: u32 },
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Runs `scene` until the window closes. One simulation tick per rendered
/// frame. `asset_root` resolves dialog image refs.
pub fn run_app(
    config: LoopConfig,
    scene: Box<dyn Scene>,
    asset_root: PathBuf,
) -> Result<(), AppError> {
    let mut runtime = SceneRuntime::new(
        scene,
        SceneWorld::default().with_show_hitboxes(config.show_hitboxes),
    );
    runtime.load();
    let (scene_width, scene_height) = runtime.world().bounds();
    if scene_width == 0 || scene_height == 0 {
        runtime.shutdown();
        return Err(AppError::EmptyScene {
            width: scene_width,
            height: scene_height,
        });
    }
    info!(
        width = scene_width,
        height = scene_height,
        obstacle_count = runtime.world().obstacles().len(),
        marker_count = runtime.world().markers().len(),
        "scene_loaded"
    );

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window_scale = config.window_scale.max(1);
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(scene_width.saturating_mul(window_scale)),
                f64::from(scene_height.saturating_mul(window_scale)),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), scene_width, scene_height, asset_root)
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut pad = VirtualPad::new(scene_width, scene_height, config.pad_repeat_interval);
    let mut input_collector = InputCollector::default();

    info!(
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        text_reveal_delay_ms = config.text_reveal_delay.as_millis() as u64,
        pad_repeat_interval_ms = config.pad_repeat_interval.as_millis() as u64,
        show_hitboxes = config.show_hitboxes,
        "loop_config"
    );

    let started = Instant::now();
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor(renderer.window_to_scene(position.x, position.y));
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.handle_cursor_left(&mut pad);
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state, &mut pad);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    let frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);

                    input_collector.advance_pad(&mut pad, frame_dt);
                    let input_snapshot = input_collector.snapshot_for_tick(frame_dt);
                    match runtime.update(&input_snapshot) {
                        SceneCommand::ReleaseHeldButtons => {
                            if let Some(action) = input_collector.release_pad(&mut pad) {
                                debug!(action = ?action, "virtual_pad_released");
                            }
                        }
                        SceneCommand::None => {}
                    }

                    // Single authoritative FPS cap sleep point for render pacing.
                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let elapsed = Instant::now().saturating_duration_since(started);
                    let cursor = input_collector.cursor();
                    let drawn = renderer.render_world(runtime.world(), &pad, cursor, elapsed);
                    if let Err(error) = drawn {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = compose_title(&config.window_title, runtime.debug_title());
                    if last_applied_title.as_deref() != Some(next_title.as_str()) {
                        window.set_title(&next_title);
                        last_applied_title = Some(next_title);
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                runtime.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Turns window events into per-tick input. Held actions persist until an
/// explicit release; the dismiss edge lasts exactly one snapshot.
#[derive(Debug, Default)]
struct InputCollector {
    actions: InputState,
    dismiss_pressed_edge: bool,
    cursor_scene_px: Option<(i32, i32)>,
    left_mouse_is_down: bool,
}

impl InputCollector {
    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        self.handle_key(
            logical_key_name(&key_event.logical_key),
            key_event.state,
            key_event.repeat,
        );
    }

    fn handle_key(&mut self, key_name: Option<&str>, state: ElementState, repeat: bool) {
        let is_pressed = state == ElementState::Pressed;
        if is_pressed && !repeat {
            self.dismiss_pressed_edge = true;
        }
        if let Some(action) = key_name.and_then(InputAction::from_key_name) {
            self.actions.set(action, is_pressed);
        }
    }

    fn set_cursor(&mut self, cursor_scene_px: Option<(i32, i32)>) {
        self.cursor_scene_px = cursor_scene_px;
    }

    fn cursor(&self) -> Option<(i32, i32)> {
        self.cursor_scene_px
    }

    fn handle_cursor_left(&mut self, pad: &mut VirtualPad) {
        self.cursor_scene_px = None;
        self.left_mouse_is_down = false;
        self.release_pad(pad);
    }

    fn handle_mouse_input(
        &mut self,
        button: MouseButton,
        state: ElementState,
        pad: &mut VirtualPad,
    ) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    self.dismiss_pressed_edge = true;
                    if let Some((x, y)) = self.cursor_scene_px {
                        pad.press_at(x, y, &mut self.actions);
                    }
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => {
                self.left_mouse_is_down = false;
                self.release_pad(pad);
            }
        }
    }

    fn advance_pad(&mut self, pad: &mut VirtualPad, frame_dt: Duration) {
        pad.advance(frame_dt, &mut self.actions);
    }

    fn release_pad(&mut self, pad: &mut VirtualPad) -> Option<InputAction> {
        pad.release(&mut self.actions)
    }

    fn snapshot_for_tick(&mut self, frame_dt: Duration) -> InputSnapshot {
        let snapshot = InputSnapshot::new(self.actions, self.dismiss_pressed_edge, frame_dt);
        self.dismiss_pressed_edge = false;
        snapshot
    }
}

fn logical_key_name(key: &Key) -> Option<&str> {
    match key {
        Key::Character(text) => Some(text.as_str()),
        Key::Named(NamedKey::ArrowUp) => Some("ArrowUp"),
        Key::Named(NamedKey::ArrowDown) => Some("ArrowDown"),
        Key::Named(NamedKey::ArrowLeft) => Some("ArrowLeft"),
        Key::Named(NamedKey::ArrowRight) => Some("ArrowRight"),
        _ => None,
    }
}

fn compose_title(base: &str, detail: Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!("{base} | {detail}"),
        _ => base.to_string(),
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

/// `0` disables the cap.
fn parse_render_fps_cap(raw: &str) -> Option<Option<u32>> {
    raw.trim().parse::<u32>().ok().map(|fps| (fps > 0).then_some(fps))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn read_env_override<T>(var: &'static str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    match env::var(var) {
        Ok(value) => {
            let parsed = parse(&value);
            if parsed.is_none() {
                warn!(
                    env_var = var,
                    value = value.as_str(),
                    "invalid env var value; falling back to config"
                );
            }
            parsed
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                env_var = var,
                error = %err,
                "unable to read env var; falling back to config"
            );
            None
        }
    }
}
