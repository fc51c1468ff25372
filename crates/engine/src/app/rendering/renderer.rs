use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{DialogView, Facing, InputAction, MarkerView, PlayerView, SceneWorld, VirtualPad};
use crate::content::resolve_image_path;
use crate::geometry::Rect;

use super::raster::{Canvas, LoadedImage};
use super::text::{draw_text, text_width, wrap_text, GLYPH_ADVANCE, LINE_ADVANCE, LINE_HEIGHT};

const FLOOR_COLOR: [u8; 4] = [58, 52, 46, 255];
const OBSTACLE_COLOR: [u8; 4] = [34, 30, 28, 255];
const HITBOX_OBSTACLE_COLOR: [u8; 4] = [230, 70, 70, 255];
const HITBOX_MARKER_COLOR: [u8; 4] = [90, 170, 255, 255];
const HITBOX_PLAYER_COLOR: [u8; 4] = [120, 240, 120, 255];
const MARKER_HIGHLIGHT_COLOR: [u8; 4] = [255, 214, 90, 255];
const PLAYER_IDLE_COLOR: [u8; 4] = [200, 206, 230, 255];
const PLAYER_MOVING_COLOR: [u8; 4] = [236, 240, 255, 255];
const PLAYER_FACING_COLOR: [u8; 4] = [40, 44, 60, 255];
const PROMPT_PLATE_COLOR: [u8; 4] = [10, 12, 16, 180];
const TEXT_PRIMARY_COLOR: [u8; 4] = [244, 248, 252, 255];
const TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const PAD_BUTTON_COLOR: [u8; 4] = [20, 24, 30, 120];
const PAD_BUTTON_HELD_COLOR: [u8; 4] = [120, 150, 190, 200];
const PAD_BORDER_COLOR: [u8; 4] = [150, 165, 185, 255];
const DIALOG_SCRIM_COLOR: [u8; 4] = [0, 0, 0, 140];
const DIALOG_PANEL_COLOR: [u8; 4] = [18, 20, 26, 240];
const DIALOG_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const IMAGE_PLACEHOLDER_COLOR: [u8; 4] = [44, 50, 60, 255];
const IMAGE_PLACEHOLDER_MARK_COLOR: [u8; 4] = [92, 106, 126, 255];

const BLINK_HALF_PERIOD: Duration = Duration::from_millis(400);
const PROMPT_PADDING: i32 = 8;
const FACING_MARK_PX: u32 = 4;
const DIALOG_MARGIN: u32 = 40;
const DIALOG_MAX_WIDTH: u32 = 640;
const DIALOG_MAX_HEIGHT: u32 = 360;
const DIALOG_INSET: i32 = 16;
const DIALOG_IMAGE_PX: u32 = 160;
const DIALOG_FOOTER: &str = "Click or press any key to close";
const CURSOR_OUTSIDE: &str = "Outside";

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer_width: u32,
    buffer_height: u32,
    asset_root: PathBuf,
    image_cache: HashMap<String, Option<LoadedImage>>,
    warned_image_refs: HashSet<String>,
}

impl Renderer {
    /// The pixel buffer has the scene's size; the surface follows the window
    /// and pixels scales the buffer onto it.
    pub fn new(
        window: Arc<Window>,
        buffer_width: u32,
        buffer_height: u32,
        asset_root: PathBuf,
    ) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            buffer_width,
            buffer_height,
            size.width,
            size.height,
        )?;
        Ok(Self {
            window,
            pixels,
            buffer_width,
            buffer_height,
            asset_root,
            image_cache: HashMap::new(),
            warned_image_refs: HashSet::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(
            Arc::clone(&self.window),
            self.buffer_width,
            self.buffer_height,
            width,
            height,
        )?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        buffer_width: u32,
        buffer_height: u32,
        surface_width: u32,
        surface_height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width, surface_height, window);
        Pixels::new(buffer_width, buffer_height, surface)
    }

    /// Maps a physical window position to scene pixels. Positions in the
    /// letterbox map to `None`.
    pub fn window_to_scene(&self, x: f64, y: f64) -> Option<(i32, i32)> {
        self.pixels
            .window_pos_to_pixel((x as f32, y as f32))
            .ok()
            .map(|(px, py)| (px as i32, py as i32))
    }

    /// `cursor` is the pointer in scene pixels, `None` when it is outside
    /// the scene.
    pub(crate) fn render_world(
        &mut self,
        world: &SceneWorld,
        pad: &VirtualPad,
        cursor: Option<(i32, i32)>,
        elapsed: Duration,
    ) -> Result<(), Error> {
        let asset_root = self.asset_root.as_path();
        let image_cache = &mut self.image_cache;
        let warned_image_refs = &mut self.warned_image_refs;
        let mut canvas = Canvas::new(
            self.pixels.frame_mut(),
            self.buffer_width,
            self.buffer_height,
        );

        canvas.clear(FLOOR_COLOR);
        for obstacle in world.obstacles() {
            canvas.fill_rect(*obstacle, OBSTACLE_COLOR);
        }
        draw_markers(&mut canvas, world.markers(), blink_visible(elapsed));
        draw_player(&mut canvas, world.player());
        if world.show_hitboxes() {
            draw_hitboxes(&mut canvas, world);
            draw_cursor_readout(&mut canvas, cursor);
        }
        draw_virtual_pad(&mut canvas, pad);
        draw_prompt(&mut canvas, world.prompt());

        if let Some(dialog) = world.dialog() {
            let image = if dialog.image_ref.is_empty() {
                None
            } else {
                resolve_cached_image(
                    image_cache,
                    warned_image_refs,
                    asset_root,
                    &dialog.image_ref,
                )
            };
            draw_dialog(&mut canvas, dialog, image);
        }

        self.pixels.render()
    }
}

fn blink_visible(elapsed: Duration) -> bool {
    (elapsed.as_millis() / BLINK_HALF_PERIOD.as_millis()) % 2 == 0
}

fn draw_markers(canvas: &mut Canvas<'_>, markers: &[MarkerView], blink_on: bool) {
    if !blink_on {
        return;
    }
    for marker in markers.iter().filter(|marker| marker.highlighted) {
        canvas.outline_rect(marker.rect, 2, MARKER_HIGHLIGHT_COLOR);
    }
}

fn draw_player(canvas: &mut Canvas<'_>, player: &PlayerView) {
    let color = if player.moving {
        PLAYER_MOVING_COLOR
    } else {
        PLAYER_IDLE_COLOR
    };
    canvas.fill_rect(player.rect, color);

    let rect = player.rect;
    let mark_x = match player.facing {
        Facing::Left => rect.x,
        Facing::Right => (rect.right() - i64::from(FACING_MARK_PX)) as i32,
    };
    let mark_y = rect.y + (rect.height / 3) as i32;
    canvas.fill_rect(
        Rect::new(mark_x, mark_y, FACING_MARK_PX, FACING_MARK_PX),
        PLAYER_FACING_COLOR,
    );
}

fn draw_hitboxes(canvas: &mut Canvas<'_>, world: &SceneWorld) {
    for obstacle in world.obstacles() {
        canvas.outline_rect(*obstacle, 1, HITBOX_OBSTACLE_COLOR);
    }
    for marker in world.markers() {
        canvas.outline_rect(marker.rect, 1, HITBOX_MARKER_COLOR);
    }
    canvas.outline_rect(world.player().rect, 1, HITBOX_PLAYER_COLOR);
}

fn draw_virtual_pad(canvas: &mut Canvas<'_>, pad: &VirtualPad) {
    for button in pad.buttons() {
        let fill = if pad.held_action() == Some(button.action) {
            PAD_BUTTON_HELD_COLOR
        } else {
            PAD_BUTTON_COLOR
        };
        canvas.blend_rect(button.rect, fill);
        canvas.outline_rect(button.rect, 1, PAD_BORDER_COLOR);

        let label = pad_label(button.action);
        let label_x = button.rect.x + (button.rect.width as i32 - text_width(label)) / 2 + 1;
        let label_y = button.rect.y + (button.rect.height as i32 - LINE_HEIGHT) / 2;
        draw_text(canvas, label_x, label_y, label, TEXT_PRIMARY_COLOR);
    }
}

fn pad_label(action: InputAction) -> &'static str {
    match action {
        InputAction::MoveUp => "^",
        InputAction::MoveDown => "V",
        InputAction::MoveLeft => "<",
        InputAction::MoveRight => ">",
        InputAction::Activate => "F",
    }
}

fn draw_prompt(canvas: &mut Canvas<'_>, prompt: &str) {
    if prompt.is_empty() {
        return;
    }
    let plate = Rect::new(
        PROMPT_PADDING,
        PROMPT_PADDING,
        (text_width(prompt) + PROMPT_PADDING * 2) as u32,
        (LINE_HEIGHT + PROMPT_PADDING * 2) as u32,
    );
    canvas.blend_rect(plate, PROMPT_PLATE_COLOR);
    draw_text(
        canvas,
        PROMPT_PADDING * 2,
        PROMPT_PADDING * 2,
        prompt,
        TEXT_PRIMARY_COLOR,
    );
}

fn format_cursor_readout(cursor: Option<(i32, i32)>) -> String {
    match cursor {
        Some((x, y)) => format!("X: {x}, Y: {y}"),
        None => CURSOR_OUTSIDE.to_string(),
    }
}

fn draw_cursor_readout(canvas: &mut Canvas<'_>, cursor: Option<(i32, i32)>) {
    let readout = format_cursor_readout(cursor);
    let plate_width = text_width(&readout) + PROMPT_PADDING * 2;
    let plate_x = canvas.width() as i32 - PROMPT_PADDING - plate_width;
    let plate = Rect::new(
        plate_x,
        PROMPT_PADDING,
        plate_width.max(0) as u32,
        (LINE_HEIGHT + PROMPT_PADDING * 2) as u32,
    );
    canvas.blend_rect(plate, PROMPT_PLATE_COLOR);
    draw_text(
        canvas,
        plate_x + PROMPT_PADDING,
        PROMPT_PADDING * 2,
        &readout,
        TEXT_DIM_COLOR,
    );
}

fn dialog_panel_rect(width: u32, height: u32) -> Rect {
    let panel_w = width.saturating_sub(DIALOG_MARGIN * 2).min(DIALOG_MAX_WIDTH);
    let panel_h = height.saturating_sub(DIALOG_MARGIN * 2).min(DIALOG_MAX_HEIGHT);
    Rect::new(
        ((width - panel_w) / 2) as i32,
        ((height - panel_h) / 2) as i32,
        panel_w,
        panel_h,
    )
}

fn draw_dialog(canvas: &mut Canvas<'_>, dialog: &DialogView, image: Option<&LoadedImage>) {
    let full = Rect::new(0, 0, canvas.width(), canvas.height());
    canvas.blend_rect(full, DIALOG_SCRIM_COLOR);

    let panel = dialog_panel_rect(canvas.width(), canvas.height());
    canvas.blend_rect(panel, DIALOG_PANEL_COLOR);
    canvas.outline_rect(panel, 2, DIALOG_BORDER_COLOR);

    let left = panel.x + DIALOG_INSET;
    let mut y = panel.y + DIALOG_INSET;
    draw_text(canvas, left, y, &dialog.title, TEXT_PRIMARY_COLOR);
    y += LINE_ADVANCE * 2;

    let image_px = DIALOG_IMAGE_PX.min(panel.height / 2);
    let image_box = Rect::square(left, y, image_px);
    match image {
        Some(image) => canvas.blit_fit(image, image_box),
        None => draw_image_placeholder(canvas, image_box),
    }

    let body_x = left + image_px as i32 + DIALOG_INSET;
    let body_width = (panel.right() as i32 - DIALOG_INSET - body_x).max(GLYPH_ADVANCE);
    let max_chars = (body_width / GLYPH_ADVANCE) as usize;
    let footer_y = (panel.bottom() as i32) - DIALOG_INSET - LINE_HEIGHT;
    for line in wrap_text(&dialog.body, max_chars) {
        if y + LINE_HEIGHT > footer_y - LINE_ADVANCE {
            break;
        }
        draw_text(canvas, body_x, y, &line, TEXT_PRIMARY_COLOR);
        y += LINE_ADVANCE;
    }

    draw_text(canvas, left, footer_y, DIALOG_FOOTER, TEXT_DIM_COLOR);
}

fn draw_image_placeholder(canvas: &mut Canvas<'_>, rect: Rect) {
    canvas.fill_rect(rect, IMAGE_PLACEHOLDER_COLOR);
    canvas.outline_rect(rect, 1, IMAGE_PLACEHOLDER_MARK_COLOR);
    let size = rect.width.min(rect.height) as i32;
    for step in 0..size {
        canvas.put_pixel(rect.x + step, rect.y + step, IMAGE_PLACEHOLDER_MARK_COLOR);
        canvas.put_pixel(
            rect.x + size - 1 - step,
            rect.y + step,
            IMAGE_PLACEHOLDER_MARK_COLOR,
        );
    }
}

fn resolve_cached_image<'a>(
    cache: &'a mut HashMap<String, Option<LoadedImage>>,
    warned_image_refs: &mut HashSet<String>,
    asset_root: &Path,
    image_ref: &str,
) -> Option<&'a LoadedImage> {
    if !cache.contains_key(image_ref) {
        let loaded = match resolve_image_path(asset_root, image_ref) {
            Ok(path) => match load_image_rgba(&path) {
                Ok(image) => Some(image),
                Err(reason) => {
                    warn_image_load_once(warned_image_refs, image_ref, Some(&path), &reason);
                    None
                }
            },
            Err(error) => {
                warn_image_load_once(
                    warned_image_refs,
                    image_ref,
                    None,
                    &format!("invalid_ref:{error}"),
                );
                None
            }
        };
        cache.insert(image_ref.to_string(), loaded);
    }
    cache.get(image_ref).and_then(Option::as_ref)
}

fn load_image_rgba(path: &Path) -> Result<LoadedImage, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedImage {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_image_load_once(
    warned: &mut HashSet<String>,
    image_ref: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned.insert(image_ref.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        image_ref,
        path = %path_display,
        reason,
        "renderer_image_load_failed_using_placeholder"
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn pixel(frame: &[u8], width: u32, x: i32, y: i32) -> [u8; 4] {
        let offset = ((y as u32 * width + x as u32) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn blink_alternates_every_half_period() {
        assert!(blink_visible(Duration::ZERO));
        assert!(blink_visible(Duration::from_millis(399)));
        assert!(!blink_visible(Duration::from_millis(400)));
        assert!(blink_visible(Duration::from_millis(800)));
    }

    #[test]
    fn only_highlighted_markers_are_drawn_while_blink_is_on() {
        let markers = vec![
            MarkerView {
                id: "a".into(),
                rect: Rect::new(0, 0, 4, 4),
                highlighted: true,
            },
            MarkerView {
                id: "b".into(),
                rect: Rect::new(6, 0, 4, 4),
                highlighted: false,
            },
        ];
        let mut frame = vec![0u8; 10 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 10, 4);
        draw_markers(&mut canvas, &markers, false);
        assert!(frame.iter().all(|byte| *byte == 0));

        let mut canvas = Canvas::new(&mut frame, 10, 4);
        draw_markers(&mut canvas, &markers, true);
        assert_eq!(pixel(&frame, 10, 0, 0), MARKER_HIGHLIGHT_COLOR);
        assert_eq!(pixel(&frame, 10, 6, 0), [0; 4]);
    }

    #[test]
    fn facing_mark_sits_on_the_facing_side() {
        let mut frame = vec![0u8; 32 * 32 * 4];
        let player = PlayerView {
            rect: Rect::square(0, 0, 32),
            facing: Facing::Left,
            moving: false,
        };
        draw_player(&mut Canvas::new(&mut frame, 32, 32), &player);
        assert_eq!(pixel(&frame, 32, 0, 11), PLAYER_FACING_COLOR);
        assert_eq!(pixel(&frame, 32, 31, 11), PLAYER_IDLE_COLOR);

        let player = PlayerView {
            facing: Facing::Right,
            moving: true,
            ..player
        };
        draw_player(&mut Canvas::new(&mut frame, 32, 32), &player);
        assert_eq!(pixel(&frame, 32, 31, 11), PLAYER_FACING_COLOR);
        assert_eq!(pixel(&frame, 32, 0, 11), PLAYER_MOVING_COLOR);
    }

    #[test]
    fn cursor_readout_shows_scene_coordinates_or_outside() {
        assert_eq!(format_cursor_readout(Some((60, 250))), "X: 60, Y: 250");
        assert_eq!(format_cursor_readout(Some((0, -3))), "X: 0, Y: -3");
        assert_eq!(format_cursor_readout(None), "Outside");
    }

    #[test]
    fn cursor_readout_draws_in_the_top_right_corner() {
        let (w, h) = (200u32, 40u32);
        let mut frame = vec![0u8; (w * h * 4) as usize];
        draw_cursor_readout(&mut Canvas::new(&mut frame, w, h), None);

        let plate_width = text_width(CURSOR_OUTSIDE) + PROMPT_PADDING * 2;
        let plate_left = w as i32 - PROMPT_PADDING - plate_width;
        assert_ne!(pixel(&frame, w, plate_left, PROMPT_PADDING), [0; 4]);
        assert_eq!(pixel(&frame, w, plate_left - 1, PROMPT_PADDING), [0; 4]);
        assert_eq!(pixel(&frame, w, w as i32 - 1, PROMPT_PADDING), [0; 4]);

        let mut tiny = vec![0u8; 4 * 4 * 4];
        draw_cursor_readout(&mut Canvas::new(&mut tiny, 4, 4), Some((1, 2)));
    }

    #[test]
    fn dialog_panel_is_centered_and_bounded() {
        let panel = dialog_panel_rect(1045, 580);
        assert_eq!(panel.width, DIALOG_MAX_WIDTH);
        assert_eq!(panel.height, DIALOG_MAX_HEIGHT);
        assert_eq!(panel.x, (1045 - 640) / 2);
        assert_eq!(panel.y, (580 - 360) / 2);

        let tiny = dialog_panel_rect(50, 50);
        assert_eq!(tiny.width, 0);
        assert_eq!((tiny.x, tiny.y), (25, 25));
    }

    #[test]
    fn dialog_draw_survives_small_frames() {
        let dialog = DialogView {
            title: "Pillar".to_string(),
            body: "A very long body that must wrap over several lines.".to_string(),
            image_ref: String::new(),
        };
        for (w, h) in [(1u32, 1u32), (40, 30), (200, 120)] {
            let mut frame = vec![0u8; (w * h * 4) as usize];
            draw_dialog(&mut Canvas::new(&mut frame, w, h), &dialog, None);
        }
    }

    #[test]
    fn image_cache_loads_png_and_reuses_entry() {
        let temp = TempDir::new().expect("temp");
        let pictures = temp.path().join("pictures");
        fs::create_dir_all(&pictures).expect("mkdir");
        image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]))
            .save(pictures.join("floor.png"))
            .expect("save png");

        let mut cache = HashMap::new();
        let mut warned = HashSet::new();
        let loaded =
            resolve_cached_image(&mut cache, &mut warned, temp.path(), "pictures/floor.png")
                .expect("loaded");
        assert_eq!((loaded.width, loaded.height), (2, 3));
        assert_eq!(loaded.rgba.len(), 2 * 3 * 4);

        fs::remove_file(pictures.join("floor.png")).expect("remove");
        assert!(
            resolve_cached_image(&mut cache, &mut warned, temp.path(), "pictures/floor.png")
                .is_some()
        );
        assert!(warned.is_empty());
    }

    #[test]
    fn missing_and_invalid_images_warn_once_and_cache_the_miss() {
        let temp = TempDir::new().expect("temp");
        let mut cache = HashMap::new();
        let mut warned = HashSet::new();

        for _ in 0..2 {
            assert!(
                resolve_cached_image(&mut cache, &mut warned, temp.path(), "pictures/none.png")
                    .is_none()
            );
            assert!(
                resolve_cached_image(&mut cache, &mut warned, temp.path(), "../escape.png")
                    .is_none()
            );
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(warned.len(), 2);
    }
}
