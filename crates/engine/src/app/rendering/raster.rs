use crate::geometry::Rect;

pub(crate) struct LoadedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba: Vec<u8>,
}

/// Borrowed RGBA8 frame. Every write is clipped to the frame.
pub(crate) struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn clear(&mut self, color: [u8; 4]) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub(crate) fn put_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if let Some(range) = self.pixel_range(x, y) {
            self.frame[range].copy_from_slice(&color);
        }
    }

    /// Source-over blend using `color[3]` as alpha.
    pub(crate) fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        let Some(range) = self.pixel_range(x, y) else {
            return;
        };
        let alpha = u16::from(color[3]);
        let inverse = 255 - alpha;
        let dst = &mut self.frame[range];
        for channel in 0..3 {
            let blended = (u16::from(color[channel]) * alpha + u16::from(dst[channel]) * inverse)
                / 255;
            dst[channel] = blended as u8;
        }
        dst[3] = 255;
    }

    pub(crate) fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        let Some((left, top, right, bottom)) = self.clip(rect) else {
            return;
        };
        for y in top..bottom {
            for x in left..right {
                self.put_pixel(x, y, color);
            }
        }
    }

    pub(crate) fn blend_rect(&mut self, rect: Rect, color: [u8; 4]) {
        let Some((left, top, right, bottom)) = self.clip(rect) else {
            return;
        };
        for y in top..bottom {
            for x in left..right {
                self.blend_pixel(x, y, color);
            }
        }
    }

    pub(crate) fn outline_rect(&mut self, rect: Rect, thickness: u32, color: [u8; 4]) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        let t = thickness.min(rect.width).min(rect.height);
        let inner_bottom = clamp_to_i32(rect.bottom() - i64::from(t));
        let inner_right = clamp_to_i32(rect.right() - i64::from(t));
        self.fill_rect(Rect::new(rect.x, rect.y, rect.width, t), color);
        self.fill_rect(Rect::new(rect.x, inner_bottom, rect.width, t), color);
        self.fill_rect(Rect::new(rect.x, rect.y, t, rect.height), color);
        self.fill_rect(Rect::new(inner_right, rect.y, t, rect.height), color);
    }

    /// Nearest-neighbour blit scaled to fit inside `target`, centered and
    /// aspect preserving. Fully transparent source pixels are skipped.
    pub(crate) fn blit_fit(&mut self, image: &LoadedImage, target: Rect) {
        if image.width == 0 || image.height == 0 || target.width == 0 || target.height == 0 {
            return;
        }
        if image.rgba.len() < image.width as usize * image.height as usize * 4 {
            return;
        }
        let scale = (target.width as f32 / image.width as f32)
            .min(target.height as f32 / image.height as f32);
        let out_w = ((image.width as f32 * scale).round() as u32).max(1);
        let out_h = ((image.height as f32 * scale).round() as u32).max(1);
        let left = target.x + (target.width.saturating_sub(out_w) / 2) as i32;
        let top = target.y + (target.height.saturating_sub(out_h) / 2) as i32;

        for dy in 0..out_h {
            let src_y = ((dy as f32 / scale) as u32).min(image.height - 1) as usize;
            for dx in 0..out_w {
                let src_x = ((dx as f32 / scale) as u32).min(image.width - 1) as usize;
                let offset = (src_y * image.width as usize + src_x) * 4;
                let texel = [
                    image.rgba[offset],
                    image.rgba[offset + 1],
                    image.rgba[offset + 2],
                    image.rgba[offset + 3],
                ];
                if texel[3] == 0 {
                    continue;
                }
                self.blend_pixel(left + dx as i32, top + dy as i32, texel);
            }
        }
    }

    fn clip(&self, rect: Rect) -> Option<(i32, i32, i32, i32)> {
        let left = i64::from(rect.x).max(0);
        let top = i64::from(rect.y).max(0);
        let right = rect.right().min(i64::from(self.width));
        let bottom = rect.bottom().min(i64::from(self.height));
        if right <= left || bottom <= top {
            return None;
        }
        Some((left as i32, top as i32, right as i32, bottom as i32))
    }

    fn pixel_range(&self, x: i32, y: i32) -> Option<std::ops::Range<usize>> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let pixel = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?;
        let start = pixel.checked_mul(4)?;
        let end = start.checked_add(4)?;
        (end <= self.frame.len()).then_some(start..end)
    }
}

fn clamp_to_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn fill_rect_clips_to_frame() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.fill_rect(Rect::new(-2, -2, 4, 4), RED);
        canvas.fill_rect(Rect::new(3, 3, 10, 10), RED);
        canvas.fill_rect(Rect::new(i32::MAX - 1, 0, u32::MAX, 2), RED);

        assert_eq!(pixel(&frame, 4, 0, 0), RED);
        assert_eq!(pixel(&frame, 4, 1, 1), RED);
        assert_eq!(pixel(&frame, 4, 2, 2), [0; 4]);
        assert_eq!(pixel(&frame, 4, 3, 3), RED);
    }

    #[test]
    fn tiny_frames_never_write_out_of_bounds() {
        for (w, h) in [(0u32, 0u32), (1, 0), (0, 1), (1, 1), (2, 3)] {
            let mut frame = vec![0u8; (w * h * 4) as usize];
            let mut canvas = Canvas::new(&mut frame, w, h);
            canvas.clear(RED);
            canvas.outline_rect(Rect::new(-5, -5, 20, 20), 2, RED);
            canvas.blend_rect(Rect::new(0, 0, 10, 10), [0, 0, 0, 128]);
            canvas.put_pixel(-1, 0, RED);
            canvas.put_pixel(w as i32, h as i32, RED);
        }
    }

    #[test]
    fn outline_leaves_interior_untouched() {
        let mut frame = vec![0u8; 5 * 5 * 4];
        let mut canvas = Canvas::new(&mut frame, 5, 5);
        canvas.outline_rect(Rect::new(0, 0, 5, 5), 1, RED);
        assert_eq!(pixel(&frame, 5, 0, 2), RED);
        assert_eq!(pixel(&frame, 5, 4, 4), RED);
        assert_eq!(pixel(&frame, 5, 2, 2), [0; 4]);
    }

    #[test]
    fn blend_mixes_with_existing_color() {
        let mut frame = vec![0u8; 4];
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.clear([200, 100, 0, 255]);
        canvas.blend_pixel(0, 0, [0, 0, 0, 255]);
        assert_eq!(pixel(&frame, 1, 0, 0), [0, 0, 0, 255]);

        let mut frame = vec![0u8; 4];
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.clear([200, 100, 0, 255]);
        canvas.blend_pixel(0, 0, [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 1, 0, 0), [200, 100, 0, 255]);
    }

    #[test]
    fn blit_fit_scales_into_target() {
        let image = LoadedImage {
            width: 1,
            height: 1,
            rgba: RED.to_vec(),
        };
        let mut frame = vec![0u8; 8 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 8, 4);
        canvas.blit_fit(&image, Rect::new(0, 0, 8, 4));

        // 1x1 fitted into 8x4 becomes a centered 4x4 square.
        assert_eq!(pixel(&frame, 8, 1, 0), [0; 4]);
        assert_eq!(pixel(&frame, 8, 2, 0), RED);
        assert_eq!(pixel(&frame, 8, 5, 3), RED);
        assert_eq!(pixel(&frame, 8, 6, 3), [0; 4]);
    }

    #[test]
    fn blit_skips_truncated_image_data() {
        let image = LoadedImage {
            width: 2,
            height: 2,
            rgba: RED.to_vec(),
        };
        let mut frame = vec![0u8; 2 * 2 * 4];
        let mut canvas = Canvas::new(&mut frame, 2, 2);
        canvas.blit_fit(&image, Rect::new(0, 0, 2, 2));
        assert!(frame.iter().all(|byte| *byte == 0));
    }
}
