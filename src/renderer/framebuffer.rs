//! CPU raster target
//!
//! Pixels are packed RGBA8 so the buffer can be handed to the GPU as bytes
//! without conversion. Every drawing call clips against the buffer bounds.

use crate::Rgb;

/// Pack an opaque colour
#[inline]
pub fn pack(c: Rgb) -> u32 {
    u32::from_le_bytes([c.r, c.g, c.b, 0xff])
}

#[inline]
pub fn unpack(p: u32) -> Rgb {
    let [r, g, b, _] = p.to_le_bytes();
    Rgb { r, g, b }
}

/// Alpha channel of a packed pixel
#[inline]
pub fn alpha(p: u32) -> u8 {
    p.to_le_bytes()[3]
}

#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            pixels: vec![pack(Rgb::BLACK); (width * height) as usize],
        }
    }

    /// Reallocate for a new viewport. Returns true if the size changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.width && height == self.height {
            return false;
        }
        *self = Self::new(width, height);
        true
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgb> {
        self.index(x, y).map(|i| unpack(self.pixels[i]))
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = pack(color);
        }
    }

    /// Mix `color` over the existing pixel
    #[inline]
    pub fn blend(&mut self, x: i32, y: i32, color: Rgb, opacity: f32) {
        if let Some(i) = self.index(x, y) {
            let under = unpack(self.pixels[i]);
            self.pixels[i] = pack(under.lerp(color, opacity));
        }
    }

    pub fn clear(&mut self, color: Rgb) {
        self.pixels.fill(pack(color));
    }

    /// Clip a rectangle to the buffer, returning pixel ranges
    fn clip(&self, x: i32, y: i32, w: i32, h: i32) -> Option<(usize, usize, usize, usize)> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        (x0 < x1 && y0 < y1).then_some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) else {
            return;
        };
        let packed = pack(color);
        let stride = self.width as usize;
        for row in y0..y1 {
            self.pixels[row * stride + x0..row * stride + x1].fill(packed);
        }
    }

    pub fn blend_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb, opacity: f32) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) else {
            return;
        };
        let stride = self.width as usize;
        for row in y0..y1 {
            for px in &mut self.pixels[row * stride + x0..row * stride + x1] {
                *px = pack(unpack(*px).lerp(color, opacity));
            }
        }
    }

    /// One-pixel rectangle outline
    pub fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    /// Vertical span `[y0, y1)` in one column
    pub fn vline(&mut self, x: i32, y0: i32, y1: i32, color: Rgb) {
        self.fill_rect(x, y0, 1, y1 - y0, color);
    }

    /// Bresenham line
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, opacity: f32) {
        if radius.is_nan() || radius <= 0.0 || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let r2 = radius * radius;
        let x0 = (cx - radius).floor() as i32;
        let x1 = (cx + radius).ceil() as i32;
        let y0 = (cy - radius).floor() as i32;
        let y1 = (cy + radius).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (px, py) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                if px * px + py * py <= r2 {
                    self.blend(x, y, color, opacity);
                }
            }
        }
    }

    /// Linear gradient filling rows `[y0, y1)`
    pub fn vertical_gradient(&mut self, y0: i32, y1: i32, top: Rgb, bottom: Rgb) {
        let span = (y1 - y0).max(1) as f32;
        for y in y0.max(0)..y1.min(self.height as i32) {
            let t = (y - y0) as f32 / span;
            self.fill_rect(0, y, self.width as i32, 1, top.lerp(bottom, t));
        }
    }
}
