//! Burns frame annotations into the image and encodes it as JPEG.

use ab_glyph::{FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect as PixelRect;
use tracing::{info, warn};

use crate::aggregator::{Align, FrameAnnotations, LabelKind, Rect, TextLabel};
use crate::config::RenderConfig;
use crate::error::{Error, Result};

const REGION_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const OBJECT_COLOR: Rgb<u8> = Rgb([255, 56, 56]);
const SPEED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TOTAL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const REGION_COUNT_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const ID_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Padding around a label's filled background.
const BACKGROUND_PAD: i32 = 5;

pub struct Renderer {
    font: Option<FontVec>,
    scale: PxScale,
    jpeg_quality: u8,
}

impl Renderer {
    /// Create a renderer.
    ///
    /// # Arguments
    ///
    /// * `font` - Label font; `None` draws boxes only
    /// * `font_size` - Label height in pixels
    /// * `jpeg_quality` - Encoder quality, clamped to 1..=100
    pub fn new(font: Option<FontVec>, font_size: f32, jpeg_quality: u8) -> Self {
        Self {
            font,
            scale: PxScale::from(font_size),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Load the configured font. A missing font file only disables text.
    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        let font = match &config.font_path {
            Some(path) if path.exists() => {
                let data = std::fs::read(path)?;
                let font = FontVec::try_from_vec(data).map_err(|e| Error::Font {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                info!("Loaded label font {}", path.display());
                Some(font)
            }
            Some(path) => {
                warn!(
                    "Font {} not found; labels will not be drawn",
                    path.display()
                );
                None
            }
            None => None,
        };
        Ok(Self::new(font, config.font_size, config.jpeg_quality))
    }

    /// Whether text labels will be drawn.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw regions, then objects, then totals onto `image`.
    pub fn render(&self, image: &mut RgbImage, annotations: &FrameAnnotations) {
        for region in &annotations.regions {
            draw_box(image, &region.rect, REGION_COLOR);
            self.draw_label(image, &region.label);
        }
        for object in &annotations.objects {
            draw_box(image, &object.bbox, OBJECT_COLOR);
            self.draw_label(image, &object.id_label);
            self.draw_label(image, &object.speed_label);
        }
        for label in &annotations.totals {
            self.draw_label(image, label);
        }
    }

    /// Encode `image` as a baseline JPEG at the configured quality.
    pub fn encode_jpeg(&self, image: &RgbImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality).encode_image(image)?;
        Ok(buffer)
    }

    fn draw_label(&self, image: &mut RgbImage, label: &TextLabel) {
        let Some(font) = &self.font else {
            return;
        };
        let (w, h) = text_size(self.scale, font, &label.text);
        let (w, h) = (w as i32, h as i32);
        let left = match label.align {
            Align::Left => label.x,
            Align::Center => label.x - w / 2,
        };
        // label.y is a baseline; imageproc positions text by its top edge
        let top = label.y - h;

        if label.background {
            let bg = PixelRect::at(left - BACKGROUND_PAD, top - BACKGROUND_PAD)
                .of_size((w + 2 * BACKGROUND_PAD) as u32, (h + 2 * BACKGROUND_PAD) as u32);
            draw_filled_rect_mut(image, bg, LABEL_BACKGROUND);
        }
        draw_text_mut(image, label_color(label.kind), left, top, self.scale, font, &label.text);
    }
}

fn label_color(kind: LabelKind) -> Rgb<u8> {
    match kind {
        LabelKind::RegionName => REGION_COLOR,
        LabelKind::ObjectId => ID_COLOR,
        LabelKind::Speed => SPEED_COLOR,
        LabelKind::TotalObjects => TOTAL_COLOR,
        LabelKind::RegionCount => REGION_COUNT_COLOR,
    }
}

/// Two-pixel outline.
fn draw_box(image: &mut RgbImage, rect: &Rect, color: Rgb<u8>) {
    let x = rect.x.round() as i32;
    let y = rect.y.round() as i32;
    let w = rect.width.round().max(1.0) as u32;
    let h = rect.height.round().max(1.0) as u32;
    draw_hollow_rect_mut(image, PixelRect::at(x, y).of_size(w, h), color);
    if w > 2 && h > 2 {
        draw_hollow_rect_mut(image, PixelRect::at(x + 1, y + 1).of_size(w - 2, h - 2), color);
    }
}
