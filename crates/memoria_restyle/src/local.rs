//! Deterministic local filter chain.
//!
//! Downscale, Sobel edges, posterize, warm tone, then ink the edges back over
//! the flattened colours. Same bytes in, same PNG out.

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, imageops::FilterType};
use memoria_config::LocalFilterConfig;
use memoria_core::StrategyKind;
use memoria_error::{MemoriaResult, RestyleError, RestyleErrorKind};
use std::io::Cursor;
use tracing::{debug, instrument};

use crate::RestyleStrategy;

/// Largest Sobel magnitude an 8-bit image can produce (4 * 255 * sqrt 2).
const SOBEL_MAX: f32 = 1442.497;

/// Ink used for edge pixels.
const EDGE_INK: [u8; 3] = [46, 34, 28];

/// Stylizes images on the local CPU.
#[derive(Debug, Clone, Default)]
pub struct LocalFilter {
    config: LocalFilterConfig,
}

impl LocalFilter {
    /// Creates a filter with the given parameters.
    pub fn new(config: LocalFilterConfig) -> Self {
        Self { config }
    }

    /// Filter parameters.
    pub fn config(&self) -> &LocalFilterConfig {
        &self.config
    }

    /// Run the chain synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`RestyleErrorKind::LocalFilter`] when `source` is not a
    /// decodable image, or [`RestyleErrorKind::Encode`] if PNG encoding fails.
    pub fn render(&self, source: &[u8]) -> Result<Vec<u8>, RestyleError> {
        let decoded = image::load_from_memory(source).map_err(|e| {
            RestyleError::new(RestyleErrorKind::LocalFilter(format!(
                "cannot decode source image: {}",
                e
            )))
        })?;

        let max_edge = (*self.config.max_edge()).max(1);
        let scaled = if decoded.width() > max_edge || decoded.height() > max_edge {
            decoded.resize(max_edge, max_edge, FilterType::Triangle)
        } else {
            decoded
        };

        let mut rgb = scaled.to_rgb8();
        let edges = sobel_edges(&scaled.to_luma8(), *self.config.edge_threshold());
        let levels = (*self.config.levels()).max(2);
        let warmth = self.config.warmth().clamp(0.0, 1.0);

        for (x, y, pixel) in rgb.enumerate_pixels_mut() {
            if edges.get_pixel(x, y).0[0] > 0 {
                pixel.0 = EDGE_INK;
                continue;
            }
            let [r, g, b] = pixel.0;
            let flattened = [
                posterize(r, levels),
                posterize(g, levels),
                posterize(b, levels),
            ];
            pixel.0 = warm(flattened, warmth);
        }

        debug!(
            width = rgb.width(),
            height = rgb.height(),
            levels,
            "Local filter chain applied"
        );
        encode_png(rgb)
    }
}

#[async_trait]
impl RestyleStrategy for LocalFilter {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Local
    }

    #[instrument(skip(self, source), fields(source_bytes = source.len()))]
    async fn apply(&self, source: &[u8]) -> MemoriaResult<Vec<u8>> {
        let filter = self.clone();
        let source = source.to_vec();
        let output = tokio::task::spawn_blocking(move || filter.render(&source))
            .await
            .map_err(|e| {
                RestyleError::new(RestyleErrorKind::LocalFilter(format!(
                    "filter task failed: {}",
                    e
                )))
            })??;
        Ok(output)
    }
}

/// Binary edge mask from the Sobel gradient magnitude of `luma`.
///
/// Border pixels are never edges.
fn sobel_edges(luma: &GrayImage, threshold: f32) -> GrayImage {
    let (width, height) = luma.dimensions();
    let mut mask = GrayImage::new(width, height);
    if width < 3 || height < 3 {
        return mask;
    }

    let at = |x: u32, y: u32| f32::from(luma.get_pixel(x, y).0[0]);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
            let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
            let magnitude = (gx * gx + gy * gy).sqrt() / SOBEL_MAX;
            if magnitude > threshold {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }
    }
    mask
}

/// Snap a channel to one of `levels` evenly spaced values.
fn posterize(value: u8, levels: u8) -> u8 {
    let step = 255.0 / f32::from(levels - 1);
    ((f32::from(value) / step).round() * step).round().min(255.0) as u8
}

/// Push red toward full and pull blue down by `warmth`.
fn warm([r, g, b]: [u8; 3], warmth: f32) -> [u8; 3] {
    let r = f32::from(r) + (255.0 - f32::from(r)) * warmth;
    let b = f32::from(b) * (1.0 - warmth);
    [r.round().min(255.0) as u8, g, b.round().max(0.0) as u8]
}

fn encode_png(rgb: RgbImage) -> Result<Vec<u8>, RestyleError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| RestyleError::new(RestyleErrorKind::Encode(e.to_string())))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn checkerboard(size: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(size, size, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgb([230, 200, 120])
            } else {
                Rgb([20, 60, 140])
            }
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_posterize_snaps_to_levels() {
        assert_eq!(posterize(0, 2), 0);
        assert_eq!(posterize(200, 2), 255);
        assert_eq!(posterize(100, 2), 0);
        assert_eq!(posterize(255, 6), 255);
        assert_eq!(posterize(60, 6), 51);
    }

    #[test]
    fn test_warm_shifts_red_up_and_blue_down() {
        assert_eq!(warm([100, 100, 100], 0.0), [100, 100, 100]);
        let [r, g, b] = warm([100, 100, 100], 0.5);
        assert!(r > 100);
        assert_eq!(g, 100);
        assert!(b < 100);
        assert_eq!(warm([255, 0, 0], 1.0), [255, 0, 0]);
    }

    #[test]
    fn test_sobel_finds_vertical_boundary() {
        let luma = GrayImage::from_fn(8, 8, |x, _| if x < 4 { Luma([0]) } else { Luma([255]) });
        let mask = sobel_edges(&luma, 0.25);
        assert_eq!(mask.get_pixel(4, 4).0[0], 255);
        assert_eq!(mask.get_pixel(1, 4).0[0], 0);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_flat_image_has_no_edges() {
        let luma = GrayImage::from_pixel(6, 6, Luma([128]));
        let mask = sobel_edges(&luma, 0.0);
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_render_is_deterministic() {
        let filter = LocalFilter::default();
        let source = checkerboard(32);
        let first = filter.render(&source).unwrap();
        let second = filter.render(&source).unwrap();
        assert_eq!(first, second);
        assert!(image::load_from_memory_with_format(&first, ImageFormat::Png).is_ok());
    }

    #[test]
    fn test_render_downscales_to_max_edge() {
        let filter = LocalFilter::new(LocalFilterConfig::default().with_max_edge(16));
        let output = filter.render(&checkerboard(64)).unwrap();
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn test_render_rejects_non_image() {
        let err = LocalFilter::default().render(b"not an image").unwrap_err();
        assert!(matches!(err.kind, RestyleErrorKind::LocalFilter(_)));
    }
}
