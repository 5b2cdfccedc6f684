use std::io::Cursor;

use anyhow::{anyhow, Result};
use image::{ImageFormat, Rgb as Pixel, RgbImage};

use super::glyphs::{glyph, is_set, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::{CertificateLayout, Rgb, TextLine};

/// Glyph cell is one column wider than the glyph for letter spacing.
const CELL_WIDTH: u32 = GLYPH_WIDTH + 1;

/// Rasterise the layout at `scale` pixels per point and encode it as PNG.
pub fn render_png(layout: &CertificateLayout, scale: f32) -> Result<Vec<u8>> {
    let width = (layout.width * scale).round().max(1.0) as u32;
    let height = (layout.height * scale).round().max(1.0) as u32;

    let mut img = RgbImage::from_pixel(width, height, pixel(layout.background));

    let outer = (18.0 * scale) as u32;
    let inner = (26.0 * scale) as u32;
    draw_frame(&mut img, outer, ((4.0 * scale) as u32).max(1), pixel(layout.accent));
    draw_frame(&mut img, inner, ((1.0 * scale) as u32).max(1), pixel(layout.accent));

    for line in &layout.lines {
        draw_line(&mut img, layout, line, scale);
    }

    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| anyhow!("failed to encode PNG: {}", e))?;

    Ok(cursor.into_inner())
}

fn pixel(color: Rgb) -> Pixel<u8> {
    Pixel([color.0, color.1, color.2])
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Pixel<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

/// Rectangle outline `inset` pixels from every edge.
fn draw_frame(img: &mut RgbImage, inset: u32, thickness: u32, color: Pixel<u8>) {
    let (w, h) = (img.width(), img.height());
    if w <= inset * 2 || h <= inset * 2 {
        return;
    }
    let (fw, fh) = (w - inset * 2, h - inset * 2);
    fill_rect(img, inset, inset, fw, thickness, color);
    fill_rect(img, inset, h - inset - thickness.min(fh), fw, thickness, color);
    fill_rect(img, inset, inset, thickness, fh, color);
    fill_rect(img, w - inset - thickness.min(fw), inset, thickness, fh, color);
}

fn draw_line(img: &mut RgbImage, layout: &CertificateLayout, line: &TextLine, scale: f32) {
    // One glyph row per `size / 9` points keeps caps close to the PDF's cap height
    let dot = ((line.size * scale) / 9.0).round().max(1.0) as u32;
    let color = pixel(layout.color(line.ink));

    let chars: Vec<char> = line.text.chars().collect();
    let text_width = chars.len() as u32 * CELL_WIDTH * dot;
    let x0 = img.width().saturating_sub(text_width) / 2;
    let baseline = (layout.height * line.y * scale) as u32;
    let y0 = baseline.saturating_sub(GLYPH_HEIGHT * dot);

    for (i, c) in chars.iter().enumerate() {
        let g = glyph(*c);
        let cx = x0 + i as u32 * CELL_WIDTH * dot;
        for gy in 0..GLYPH_HEIGHT {
            for gx in 0..GLYPH_WIDTH {
                if is_set(&g, gx, gy) {
                    fill_rect(img, cx + gx * dot, y0 + gy * dot, dot, dot, color);
                }
            }
        }
        // Bold: overstrike one dot to the right
        if line.bold {
            for gy in 0..GLYPH_HEIGHT {
                for gx in 0..GLYPH_WIDTH {
                    if is_set(&g, gx, gy) {
                        fill_rect(img, cx + gx * dot + dot / 2, y0 + gy * dot, dot, dot, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::certificates::models::{CertificateConfig, ParticipantData};
    use image::GenericImageView;

    fn layout(config: &CertificateConfig) -> CertificateLayout {
        CertificateLayout::build(
            config,
            "TS-005",
            &ParticipantData {
                name: "Ada Lovelace".into(),
                event_title: "Tech Summit".into(),
                completion_date: "2024-06-15".into(),
                venue: None,
            },
        )
    }

    #[test]
    fn encodes_page_sized_png() {
        let bytes = render_png(&layout(&CertificateConfig::default()), 1.0).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (842, 595));
    }

    #[test]
    fn paints_background_and_text() {
        let config = CertificateConfig {
            background_color: Some("#ffffff".into()),
            ..Default::default()
        };
        let bytes = render_png(&layout(&config), 1.0).unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgb8();

        assert_eq!(img.get_pixel(2, 2), &Pixel([255, 255, 255]));
        let inked = img.pixels().filter(|p| **p != Pixel([255, 255, 255])).count();
        assert!(inked > 1000);
    }

    #[test]
    fn long_lines_do_not_overflow() {
        let mut long = layout(&CertificateConfig::default());
        long.lines[0].text = "X".repeat(500);
        assert!(render_png(&long, 1.0).is_ok());
    }
}
