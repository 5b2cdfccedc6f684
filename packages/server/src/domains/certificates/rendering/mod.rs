//! Built-in certificate renderer.
//!
//! Both artifacts share one [`CertificateLayout`]: a page size from the
//! config's orientation, three colors and a stack of centered text lines.
//! `pdf` writes it as a single-page PDF with the standard Helvetica fonts,
//! `png` rasterises it with the bitmap glyphs in `glyphs`.

mod glyphs;
mod pdf;
mod png;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::models::{CertificateConfig, Orientation, ParticipantData};
use crate::kernel::BaseCertificateRenderer;

pub use pdf::render_pdf;
pub use png::render_png;

/// A4 in PDF points.
const A4_LONG_EDGE: f32 = 842.0;
const A4_SHORT_EDGE: f32 = 595.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const WHITE: Rgb = Rgb(255, 255, 255);
    const NAVY: Rgb = Rgb(30, 58, 138);
    const SLATE: Rgb = Rgb(31, 41, 55);

    /// `#rrggbb`, `rrggbb` or `#rgb`.
    pub fn parse(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Some(Rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => None,
        }
    }

    fn from_config(value: Option<&str>, default: Rgb) -> Rgb {
        value.and_then(Rgb::parse).unwrap_or(default)
    }

    /// Components in 0.0..=1.0 for PDF color operators.
    pub fn unit(&self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ink {
    Accent,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Font size in points
    pub size: f32,
    /// Baseline position as a fraction of page height, from the top
    pub y: f32,
    pub bold: bool,
    pub ink: Ink,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CertificateLayout {
    pub width: f32,
    pub height: f32,
    pub background: Rgb,
    pub accent: Rgb,
    pub text: Rgb,
    pub lines: Vec<TextLine>,
}

impl CertificateLayout {
    pub fn build(config: &CertificateConfig, certificate_number: &str, data: &ParticipantData) -> Self {
        let (width, height) = match config.orientation {
            Orientation::Landscape => (A4_LONG_EDGE, A4_SHORT_EDGE),
            Orientation::Portrait => (A4_SHORT_EDGE, A4_LONG_EDGE),
        };

        let mut lines = Vec::new();
        let mut push = |text: String, size: f32, y: f32, bold: bool, ink: Ink| {
            if !text.trim().is_empty() {
                lines.push(TextLine {
                    text,
                    size,
                    y,
                    bold,
                    ink,
                });
            }
        };

        if let Some(org) = &config.organization_name {
            push(org.clone(), 14.0, 0.12, false, Ink::Text);
        }
        push(config.title_text().to_string(), 34.0, 0.22, true, Ink::Accent);
        if let Some(subtitle) = &config.subtitle {
            push(subtitle.clone(), 16.0, 0.29, false, Ink::Text);
        }
        push(config.body_text().to_string(), 14.0, 0.38, false, Ink::Text);
        push(data.name.clone(), 30.0, 0.48, true, Ink::Accent);
        push(data.event_title.clone(), 18.0, 0.58, true, Ink::Text);
        push(format!("Completed on {}", data.completion_date), 13.0, 0.65, false, Ink::Text);
        if config.show_venue {
            if let Some(venue) = &data.venue {
                push(venue.clone(), 13.0, 0.70, false, Ink::Text);
            }
        }
        if let Some(name) = &config.signatory_name {
            push(name.clone(), 14.0, 0.80, true, Ink::Text);
        }
        if let Some(title) = &config.signatory_title {
            push(title.clone(), 11.0, 0.84, false, Ink::Text);
        }
        if config.show_certificate_number {
            push(format!("Certificate No. {}", certificate_number), 10.0, 0.93, false, Ink::Text);
        }

        Self {
            width,
            height,
            background: Rgb::from_config(config.background_color.as_deref(), Rgb::WHITE),
            accent: Rgb::from_config(config.accent_color.as_deref(), Rgb::NAVY),
            text: Rgb::from_config(config.text_color.as_deref(), Rgb::SLATE),
            lines,
        }
    }

    pub fn color(&self, ink: Ink) -> Rgb {
        match ink {
            Ink::Accent => self.accent,
            Ink::Text => self.text,
        }
    }
}

/// Renders certificates with the built-in layout.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    /// Pixels per PDF point in the PNG
    png_scale: f32,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { png_scale: 1.5 }
    }

    pub fn with_png_scale(png_scale: f32) -> Self {
        Self { png_scale }
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseCertificateRenderer for TemplateRenderer {
    async fn generate_pdf(
        &self,
        config: &CertificateConfig,
        certificate_number: &str,
        data: &ParticipantData,
    ) -> Result<Vec<u8>> {
        let layout = CertificateLayout::build(config, certificate_number, data);
        tokio::task::spawn_blocking(move || render_pdf(&layout))
            .await
            .map_err(|e| anyhow!("render task failed: {}", e))?
    }

    async fn generate_png(
        &self,
        config: &CertificateConfig,
        certificate_number: &str,
        data: &ParticipantData,
    ) -> Result<Vec<u8>> {
        let layout = CertificateLayout::build(config, certificate_number, data);
        let scale = if self.png_scale > 0.0 { self.png_scale } else { 1.0 };
        tokio::task::spawn_blocking(move || render_png(&layout, scale))
            .await
            .map_err(|e| anyhow!("render task failed: {}", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant() -> ParticipantData {
        ParticipantData {
            name: "Ada Lovelace".into(),
            event_title: "Tech Summit".into(),
            completion_date: "2024-06-15".into(),
            venue: Some("Minneapolis".into()),
        }
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgb::parse("#1e3a8a"), Some(Rgb(30, 58, 138)));
        assert_eq!(Rgb::parse("FFFFFF"), Some(Rgb(255, 255, 255)));
        assert_eq!(Rgb::parse("#fff"), Some(Rgb(255, 255, 255)));
        assert_eq!(Rgb::parse("navy"), None);
        assert_eq!(Rgb::parse("#12345"), None);
    }

    #[test]
    fn layout_follows_orientation() {
        let mut config = CertificateConfig::default();
        let landscape = CertificateLayout::build(&config, "TS-001", &participant());
        assert!(landscape.width > landscape.height);

        config.orientation = Orientation::Portrait;
        let portrait = CertificateLayout::build(&config, "TS-001", &participant());
        assert!(portrait.height > portrait.width);
    }

    #[test]
    fn layout_includes_number_and_venue_when_enabled() {
        let config = CertificateConfig::default();
        let layout = CertificateLayout::build(&config, "TS-005", &participant());
        let texts: Vec<&str> = layout.lines.iter().map(|l| l.text.as_str()).collect();

        assert!(texts.contains(&"Certificate of Completion"));
        assert!(texts.contains(&"Ada Lovelace"));
        assert!(texts.contains(&"Certificate No. TS-005"));
        assert!(texts.contains(&"Minneapolis"));
    }

    #[test]
    fn layout_hides_disabled_lines() {
        let config = CertificateConfig {
            show_certificate_number: false,
            show_venue: false,
            ..Default::default()
        };
        let layout = CertificateLayout::build(&config, "TS-005", &participant());

        assert!(layout.lines.iter().all(|l| !l.text.contains("TS-005")));
        assert!(layout.lines.iter().all(|l| l.text != "Minneapolis"));
    }

    #[test]
    fn bad_colors_fall_back_to_defaults() {
        let config = CertificateConfig {
            accent_color: Some("not-a-color".into()),
            ..Default::default()
        };
        let layout = CertificateLayout::build(&config, "TS-005", &participant());
        assert_eq!(layout.accent, Rgb::NAVY);
    }

    #[tokio::test]
    async fn renders_both_artifacts() {
        let renderer = TemplateRenderer::new();
        let config = CertificateConfig::with_prefix("TS");

        let pdf = renderer
            .generate_pdf(&config, "TS-005", &participant())
            .await
            .unwrap();
        let png = renderer
            .generate_png(&config, "TS-005", &participant())
            .await
            .unwrap();

        assert!(pdf.starts_with(b"%PDF-"));
        assert!(png.starts_with(b"\x89PNG"));
    }
}
