//! Figure dimensions and unit conversion.
//!
//! Raster capture only understands pixels, the plot exporter takes physical
//! units natively. Every conversion goes through inches:
//! `pixels = inches * dpi`, `inches = pixels / dpi`.

use crate::error::{PlotaidError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const CM_PER_INCH: f64 = 2.54;
const MM_PER_INCH: f64 = 25.4;

/// Length unit for figure width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    In,
    Cm,
    Mm,
    Px,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Cm => "cm",
            Self::Mm => "mm",
            Self::Px => "px",
        }
    }

    pub fn is_physical(self) -> bool {
        !matches!(self, Self::Px)
    }

    /// Converts a length in this unit to inches.
    fn to_inches(self, value: f64, dpi: f64) -> f64 {
        match self {
            Self::In => value,
            Self::Cm => value / CM_PER_INCH,
            Self::Mm => value / MM_PER_INCH,
            Self::Px => value / dpi,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = PlotaidError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" | "inch" | "inches" => Ok(Self::In),
            "cm" => Ok(Self::Cm),
            "mm" => Ok(Self::Mm),
            "px" | "pixel" | "pixels" => Ok(Self::Px),
            other => Err(PlotaidError::Validation(format!(
                "Unknown unit '{other}' (expected in, cm, mm or px)"
            ))),
        }
    }
}

/// Pixel dimensions handed to the raster capture backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

/// Width, height, unit and resolution for one save call, plus options the
/// writer forwards to the backend without interpreting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
    pub dpi: f64,
    pub extra: BTreeMap<String, String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 7.0,
            height: 5.0,
            unit: Unit::In,
            dpi: 300.0,
            extra: BTreeMap::new(),
        }
    }
}

impl RenderOptions {
    pub fn new(width: f64, height: f64, unit: Unit) -> Self {
        Self {
            width,
            height,
            unit,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Rejects non-positive or non-finite sizes and resolutions.
    ///
    /// # Errors
    ///
    /// Returns [`PlotaidError::Validation`] naming the offending value.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [("width", self.width), ("height", self.height), ("dpi", self.dpi)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlotaidError::Validation(format!(
                    "Figure {label} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Width and height in inches.
    pub fn inches(&self) -> (f64, f64) {
        (
            self.unit.to_inches(self.width, self.dpi),
            self.unit.to_inches(self.height, self.dpi),
        )
    }

    /// Pixel dimensions for raster capture, rounded to the nearest pixel.
    ///
    /// # Errors
    ///
    /// Fails when the options do not pass [`RenderOptions::validate`].
    pub fn pixels(&self) -> Result<PixelSize> {
        self.validate()?;
        let (w, h) = self.inches();
        Ok(PixelSize {
            width: to_pixel_count(w * self.dpi),
            height: to_pixel_count(h * self.dpi),
        })
    }

    /// Options for the plot exporter: physical units pass through untouched,
    /// pixel sizes are converted to inches.
    ///
    /// # Errors
    ///
    /// Fails when the options do not pass [`RenderOptions::validate`].
    pub fn for_export(&self) -> Result<Self> {
        self.validate()?;
        if self.unit.is_physical() {
            return Ok(self.clone());
        }
        let (width, height) = self.inches();
        Ok(Self {
            width,
            height,
            unit: Unit::In,
            dpi: self.dpi,
            extra: self.extra.clone(),
        })
    }
}

fn to_pixel_count(value: f64) -> u32 {
    value.round().max(1.0).min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inches_to_pixels() {
        let opts = RenderOptions::new(7.0, 5.0, Unit::In).with_dpi(300.0);
        let px = opts.pixels().unwrap();
        assert_eq!(px, PixelSize { width: 2100, height: 1500 });
    }

    #[test]
    fn test_centimetres_round_through_inches() {
        let opts = RenderOptions::new(2.54, 5.08, Unit::Cm).with_dpi(96.0);
        let px = opts.pixels().unwrap();
        assert_eq!(px, PixelSize { width: 96, height: 192 });
    }

    #[test]
    fn test_millimetres_to_inches() {
        let opts = RenderOptions::new(254.0, 127.0, Unit::Mm);
        let (w, h) = opts.inches();
        assert!((w - 10.0).abs() < 1e-9);
        assert!((h - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_pixels_unchanged_for_capture() {
        let opts = RenderOptions::new(800.0, 600.0, Unit::Px).with_dpi(72.0);
        assert_eq!(opts.pixels().unwrap(), PixelSize { width: 800, height: 600 });
    }

    #[test]
    fn test_export_passes_physical_units_through() {
        let opts = RenderOptions::new(12.0, 8.0, Unit::Cm).with_extra("bg", "white");
        let export = opts.for_export().unwrap();
        assert_eq!(export, opts);
    }

    #[test]
    fn test_export_converts_pixels_to_inches() {
        let opts = RenderOptions::new(600.0, 300.0, Unit::Px).with_dpi(150.0);
        let export = opts.for_export().unwrap();
        assert_eq!(export.unit, Unit::In);
        assert!((export.width - 4.0).abs() < 1e-9);
        assert!((export.height - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_zero_dpi() {
        let opts = RenderOptions::new(7.0, 5.0, Unit::In).with_dpi(0.0);
        assert!(matches!(opts.pixels(), Err(PlotaidError::Validation(_))));
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("CM".parse::<Unit>().unwrap(), Unit::Cm);
        assert_eq!("inches".parse::<Unit>().unwrap(), Unit::In);
        assert!("furlong".parse::<Unit>().is_err());
    }
}
