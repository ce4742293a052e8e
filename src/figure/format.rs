//! File types and the per-mode format whitelists.

use crate::error::{PlotaidError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output encodings understood by at least one export mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Svg,
    Pdf,
    Eps,
    Ps,
    Tex,
}

impl FileType {
    /// Extension written to disk (without the dot).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::Eps => "eps",
            Self::Ps => "ps",
            Self::Tex => "tex",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileType {
    type Err = PlotaidError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match lowered.as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "tiff" | "tif" => Ok(Self::Tiff),
            "bmp" => Ok(Self::Bmp),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            "eps" => Ok(Self::Eps),
            "ps" => Ok(Self::Ps),
            "tex" => Ok(Self::Tex),
            _ => Err(PlotaidError::UnsupportedFormat {
                format: s.to_owned(),
                mode: "any export mode",
            }),
        }
    }
}

/// How the figure reaches the file.
///
/// Each mode has one fixed whitelist. Capturing the active surface copies
/// whatever the device shows, so only encodings a display device can be
/// copied into are allowed there; the plot exporter additionally writes the
/// PostScript family and TeX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    RasterCapture,
    VectorExport,
}

const CAPTURE_FORMATS: &[FileType] = &[
    FileType::Png,
    FileType::Jpeg,
    FileType::Tiff,
    FileType::Bmp,
    FileType::Svg,
    FileType::Pdf,
];

const EXPORT_FORMATS: &[FileType] = &[
    FileType::Png,
    FileType::Jpeg,
    FileType::Tiff,
    FileType::Bmp,
    FileType::Svg,
    FileType::Pdf,
    FileType::Eps,
    FileType::Ps,
    FileType::Tex,
];

impl ExportMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::RasterCapture => "raster capture",
            Self::VectorExport => "plot export",
        }
    }

    pub fn allowed_formats(self) -> &'static [FileType] {
        match self {
            Self::RasterCapture => CAPTURE_FORMATS,
            Self::VectorExport => EXPORT_FORMATS,
        }
    }

    /// # Errors
    ///
    /// Returns [`PlotaidError::UnsupportedFormat`] when `file_type` is not on
    /// this mode's whitelist.
    pub fn check(self, file_type: FileType) -> Result<()> {
        if self.allowed_formats().contains(&file_type) {
            Ok(())
        } else {
            Err(PlotaidError::UnsupportedFormat {
                format: file_type.extension().to_owned(),
                mode: self.name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_whitelist() {
        let allowed: Vec<&str> = ExportMode::RasterCapture
            .allowed_formats()
            .iter()
            .map(|f| f.extension())
            .collect();
        assert_eq!(allowed, ["png", "jpeg", "tiff", "bmp", "svg", "pdf"]);
    }

    #[test]
    fn test_export_whitelist_extends_capture() {
        for format in ExportMode::RasterCapture.allowed_formats() {
            assert!(ExportMode::VectorExport.check(*format).is_ok());
        }
        for format in [FileType::Eps, FileType::Ps, FileType::Tex] {
            assert!(ExportMode::VectorExport.check(format).is_ok());
            let err = ExportMode::RasterCapture.check(format).unwrap_err();
            assert!(matches!(
                err,
                PlotaidError::UnsupportedFormat { mode: "raster capture", .. }
            ));
        }
    }

    #[test]
    fn test_aliases_and_case() {
        assert_eq!("JPG".parse::<FileType>().unwrap(), FileType::Jpeg);
        assert_eq!(".tif".parse::<FileType>().unwrap(), FileType::Tiff);
        assert_eq!("Pdf".parse::<FileType>().unwrap(), FileType::Pdf);
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let err = "gif".parse::<FileType>().unwrap_err();
        assert!(err.to_string().contains("'gif'"));
    }
}
