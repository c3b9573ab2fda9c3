//! `tesseract` command-line backend.
//!
//! The image is piped to the binary as PNG on stdin and the word table is read
//! back as TSV from stdout. Only level-5 (word) rows are returned.

use crate::geometry::BoundingBox;
use crate::image::io::encode_png;
use crate::image::Image;
use crate::ocr::engine::{OcrEngine, OcrWord};
use crate::ocr::OcrConfig;
use crate::util::{VisionError, VisionResult};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const BINARY_NAME: &str = "tesseract";

/// Stderr fragments tesseract prints when traineddata cannot be loaded.
const MISSING_DATA_MARKERS: &[&str] = &["Failed loading language", "Error opening data file"];

#[cfg(windows)]
const WINDOWS_INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

/// Handle to a located `tesseract` executable.
#[derive(Clone, Debug)]
pub struct TesseractEngine {
    binary: PathBuf,
}

impl TesseractEngine {
    /// Locates `tesseract` on `PATH` (and the default install folders on Windows).
    pub fn locate() -> VisionResult<Self> {
        if let Ok(binary) = which::which(BINARY_NAME) {
            return Ok(Self { binary });
        }
        #[cfg(windows)]
        for candidate in WINDOWS_INSTALL_PATHS {
            let path = Path::new(candidate);
            if path.is_file() {
                return Ok(Self {
                    binary: path.to_path_buf(),
                });
            }
        }
        Err(VisionError::EngineUnavailable {
            reason: format!("`{BINARY_NAME}` not found on PATH"),
        })
    }

    /// Uses an explicit executable path.
    pub fn with_binary<P: AsRef<Path>>(path: P) -> VisionResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(VisionError::EngineUnavailable {
                reason: format!("{} does not exist", path.display()),
            });
        }
        Ok(Self {
            binary: path.to_path_buf(),
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn args(cfg: &OcrConfig) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            cfg.language.clone(),
            "--psm".to_string(),
            cfg.psm.code().to_string(),
        ];
        if let Some(whitelist) = &cfg.char_whitelist {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={whitelist}"));
        }
        args.push("tsv".to_string());
        args
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &Image, cfg: &OcrConfig) -> VisionResult<Vec<OcrWord>> {
        let png = encode_png(image)?;
        let mut child = Command::new(&self.binary)
            .args(Self::args(cfg))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    VisionError::EngineUnavailable {
                        reason: format!("{}: {err}", self.binary.display()),
                    }
                }
                _ => VisionError::Engine {
                    reason: format!("failed to start {}: {err}", self.binary.display()),
                },
            })?;

        // Tesseract reads all of stdin before writing, so a blocking write is safe.
        let write_result = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&png),
            None => Ok(()),
        };
        let output = child.wait_with_output().map_err(|err| VisionError::Engine {
            reason: err.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if MISSING_DATA_MARKERS.iter().any(|m| stderr.contains(m)) {
                return Err(VisionError::EngineUnavailable {
                    reason: format!(
                        "language data for {:?} missing: {}",
                        cfg.language,
                        stderr.trim()
                    ),
                });
            }
            return Err(VisionError::Engine {
                reason: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            });
        }
        write_result.map_err(|err| VisionError::Engine {
            reason: format!("failed to stream image to tesseract: {err}"),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_tsv(&stdout)
    }
}

/// Parses tesseract's TSV word table.
pub(crate) fn parse_tsv(tsv: &str) -> VisionResult<Vec<OcrWord>> {
    let mut lines = tsv.lines();
    let header = lines.next().unwrap_or_default();
    let columns: Vec<&str> = header.split('\t').collect();
    let col = |name: &str| {
        columns
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| VisionError::Engine {
                reason: format!("tsv output lacks column {name:?}"),
            })
    };
    let level = col("level")?;
    let left = col("left")?;
    let top = col("top")?;
    let width = col("width")?;
    let height = col("height")?;
    let conf = col("conf")?;
    let text = col("text")?;

    let mut words = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.get(level).copied() != Some("5") {
            continue;
        }
        let field = |idx: usize| {
            fields.get(idx).copied().ok_or_else(|| VisionError::Engine {
                reason: format!("tsv row {} is truncated", line_no + 2),
            })
        };
        let int = |idx: usize| -> VisionResult<i64> {
            field(idx)?.trim().parse().map_err(|_| VisionError::Engine {
                reason: format!("tsv row {} has a non-numeric box", line_no + 2),
            })
        };
        let confidence: f32 = field(conf)?.trim().parse().map_err(|_| VisionError::Engine {
            reason: format!("tsv row {} has a non-numeric confidence", line_no + 2),
        })?;
        words.push(OcrWord {
            text: fields.get(text).copied().unwrap_or_default().to_string(),
            bbox: BoundingBox::new(
                int(left)? as i32,
                int(top)? as i32,
                int(width)?.max(0) as u32,
                int(height)?.max(0) as u32,
            ),
            confidence,
        });
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::PageSegMode;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t200\t60\t-1\t
4\t1\t1\t1\t1\t0\t12\t10\t120\t24\t-1\t
5\t1\t1\t1\t1\t1\t12\t10\t54\t24\t96.5\tLogin
5\t1\t1\t1\t1\t2\t72\t11\t60\t23\t91\there
";

    #[test]
    fn parses_word_rows_only() {
        let words = parse_tsv(SAMPLE).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Login");
        assert_eq!(words[0].bbox, BoundingBox::new(12, 10, 54, 24));
        assert!((words[0].confidence - 96.5).abs() < 1e-6);
        assert_eq!(words[1].text, "here");
    }

    #[test]
    fn missing_columns_are_engine_errors() {
        let err = parse_tsv("level\tleft\n5\t1\n").unwrap_err();
        assert!(matches!(err, VisionError::Engine { .. }));
    }

    #[test]
    fn args_carry_language_psm_and_whitelist() {
        let cfg = OcrConfig {
            language: "deu".to_string(),
            psm: PageSegMode::SingleLine,
            char_whitelist: Some("0123456789".to_string()),
            ..OcrConfig::default()
        };
        let args = TesseractEngine::args(&cfg);
        assert_eq!(
            args,
            vec![
                "stdin",
                "stdout",
                "-l",
                "deu",
                "--psm",
                "7",
                "-c",
                "tessedit_char_whitelist=0123456789",
                "tsv"
            ]
        );
    }

    #[test]
    fn explicit_missing_binary_is_unavailable() {
        let err = TesseractEngine::with_binary("/nonexistent/tesseract-bin").unwrap_err();
        assert!(matches!(err, VisionError::EngineUnavailable { .. }));
    }
}
