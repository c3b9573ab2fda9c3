use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use visverify::image::io::{open, save};
use visverify::{
    Comparator, CompareConfig, ComparisonResult, ConfidenceScale, Image, MatchConfig,
    MatchLocation, Matcher, Method, OcrConfig, PageSegMode, TesseractEngine, TextExtractor,
    VisionError, WaitConfig, WaitOutcome,
};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "visverify CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for scores, attempts and timings.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaskConfig {
    #[default]
    Compare,
    Find,
    Ocr,
    Wait,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MethodConfig {
    Ssim,
    Mse,
    Histogram,
}

impl From<MethodConfig> for Method {
    fn from(value: MethodConfig) -> Self {
        match value {
            MethodConfig::Ssim => Method::Ssim,
            MethodConfig::Mse => Method::Mse,
            MethodConfig::Histogram => Method::Histogram,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PsmConfig {
    Auto,
    SingleColumn,
    SingleBlock,
    SingleLine,
    SingleWord,
    SparseText,
}

impl From<PsmConfig> for PageSegMode {
    fn from(value: PsmConfig) -> Self {
        match value {
            PsmConfig::Auto => PageSegMode::Auto,
            PsmConfig::SingleColumn => PageSegMode::SingleColumn,
            PsmConfig::SingleBlock => PageSegMode::SingleBlock,
            PsmConfig::SingleLine => PageSegMode::SingleLine,
            PsmConfig::SingleWord => PageSegMode::SingleWord,
            PsmConfig::SparseText => PageSegMode::SparseText,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RegionJson {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl From<RegionJson> for visverify::BoundingBox {
    fn from(value: RegionJson) -> Self {
        visverify::BoundingBox::new(value.x, value.y, value.width, value.height)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CompareConfigJson {
    method: MethodConfig,
    threshold: f64,
    ssim_window: usize,
    histogram_bins: usize,
    aspect_tolerance: f64,
    diff_mask_path: Option<String>,
}

impl Default for CompareConfigJson {
    fn default() -> Self {
        let cfg = CompareConfig::default();
        Self {
            method: MethodConfig::Ssim,
            threshold: 0.95,
            ssim_window: cfg.ssim_window,
            histogram_bins: cfg.histogram_bins,
            aspect_tolerance: cfg.aspect_tolerance,
            diff_mask_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FindConfigJson {
    confidence_threshold: f32,
    max_results: usize,
    nms_radius: Option<usize>,
}

impl Default for FindConfigJson {
    fn default() -> Self {
        let cfg = MatchConfig::default();
        Self {
            confidence_threshold: cfg.confidence_threshold,
            max_results: 1,
            nms_radius: cfg.nms_radius,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OcrConfigJson {
    language: String,
    psm: PsmConfig,
    preprocess: bool,
    confidence_floor: f32,
    char_whitelist: Option<String>,
    tesseract_path: Option<String>,
    target_text: Option<String>,
    case_sensitive: bool,
    numbers: bool,
    region: Option<RegionJson>,
}

impl Default for OcrConfigJson {
    fn default() -> Self {
        let cfg = OcrConfig::default();
        Self {
            language: cfg.language,
            psm: PsmConfig::SingleBlock,
            preprocess: cfg.preprocess,
            confidence_floor: cfg.confidence_floor,
            char_whitelist: cfg.char_whitelist,
            tesseract_path: None,
            target_text: None,
            case_sensitive: false,
            numbers: false,
            region: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct WaitConfigJson {
    timeout_ms: u64,
    poll_interval_ms: u64,
    confidence_threshold: f32,
    target_text: Option<String>,
}

impl Default for WaitConfigJson {
    fn default() -> Self {
        let cfg = WaitConfig::default();
        Self {
            timeout_ms: cfg.timeout.as_millis() as u64,
            poll_interval_ms: cfg.poll_interval.as_millis() as u64,
            confidence_threshold: cfg.confidence_threshold,
            target_text: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    task: TaskConfig,
    /// Screenshot under test; re-read on every poll by the `wait` task.
    image_path: String,
    /// Baseline for `compare`, needle for `find` and `wait`.
    reference_path: Option<String>,
    output_path: Option<String>,
    compare: CompareConfigJson,
    find: FindConfigJson,
    ocr: OcrConfigJson,
    wait: WaitConfigJson,
}

#[derive(Debug, Serialize)]
struct LocationRecord {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    center_x: f64,
    center_y: f64,
    confidence: f32,
    scale: &'static str,
}

impl From<MatchLocation> for LocationRecord {
    fn from(value: MatchLocation) -> Self {
        let center = value.center();
        Self {
            x: value.bbox.x,
            y: value.bbox.y,
            width: value.bbox.width,
            height: value.bbox.height,
            center_x: center.x,
            center_y: center.y,
            confidence: value.confidence,
            scale: match value.scale {
                ConfidenceScale::Unit => "unit",
                ConfidenceScale::Percent => "percent",
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenRecord {
    text: String,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    confidence: f32,
}

#[derive(Debug, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
enum Report {
    Compare {
        method: String,
        similarity: f64,
        threshold: f64,
        is_match: bool,
        diff_mask_path: Option<String>,
    },
    Find {
        best: Option<LocationRecord>,
        matches: Vec<LocationRecord>,
    },
    Ocr {
        text: String,
        tokens: Vec<TokenRecord>,
        numbers: Option<Vec<String>>,
        target: Option<LocationRecord>,
    },
    Wait {
        found: bool,
        attempts: usize,
        elapsed_ms: u64,
        location: Option<LocationRecord>,
    },
}

impl From<ComparisonResult> for Report {
    fn from(value: ComparisonResult) -> Self {
        Report::Compare {
            method: value.method.to_string(),
            similarity: value.similarity,
            threshold: value.threshold,
            is_match: value.is_match,
            diff_mask_path: None,
        }
    }
}

impl From<WaitOutcome> for Report {
    fn from(value: WaitOutcome) -> Self {
        Report::Wait {
            found: value.is_found(),
            attempts: value.attempts,
            elapsed_ms: value.elapsed.as_millis() as u64,
            location: value.location.map(LocationRecord::from),
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("visverify=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() {
        return Err("image_path must be set in the config".into());
    }

    let report = match config.task {
        TaskConfig::Compare => run_compare(&config)?,
        TaskConfig::Find => run_find(&config)?,
        TaskConfig::Ocr => run_ocr(&config)?,
        TaskConfig::Wait => run_wait(&config)?,
    };
    let json = serde_json::to_string_pretty(&report)?;

    match &config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

fn reference(config: &Config) -> CliResult<Image> {
    match &config.reference_path {
        Some(path) => Ok(open(path)?),
        None => Err(format!("reference_path is required for the {:?} task", config.task).into()),
    }
}

fn run_compare(config: &Config) -> CliResult<Report> {
    let image = open(&config.image_path)?;
    let baseline = reference(config)?;
    let cmp = &config.compare;
    let comparator = Comparator::new(CompareConfig {
        ssim_window: cmp.ssim_window,
        histogram_bins: cmp.histogram_bins,
        aspect_tolerance: cmp.aspect_tolerance,
        with_diff_mask: cmp.diff_mask_path.is_some(),
    });
    let mut result = comparator.compare(&baseline, &image, cmp.method.into(), cmp.threshold)?;

    let mask = result.diff_mask.take();
    let mut report = Report::from(result);
    if let (Some(mask), Some(path)) = (mask, &cmp.diff_mask_path) {
        save(&mask, path)?;
        if let Report::Compare { diff_mask_path, .. } = &mut report {
            *diff_mask_path = Some(path.clone());
        }
    }
    Ok(report)
}

fn run_find(config: &Config) -> CliResult<Report> {
    let haystack = open(&config.image_path)?;
    let needle = reference(config)?;
    if config.find.max_results == 0 {
        return Err("find.max_results must be at least 1".into());
    }
    let matcher = Matcher::new(&needle).with_config(MatchConfig {
        confidence_threshold: config.find.confidence_threshold,
        max_results: config.find.max_results,
        nms_radius: config.find.nms_radius,
    });

    let matches = if config.find.max_results == 1 {
        matcher.find(&haystack)?.into_iter().collect()
    } else {
        matcher.find_all(&haystack)?
    };
    let best = matches.first().copied().map(LocationRecord::from);
    let matches = matches.into_iter().map(LocationRecord::from).collect();
    Ok(Report::Find { best, matches })
}

fn extractor(ocr: &OcrConfigJson) -> CliResult<TextExtractor<TesseractEngine>> {
    let engine = match &ocr.tesseract_path {
        Some(path) => TesseractEngine::with_binary(path)?,
        None => TesseractEngine::locate()?,
    };
    Ok(TextExtractor::new(engine).with_config(OcrConfig {
        language: ocr.language.clone(),
        psm: ocr.psm.into(),
        preprocess: ocr.preprocess,
        confidence_floor: ocr.confidence_floor,
        char_whitelist: ocr.char_whitelist.clone(),
    }))
}

fn run_ocr(config: &Config) -> CliResult<Report> {
    let ocr = &config.ocr;
    let extractor = extractor(ocr)?;
    let full = open(&config.image_path)?;
    let image = match ocr.region {
        Some(region) => full.crop(&region.into())?,
        None => full,
    };

    let tokens = extractor.extract_text_with_details(&image)?;
    let text = extractor.extract_text(&image)?;
    let numbers = if ocr.numbers {
        Some(extractor.extract_numbers(&image)?)
    } else {
        None
    };
    let target = match &ocr.target_text {
        Some(target) => extractor
            .find_text_location(&image, target, ocr.case_sensitive)?
            .map(LocationRecord::from),
        None => None,
    };

    Ok(Report::Ocr {
        text,
        tokens: tokens
            .into_iter()
            .map(|t| TokenRecord {
                text: t.text,
                x: t.bbox.x,
                y: t.bbox.y,
                width: t.bbox.width,
                height: t.bbox.height,
                confidence: t.confidence,
            })
            .collect(),
        numbers,
        target,
    })
}

fn run_wait(config: &Config) -> CliResult<Report> {
    let cfg = WaitConfig {
        timeout: Duration::from_millis(config.wait.timeout_ms),
        poll_interval: Duration::from_millis(config.wait.poll_interval_ms),
        confidence_threshold: config.wait.confidence_threshold,
    };
    let capture = || -> Result<Image, VisionError> { open(&config.image_path) };

    if let Some(target) = &config.wait.target_text {
        let extractor = extractor(&config.ocr)?;
        let outcome = visverify::wait_for_text_outcome(
            &extractor,
            target,
            config.ocr.case_sensitive,
            capture,
            &cfg,
        )?;
        tracing::info!(
            attempts = outcome.attempts,
            found = outcome.is_found(),
            target = target.as_str(),
            "text wait finished"
        );
        return Ok(Report::from(outcome));
    }

    let needle = reference(config)?;
    let outcome = visverify::wait_for_image_outcome(&needle, capture, &cfg)?;
    tracing::info!(
        attempts = outcome.attempts,
        found = outcome.is_found(),
        "image wait finished"
    );
    Ok(Report::from(outcome))
}
