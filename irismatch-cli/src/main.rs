use clap::Parser;
use irismatch::image::io::load_intensity;
use irismatch::{
    AccumulatorConfig, Comparator, ComparatorConfig, Compare, CorrelationConfig, EngineConfig,
    EnrolledTemplate, IntegroConfig, KeypointConfig, Localize, Localizer, LocalizerConfig,
    NormalizeConfig, NormalizeMode, PhaseCodeConfig, RecognitionEngine, SearchParams,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "irismatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for pipeline introspection.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OperationConfig {
    Localize,
    Compare,
    Authorize,
    Identify,
    Find,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LocalizerKind {
    Integro,
    Accumulator,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ComparatorKind {
    PhaseCode,
    Correlation,
    Keypoint,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum NormalizeModeConfig {
    Concentric,
    Eccentric,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct EngineConfigJson {
    localizer: LocalizerKind,
    comparator: ComparatorKind,
    normalize_mode: NormalizeModeConfig,
    shared_center: bool,
    min_radius: i32,
    max_radius: i32,
    threshold: u8,
    edge_margin: i32,
    parallel: bool,
}

impl Default for EngineConfigJson {
    fn default() -> Self {
        let search = SearchParams::default();
        Self {
            localizer: LocalizerKind::Accumulator,
            comparator: ComparatorKind::PhaseCode,
            normalize_mode: NormalizeModeConfig::Eccentric,
            shared_center: false,
            min_radius: search.min_radius,
            max_radius: search.max_radius,
            threshold: search.threshold,
            edge_margin: search.edge_margin,
            parallel: false,
        }
    }
}

impl EngineConfigJson {
    fn search_params(&self) -> SearchParams {
        SearchParams {
            min_radius: self.min_radius,
            max_radius: self.max_radius,
            threshold: self.threshold,
            edge_margin: self.edge_margin,
        }
    }

    fn build(&self) -> EngineConfig {
        let localizer = match self.localizer {
            LocalizerKind::Integro => LocalizerConfig::Integro(IntegroConfig {
                search: self.search_params(),
                ..IntegroConfig::default()
            }),
            LocalizerKind::Accumulator => LocalizerConfig::Accumulator(AccumulatorConfig {
                search: self.search_params(),
                shared_center: self.shared_center,
            }),
        };
        let comparator = match self.comparator {
            ComparatorKind::PhaseCode => ComparatorConfig::PhaseCode(PhaseCodeConfig::default()),
            ComparatorKind::Correlation => {
                ComparatorConfig::Correlation(CorrelationConfig::default())
            }
            ComparatorKind::Keypoint => ComparatorConfig::Keypoint(KeypointConfig::default()),
        };
        let normalizer = NormalizeConfig {
            mode: match self.normalize_mode {
                NormalizeModeConfig::Concentric => NormalizeMode::Concentric,
                NormalizeModeConfig::Eccentric => NormalizeMode::Eccentric,
            },
        };
        EngineConfig {
            localizer,
            normalizer,
            comparator,
            parallel: self.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GalleryEntry {
    identity: String,
    image_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    operation: Option<OperationConfig>,
    probe_path: String,
    /// Second image for the `compare` operation.
    template_path: String,
    gallery: Vec<GalleryEntry>,
    output_path: Option<String>,
    engine: EngineConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operation: None,
            probe_path: String::new(),
            template_path: String::new(),
            gallery: Vec::new(),
            output_path: None,
            engine: EngineConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BorderRecord {
    x: i32,
    y: i32,
    r: i32,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    identity: String,
    score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Output {
    Borders {
        inner: BorderRecord,
        outer: BorderRecord,
    },
    Score {
        score: f64,
    },
    Authorized {
        authorized: bool,
    },
    Identified {
        identity: Option<String>,
    },
    Matches {
        matches: Vec<MatchRecord>,
    },
}

fn enroll_gallery(
    engine: &RecognitionEngine,
    gallery: &[GalleryEntry],
) -> Result<Vec<EnrolledTemplate<String>>, Box<dyn std::error::Error>> {
    let mut enrolled = Vec::with_capacity(gallery.len());
    for entry in gallery {
        let bytes = fs::read(&entry.image_path)?;
        let code = engine.enroll(&bytes)?;
        enrolled.push(EnrolledTemplate::new(entry.identity.clone(), code));
    }
    Ok(enrolled)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("irismatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    let Some(operation) = config.operation else {
        return Err("operation must be set in the config".into());
    };
    if config.probe_path.is_empty() {
        return Err("probe_path must be set in the config".into());
    }

    let engine = RecognitionEngine::new(config.engine.build());
    let probe_bytes = fs::read(&config.probe_path)?;

    let output = match operation {
        OperationConfig::Localize => {
            let image = load_intensity(&config.probe_path)?;
            let localizer = Localizer::new(config.engine.build().localizer);
            let borders = localizer.localize(image.view())?;
            Output::Borders {
                inner: BorderRecord {
                    x: borders.inner.x,
                    y: borders.inner.y,
                    r: borders.inner.r,
                },
                outer: BorderRecord {
                    x: borders.outer.x,
                    y: borders.outer.y,
                    r: borders.outer.r,
                },
            }
        }
        OperationConfig::Compare => {
            if config.template_path.is_empty() {
                return Err("template_path must be set for the compare operation".into());
            }
            let probe = engine.create_template(&probe_bytes)?;
            let template = engine.create_template(&fs::read(&config.template_path)?)?;
            let comparator = Comparator::new(config.engine.build().comparator);
            Output::Score {
                score: comparator.compare(&probe, &template),
            }
        }
        OperationConfig::Authorize => {
            let enrolled = enroll_gallery(&engine, &config.gallery)?;
            Output::Authorized {
                authorized: engine.authorize(&enrolled, &probe_bytes)?,
            }
        }
        OperationConfig::Identify => {
            let enrolled = enroll_gallery(&engine, &config.gallery)?;
            Output::Identified {
                identity: engine.identify(&enrolled, &probe_bytes)?,
            }
        }
        OperationConfig::Find => {
            let enrolled = enroll_gallery(&engine, &config.gallery)?;
            let matches = engine
                .find(&enrolled, &probe_bytes)?
                .into_iter()
                .map(|m| MatchRecord {
                    identity: m.identity,
                    score: m.score,
                })
                .collect();
            Output::Matches { matches }
        }
    };

    let json = serde_json::to_string_pretty(&output)?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
