//! Iris-based identity verification and search.
//!
//! Given a raw eye image, this crate locates the pupil and iris borders,
//! resamples the annulus between them into a canonical 128x256 template, and
//! compares templates with rotation-tolerant strategies to answer three
//! queries against an enrolled collection: authorize a claimed identity,
//! identify an unknown probe, and rank the closest matches.
//!
//! Localization, normalization, and comparison are each a closed set of
//! interchangeable strategies selected by configuration at engine
//! construction; see [`RecognitionEngine`]. Optional parallelism is available
//! via the `rayon` feature and byte-level image decoding via `image-io`.

pub mod compare;
pub mod engine;
pub mod image;
pub mod localize;
pub mod normalize;
mod trace;
pub mod util;

pub use compare::{
    Comparator, ComparatorConfig, Compare, CorrelationComparator, CorrelationConfig,
    KeypointComparator, KeypointConfig, PhaseCodeComparator, PhaseCodeConfig,
};
pub use engine::{
    EngineConfig, EnrolledTemplate, MatchResult, PlainCodec, RecognitionEngine, TemplateCodec,
};
pub use image::pyramid::ImagePyramid;
pub use image::{ImageView, OwnedImage};
pub use localize::{
    AccumulatorConfig, AccumulatorLocalizer, Border, IntegroConfig, IntegroLocalizer, IrisBorders,
    Localize, Localizer, LocalizerConfig, SearchParams,
};
pub use normalize::{
    NormalizeConfig, NormalizeMode, NormalizedTemplate, Normalizer, NORMALIZED_COLS,
    NORMALIZED_ROWS,
};
pub use util::{IrisMatchError, IrisMatchResult};
