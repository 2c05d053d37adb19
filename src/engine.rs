//! Recognition engine: authorize, identify, and find.
//!
//! The engine wires one localizer, one normalizer, and one comparator
//! (selected by configuration at construction) and runs them against an
//! ordered collection of enrolled templates supplied by the caller. Enrolled
//! bytes pass through a [`TemplateCodec`] so storage can encrypt them without
//! the core inspecting the layout. All operations are deterministic and a
//! codec failure aborts the whole scan rather than skipping the bad record.

use crate::compare::{Comparator, ComparatorConfig, Compare};
use crate::image::ImageView;
use crate::localize::{Localize, Localizer, LocalizerConfig};
use crate::normalize::{NormalizeConfig, NormalizedTemplate, Normalizer};
use crate::trace::{trace_event, trace_span};
use crate::util::{IrisMatchError, IrisMatchResult};

/// Maximum number of results returned by `find`.
const FIND_LIMIT: usize = 3;

/// Codec seam for enrolled template bytes.
///
/// Implementations must round-trip the exact 128x256 template shape; the
/// core never inspects the encoded layout.
pub trait TemplateCodec {
    /// Encodes a template into storage bytes.
    fn encode(&self, template: &NormalizedTemplate) -> IrisMatchResult<Vec<u8>>;
    /// Decodes storage bytes back into a template.
    fn decode(&self, bytes: &[u8]) -> IrisMatchResult<NormalizedTemplate>;
}

/// Identity codec passing raw template samples through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCodec;

impl TemplateCodec for PlainCodec {
    fn encode(&self, template: &NormalizedTemplate) -> IrisMatchResult<Vec<u8>> {
        Ok(template.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> IrisMatchResult<NormalizedTemplate> {
        NormalizedTemplate::from_bytes(bytes.to_vec()).map_err(|err| IrisMatchError::Codec {
            reason: err.to_string(),
        })
    }
}

/// One enrolled record: an identity and its encoded template bytes.
#[derive(Debug, Clone)]
pub struct EnrolledTemplate<I> {
    /// The identity the template belongs to.
    pub identity: I,
    /// Codec-encoded template bytes.
    pub code: Vec<u8>,
}

impl<I> EnrolledTemplate<I> {
    /// Creates an enrolled record.
    pub fn new(identity: I, code: Vec<u8>) -> Self {
        Self { identity, code }
    }
}

/// One ranked match produced by `find`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<I> {
    /// The matched identity.
    pub identity: I,
    /// The comparison score; lower is better.
    pub score: f64,
}

/// Engine configuration: one strategy per pipeline stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    /// Border localization strategy.
    pub localizer: LocalizerConfig,
    /// Polar normalization mode.
    pub normalizer: NormalizeConfig,
    /// Template comparison strategy.
    pub comparator: ComparatorConfig,
    /// Score the enrolled collection in parallel during `find` (requires the
    /// `rayon` feature; ranking is unaffected).
    pub parallel: bool,
}

/// The recognition engine.
pub struct RecognitionEngine<C = PlainCodec> {
    localizer: Localizer,
    normalizer: Normalizer,
    comparator: Comparator,
    codec: C,
    parallel: bool,
}

impl RecognitionEngine<PlainCodec> {
    /// Builds an engine with the raw-byte codec.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_codec(config, PlainCodec)
    }
}

impl<C: TemplateCodec> RecognitionEngine<C> {
    /// Builds an engine with an external template codec.
    pub fn with_codec(config: EngineConfig, codec: C) -> Self {
        Self {
            localizer: Localizer::new(config.localizer),
            normalizer: Normalizer::new(config.normalizer),
            comparator: Comparator::new(config.comparator),
            codec,
            parallel: config.parallel,
        }
    }

    /// Localizes and normalizes a decoded probe image into a template.
    pub fn probe_from_view(&self, image: ImageView<'_, u8>) -> IrisMatchResult<NormalizedTemplate> {
        let _guard = trace_span!("probe_template").entered();
        let borders = self.localizer.localize(image)?;
        Ok(self.normalizer.normalize(image, &borders))
    }

    /// Verifies a claimed identity: true on the first enrolled template the
    /// comparator authorizes against the probe.
    ///
    /// Short-circuits on the first hit, so the order of `enrolled` affects
    /// latency but not the outcome.
    pub fn authorize_view<I>(
        &self,
        enrolled: &[EnrolledTemplate<I>],
        image: ImageView<'_, u8>,
    ) -> IrisMatchResult<bool> {
        let _guard = trace_span!("authorize").entered();
        let probe = self.probe_from_view(image)?;
        for record in enrolled {
            let template = self.codec.decode(&record.code)?;
            if self.comparator.authorize(&probe, &template) {
                trace_event!("authorize_hit");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Identifies an unknown probe: the identity of the first enrolled
    /// template (in collection order) the comparator authorizes, or `None`.
    ///
    /// First-match semantics, not best-match: a later template with a better
    /// score does not override an earlier hit.
    pub fn identify_view<I: Clone>(
        &self,
        enrolled: &[EnrolledTemplate<I>],
        image: ImageView<'_, u8>,
    ) -> IrisMatchResult<Option<I>> {
        let _guard = trace_span!("identify").entered();
        let probe = self.probe_from_view(image)?;
        for record in enrolled {
            let template = self.codec.decode(&record.code)?;
            if self.comparator.authorize(&probe, &template) {
                return Ok(Some(record.identity.clone()));
            }
        }
        Ok(None)
    }

    /// Ranks the closest matches: up to three results sorted ascending by
    /// score (best first).
    ///
    /// Retention is online: each time the running list reaches four entries
    /// it is sorted and the worst entry dropped, so only the three best
    /// scores seen so far are kept.
    pub fn find_view<I>(
        &self,
        enrolled: &[EnrolledTemplate<I>],
        image: ImageView<'_, u8>,
    ) -> IrisMatchResult<Vec<MatchResult<I>>>
    where
        I: Clone + Sync,
        C: Sync,
    {
        let _guard = trace_span!("find").entered();
        let probe = self.probe_from_view(image)?;
        let scores = self.collection_scores(&probe, enrolled)?;

        let mut results: Vec<MatchResult<I>> = Vec::new();
        for (record, score) in enrolled.iter().zip(scores) {
            results.push(MatchResult {
                identity: record.identity.clone(),
                score,
            });
            if results.len() > FIND_LIMIT {
                results.sort_by(|a, b| a.score.total_cmp(&b.score));
                results.pop();
            }
        }
        results.sort_by(|a, b| a.score.total_cmp(&b.score));

        trace_event!("find_results", count = results.len());
        Ok(results)
    }

    fn collection_scores<I>(
        &self,
        probe: &NormalizedTemplate,
        enrolled: &[EnrolledTemplate<I>],
    ) -> IrisMatchResult<Vec<f64>>
    where
        I: Sync,
        C: Sync,
    {
        #[cfg(feature = "rayon")]
        if self.parallel {
            use rayon::prelude::*;
            return enrolled
                .par_iter()
                .map(|record| {
                    let template = self.codec.decode(&record.code)?;
                    Ok(self.comparator.compare(probe, &template))
                })
                .collect();
        }

        let _ = self.parallel;
        enrolled
            .iter()
            .map(|record| {
                let template = self.codec.decode(&record.code)?;
                Ok(self.comparator.compare(probe, &template))
            })
            .collect()
    }
}

#[cfg(feature = "image-io")]
impl<C: TemplateCodec> RecognitionEngine<C> {
    /// Creates a normalized template from encoded image bytes.
    pub fn create_template(&self, image_bytes: &[u8]) -> IrisMatchResult<NormalizedTemplate> {
        let image = crate::image::io::decode_intensity(image_bytes)?;
        self.probe_from_view(image.view())
    }

    /// Enrollment helper: creates a template and encodes it for storage.
    pub fn enroll(&self, image_bytes: &[u8]) -> IrisMatchResult<Vec<u8>> {
        let template = self.create_template(image_bytes)?;
        self.codec.encode(&template)
    }

    /// Byte-level [`RecognitionEngine::authorize_view`].
    pub fn authorize<I>(
        &self,
        enrolled: &[EnrolledTemplate<I>],
        image_bytes: &[u8],
    ) -> IrisMatchResult<bool> {
        let image = crate::image::io::decode_intensity(image_bytes)?;
        self.authorize_view(enrolled, image.view())
    }

    /// Byte-level [`RecognitionEngine::identify_view`].
    pub fn identify<I: Clone>(
        &self,
        enrolled: &[EnrolledTemplate<I>],
        image_bytes: &[u8],
    ) -> IrisMatchResult<Option<I>> {
        let image = crate::image::io::decode_intensity(image_bytes)?;
        self.identify_view(enrolled, image.view())
    }

    /// Byte-level [`RecognitionEngine::find_view`].
    pub fn find<I>(
        &self,
        enrolled: &[EnrolledTemplate<I>],
        image_bytes: &[u8],
    ) -> IrisMatchResult<Vec<MatchResult<I>>>
    where
        I: Clone + Sync,
        C: Sync,
    {
        let image = crate::image::io::decode_intensity(image_bytes)?;
        self.find_view(enrolled, image.view())
    }
}
