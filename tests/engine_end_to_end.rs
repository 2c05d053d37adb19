use irismatch::{
    ComparatorConfig, CorrelationConfig, EngineConfig, EnrolledTemplate, IrisMatchError,
    NormalizedTemplate, OwnedImage, PlainCodec, RecognitionEngine, TemplateCodec,
};

/// Draws a schematic eye with a configurable iris intensity so probes with
/// different annulus textures normalize to measurably different templates.
fn synthetic_eye(size: usize, pupil_r: i32, iris_r: i32, iris_value: u8) -> OwnedImage {
    let center = size as i32 / 2;
    let mut data = vec![230u8; size * size];
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let dx = x - center;
            let dy = y - center;
            let dist_sq = dx * dx + dy * dy;
            let value = if dist_sq < pupil_r * pupil_r {
                10
            } else if dist_sq < iris_r * iris_r {
                iris_value
            } else {
                230
            };
            data[y as usize * size + x as usize] = value;
        }
    }
    OwnedImage::new(data, size, size).unwrap()
}

fn correlation_engine() -> RecognitionEngine {
    RecognitionEngine::new(EngineConfig {
        comparator: ComparatorConfig::Correlation(CorrelationConfig::default()),
        ..EngineConfig::default()
    })
}

fn enrolled_uniform(identity: &str, value: u8) -> EnrolledTemplate<String> {
    let template =
        NormalizedTemplate::from_bytes(vec![value; NormalizedTemplate::SAMPLES]).unwrap();
    let code = PlainCodec.encode(&template).unwrap();
    EnrolledTemplate::new(identity.to_string(), code)
}

#[test]
fn authorize_accepts_matching_probe_and_rejects_distant_one() {
    let engine = correlation_engine();
    let eye = synthetic_eye(200, 25, 60, 160);
    let template = engine.probe_from_view(eye.view()).unwrap();
    let enrolled = vec![EnrolledTemplate::new(
        "alice".to_string(),
        PlainCodec.encode(&template).unwrap(),
    )];

    assert!(engine.authorize_view(&enrolled, eye.view()).unwrap());

    // Same geometry, very different annulus intensity: outside threshold.
    let distant = synthetic_eye(200, 25, 60, 100);
    assert!(!engine.authorize_view(&enrolled, distant.view()).unwrap());
}

#[test]
fn identify_returns_first_match_in_collection_order() {
    let engine = correlation_engine();
    let eye = synthetic_eye(200, 25, 60, 160);
    let probe_template = engine.probe_from_view(eye.view()).unwrap();
    let matching_code = PlainCodec.encode(&probe_template).unwrap();

    let enrolled = vec![
        enrolled_uniform("far", 40),
        EnrolledTemplate::new("bob".to_string(), matching_code.clone()),
        EnrolledTemplate::new("carol".to_string(), matching_code),
    ];

    // Both bob and carol would authorize; the scan is first-match.
    let found = engine.identify_view(&enrolled, eye.view()).unwrap();
    assert_eq!(found.as_deref(), Some("bob"));
}

#[test]
fn identify_reports_no_match_on_distant_collection() {
    let engine = correlation_engine();
    let eye = synthetic_eye(200, 25, 60, 160);
    let enrolled = vec![enrolled_uniform("far", 40), enrolled_uniform("farther", 20)];
    let found = engine.identify_view(&enrolled, eye.view()).unwrap();
    assert_eq!(found, None);
}

#[test]
fn find_returns_three_best_matches_ascending() {
    let engine = correlation_engine();
    let eye = synthetic_eye(200, 25, 60, 200);

    // Uniform templates at increasing correlation distance from the probe
    // (whose annulus is uniform at 200).
    let enrolled = vec![
        enrolled_uniform("e", 110),
        enrolled_uniform("b", 190),
        enrolled_uniform("d", 140),
        enrolled_uniform("a", 200),
        enrolled_uniform("c", 170),
    ];

    let results = engine.find_view(&enrolled, eye.view()).unwrap();
    assert_eq!(results.len(), 3);
    let identities: Vec<&str> = results.iter().map(|m| m.identity.as_str()).collect();
    assert_eq!(identities, ["a", "b", "c"]);
    assert!(results[0].score <= results[1].score);
    assert!(results[1].score <= results[2].score);
}

#[test]
fn find_returns_fewer_results_for_a_small_collection() {
    let engine = correlation_engine();
    let eye = synthetic_eye(200, 25, 60, 200);
    let enrolled = vec![enrolled_uniform("b", 150), enrolled_uniform("a", 200)];

    let results = engine.find_view(&enrolled, eye.view()).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].identity, "a");
    assert!(results[0].score <= results[1].score);
}

#[test]
fn corrupt_enrolled_record_aborts_the_scan() {
    let engine = correlation_engine();
    let eye = synthetic_eye(200, 25, 60, 160);
    let template = engine.probe_from_view(eye.view()).unwrap();

    let enrolled = vec![
        EnrolledTemplate::new("broken".to_string(), vec![1u8, 2, 3]),
        EnrolledTemplate::new("alice".to_string(), PlainCodec.encode(&template).unwrap()),
    ];

    // Fail-fast: the bad record aborts the batch even though a later record
    // would have matched.
    let err = engine.authorize_view(&enrolled, eye.view()).err().unwrap();
    assert!(matches!(err, IrisMatchError::Codec { .. }));
    let err = engine.find_view(&enrolled, eye.view()).err().unwrap();
    assert!(matches!(err, IrisMatchError::Codec { .. }));
}

#[test]
fn unlocalizable_probe_aborts_the_query() {
    let engine = correlation_engine();
    let flat = OwnedImage::new(vec![0u8; 200 * 200], 200, 200).unwrap();
    let enrolled = vec![enrolled_uniform("alice", 160)];

    assert_eq!(
        engine.authorize_view(&enrolled, flat.view()).err(),
        Some(IrisMatchError::IrisNotFound)
    );
    assert_eq!(
        engine.identify_view(&enrolled, flat.view()).err(),
        Some(IrisMatchError::IrisNotFound)
    );
}

#[cfg(feature = "image-io")]
mod byte_level {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(img: &OwnedImage) -> Vec<u8> {
        let buffer =
            image::GrayImage::from_raw(img.width() as u32, img.height() as u32, img.data().to_vec())
                .unwrap();
        let mut bytes = Vec::new();
        buffer
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn byte_level_queries_round_trip_through_the_decoder() {
        let engine = correlation_engine();
        let eye = synthetic_eye(200, 25, 60, 160);
        let bytes = png_bytes(&eye);

        let code = engine.enroll(&bytes).unwrap();
        let enrolled = vec![EnrolledTemplate::new("alice".to_string(), code)];

        assert!(engine.authorize(&enrolled, &bytes).unwrap());
        assert_eq!(
            engine.identify(&enrolled, &bytes).unwrap().as_deref(),
            Some("alice")
        );
        let results = engine.find(&enrolled, &bytes).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].identity, "alice");
    }

    #[test]
    fn malformed_bytes_are_rejected_by_the_decoder() {
        let engine = correlation_engine();
        let enrolled: Vec<EnrolledTemplate<String>> = Vec::new();
        let err = engine.authorize(&enrolled, &[0u8; 8]).err().unwrap();
        assert!(matches!(err, IrisMatchError::InvalidImage { .. }));
    }
}
