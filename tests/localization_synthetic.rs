use irismatch::{
    AccumulatorConfig, AccumulatorLocalizer, IntegroConfig, IntegroLocalizer, Localize,
    LocalizerConfig, Localizer, OwnedImage, SearchParams,
};

/// Draws a schematic eye: dark pupil disk, mid-gray iris annulus, bright
/// sclera background.
fn synthetic_eye(size: usize, cx: i32, cy: i32, pupil_r: i32, iris_r: i32) -> OwnedImage {
    let mut data = vec![230u8; size * size];
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let dx = x - cx;
            let dy = y - cy;
            let dist_sq = dx * dx + dy * dy;
            let value = if dist_sq < pupil_r * pupil_r {
                10
            } else if dist_sq < iris_r * iris_r {
                160
            } else {
                230
            };
            data[y as usize * size + x as usize] = value;
        }
    }
    OwnedImage::new(data, size, size).unwrap()
}

#[test]
fn accumulator_finds_concentric_borders_in_order() {
    let eye = synthetic_eye(200, 100, 100, 25, 60);
    let localizer = AccumulatorLocalizer::new(AccumulatorConfig::default());
    let borders = localizer.localize(eye.view()).unwrap();

    assert!(
        borders.inner.r < borders.outer.r,
        "inner {:?} outer {:?}",
        borders.inner,
        borders.outer
    );
    assert!((borders.inner.x - 100).abs() <= 2);
    assert!((borders.inner.y - 100).abs() <= 2);
    assert!((borders.inner.r - 25).abs() <= 2);
    assert!((borders.outer.r - 60).abs() <= 3);
}

#[test]
fn accumulator_shared_center_mode_anchors_outer_center() {
    let eye = synthetic_eye(200, 100, 100, 25, 60);
    let localizer = AccumulatorLocalizer::new(AccumulatorConfig {
        shared_center: true,
        ..AccumulatorConfig::default()
    });
    let borders = localizer.localize(eye.view()).unwrap();

    assert_eq!(borders.inner.x, borders.outer.x);
    assert_eq!(borders.inner.y, borders.outer.y);
    assert!(borders.inner.r < borders.outer.r);
}

#[test]
fn integro_finds_concentric_borders_in_order() {
    let eye = synthetic_eye(200, 100, 100, 25, 60);
    let localizer = IntegroLocalizer::new(IntegroConfig::default());
    let borders = localizer.localize(eye.view()).unwrap();

    assert!(
        borders.inner.r < borders.outer.r,
        "inner {:?} outer {:?}",
        borders.inner,
        borders.outer
    );
    assert!((borders.inner.x - 100).abs() <= 2);
    assert!((borders.inner.y - 100).abs() <= 2);
    assert!((borders.inner.r - 25).abs() <= 2);
    assert!((borders.outer.r - 60).abs() <= 3);
}

#[test]
fn localizers_agree_on_an_off_center_eye() {
    let eye = synthetic_eye(220, 95, 118, 25, 58);

    let accumulator = AccumulatorLocalizer::new(AccumulatorConfig::default())
        .localize(eye.view())
        .unwrap();
    let integro = IntegroLocalizer::new(IntegroConfig::default())
        .localize(eye.view())
        .unwrap();

    assert!((accumulator.inner.x - integro.inner.x).abs() <= 3);
    assert!((accumulator.inner.y - integro.inner.y).abs() <= 3);
    assert!((accumulator.inner.r - integro.inner.r).abs() <= 3);
}

#[test]
fn edgeless_images_report_not_found_for_both_variants() {
    let params = SearchParams {
        min_radius: 5,
        max_radius: 25,
        threshold: 60,
        edge_margin: 8,
    };
    let configs = [
        LocalizerConfig::Integro(IntegroConfig {
            search: params,
            ..IntegroConfig::default()
        }),
        LocalizerConfig::Accumulator(AccumulatorConfig {
            search: params,
            shared_center: false,
        }),
    ];

    for config in configs {
        let localizer = Localizer::new(config);
        for fill in [0u8, 255u8] {
            let flat = OwnedImage::new(vec![fill; 120 * 120], 120, 120).unwrap();
            let result = localizer.localize(flat.view());
            assert!(
                matches!(result, Err(irismatch::IrisMatchError::IrisNotFound)),
                "fill {fill} should not localize"
            );
        }
    }
}
