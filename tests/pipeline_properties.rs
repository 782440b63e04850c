//! End-to-end properties of the background editing pipeline
//!
//! Exercises the public library API: decode, classify under both policies,
//! composite in both modes, and re-encode.

use image::{DynamicImage, Rgba, RgbaImage};
use outfitgen::{
    remove_background_from_bytes, remove_background_from_image, CompositeMode, EdgeSampledPolicy,
    MaskPolicy, OutputFormat, PolicyConfig, ProcessorConfig, ThresholdPolicy,
};

fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut bytes);
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut cursor, image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// 2x2 bitmap: top-left white, the rest black, all opaque
fn white_corner() -> RgbaImage {
    let mut image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
    image.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
    image
}

#[test]
fn pure_white_is_background_for_every_cutoff() {
    for cutoff in [1u8, 64, 128, 200, 240, 255] {
        let policy = ThresholdPolicy::new(cutoff, 1.0);
        let image = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let mask = policy.classify(&image);
        assert!(
            mask.is_background(0),
            "cutoff {cutoff}: pure white must always be background"
        );
    }
}

#[test]
fn pure_black_is_never_background() {
    for cutoff in [1u8, 128, 240, 255] {
        let policy = ThresholdPolicy::new(cutoff, 0.90);
        let image = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let mask = policy.classify(&image);
        assert!(
            !mask.is_background(0),
            "cutoff {cutoff}: pure black must never be background"
        );
    }
}

#[test]
fn constant_border_estimate_is_exact() {
    for color in [[0u8, 0, 0], [255, 255, 255], [13, 87, 201], [128, 128, 128]] {
        let mut image = RgbaImage::from_pixel(9, 7, Rgba([color[0], color[1], color[2], 255]));
        // Interior differs; only the border feeds the estimate
        for y in 1..6 {
            for x in 1..8 {
                image.put_pixel(x, y, Rgba([250, 10, 10, 255]));
            }
        }

        let policy = EdgeSampledPolicy::default();
        let estimate = policy.estimate_background(&image);
        assert_eq!(
            estimate,
            [f32::from(color[0]), f32::from(color[1]), f32::from(color[2])],
            "constant border {color:?} must estimate exactly"
        );
    }
}

#[test]
fn threshold_transparent_two_by_two_scenario() {
    // With a white cutoff of 240, only the white top-left pixel goes
    // transparent, row-major alpha [0, 255, 255, 255]
    let config = ProcessorConfig::builder()
        .policy(PolicyConfig::Threshold {
            white_cutoff: 240,
            brightness_cutoff: 0.90,
        })
        .mode(CompositeMode::Transparent)
        .build()
        .unwrap();

    let result = remove_background_from_bytes(&encode_png(&white_corner()), &config).unwrap();
    let rgba = result.image.to_rgba8();
    let alphas: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
    assert_eq!(alphas, vec![0, 255, 255, 255]);
}

#[test]
fn transparent_transform_is_idempotent() {
    let config = ProcessorConfig::default();

    let once = remove_background_from_bytes(&encode_png(&white_corner()), &config).unwrap();
    let reencoded = once.to_bytes(OutputFormat::Png, 90).unwrap();
    let twice = remove_background_from_bytes(&reencoded, &config).unwrap();

    assert_eq!(
        once.image.to_rgba8().as_raw(),
        twice.image.to_rgba8().as_raw(),
        "pixels already at alpha 0 must not change on a second pass"
    );
}

#[test]
fn garment_whitening_fills_background_white() {
    // Light-gray backdrop around a dark garment: backdrop flattens to pure
    // white, garment pixels untouched
    let mut image = RgbaImage::from_pixel(4, 4, Rgba([245, 245, 245, 255]));
    image.put_pixel(1, 1, Rgba([40, 40, 60, 255]));
    image.put_pixel(2, 2, Rgba([40, 40, 60, 255]));

    let result = remove_background_from_image(
        &DynamicImage::ImageRgba8(image),
        &ProcessorConfig::garment_whitening(),
    )
    .unwrap();

    let rgba = result.image.to_rgba8();
    assert_eq!(rgba.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(rgba.get_pixel(1, 1).0, [40, 40, 60, 255]);
    assert_eq!(result.mask.statistics().foreground_pixels, 2);
}

#[test]
fn portrait_cutout_adapts_to_colored_background() {
    // Blue backdrop that the absolute threshold would miss entirely
    let mut image = RgbaImage::from_pixel(7, 7, Rgba([30, 60, 160, 255]));
    for y in 2..5 {
        for x in 2..5 {
            image.put_pixel(x, y, Rgba([190, 140, 110, 255]));
        }
    }

    let result = remove_background_from_image(
        &DynamicImage::ImageRgba8(image),
        &ProcessorConfig::portrait_cutout(),
    )
    .unwrap();

    let rgba = result.image.to_rgba8();
    assert_eq!(rgba.get_pixel(0, 0).0[3], 0, "backdrop punched out");
    assert_eq!(rgba.get_pixel(3, 3).0[3], 255, "subject kept");
    assert_eq!(result.mask.statistics().foreground_pixels, 9);
}

#[test]
fn jpeg_output_flattens_alpha() {
    let result = remove_background_from_bytes(
        &encode_png(&white_corner()),
        &ProcessorConfig::default(),
    )
    .unwrap();

    let jpeg_bytes = result.to_bytes(OutputFormat::Jpeg, 90).unwrap();
    let decoded = image::load_from_memory(&jpeg_bytes).unwrap();
    assert_eq!(decoded.color().channel_count(), 3);
}

#[test]
fn save_and_reload_preserves_transparency() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cutout.png");

    let result = remove_background_from_bytes(
        &encode_png(&white_corner()),
        &ProcessorConfig::default(),
    )
    .unwrap();
    result.save_png(&path).unwrap();

    let reloaded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(reloaded.get_pixel(0, 0).0[3], 0);
    assert_eq!(reloaded.get_pixel(1, 1).0[3], 255);
}

#[test]
fn undecodable_bytes_are_rejected() {
    let err = remove_background_from_bytes(b"not an image", &ProcessorConfig::default())
        .unwrap_err();
    assert!(err.to_string().contains("decode"));
}

#[test]
fn data_uri_output_roundtrips() {
    let result = remove_background_from_bytes(
        &encode_png(&white_corner()),
        &ProcessorConfig::default(),
    )
    .unwrap();

    let uri = result.to_data_uri(OutputFormat::Png, 90).unwrap();
    let (mime, payload) = outfitgen::ImageIOService::split_data_uri(&uri).unwrap();
    assert_eq!(mime, "image/png");

    use base64::Engine as _;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.to_rgba8().get_pixel(0, 0).0[3], 0);
}
