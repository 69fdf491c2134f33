//! Channel depth regression test
//!
//! Probes ramps at every quantum depth (table and direct strategies),
//! rescales to shrinking depths, and checks the palette shortcut and
//! read failures.

use pixattr_analysis::{
    AnalysisError, get_image_channel_depth, get_image_depth, image_quantum_depth,
    set_image_channel_depth, set_image_depth,
};
use pixattr_core::{
    ChannelMask, Error, Image, Palette, Pixel, QuantumDepth, Rect, ResourceLimits, Session,
    StorageClass, is_at_depth,
};
use pixattr_test::{RegParams, synth};

#[test]
fn depth_probe_reg() {
    let mut rp = RegParams::new("depth_probe");
    let session = Session::new(ResourceLimits::new(4));

    // a 256-step ramp lands exactly on 8-bit values at every quantum depth
    for depth in [QuantumDepth::Q8, QuantumDepth::Q16, QuantumDepth::Q32, QuantumDepth::Q64] {
        let image = synth::gray_ramp(256, 3, depth).unwrap();
        let probed = get_image_depth(&image, &session).unwrap();
        rp.compare_values(8.0, f64::from(probed), 0.0);
    }

    // black and white only
    let image = synth::two_tone(
        8,
        8,
        QuantumDepth::Q16,
        Pixel::gray(0),
        Pixel::gray(65535),
        Rect::new(2, 2, 3, 3),
    )
    .unwrap();
    rp.compare_values(1.0, f64::from(get_image_depth(&image, &session).unwrap()), 0.0);

    // blue alone is a single 8-bit-exact value
    let image = synth::color_ramp(17, 5, QuantumDepth::Q16).unwrap();
    let blue = get_image_channel_depth(&image, ChannelMask::BLUE, &session).unwrap();
    let all = get_image_depth(&image, &session).unwrap();
    rp.compare_values(1.0, if blue <= all { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "depth_probe regression test failed");
}

#[test]
fn depth_minimal_reg() {
    let mut rp = RegParams::new("depth_minimal");
    let session = Session::new(ResourceLimits::new(2));
    let qr = QuantumDepth::Q16.range();

    // each added value needs at least as many bits as the ones before
    let values = [0u64, 65535, 21845, 4369, 257, 1235];
    let mut previous = 0;
    for n in 2..=values.len() {
        let image = Image::from_fn(n as u32, 2, QuantumDepth::Q16, |x, _| {
            Pixel::gray(values[x as usize])
        })
        .unwrap();
        let depth = get_image_depth(&image, &session).unwrap();
        rp.compare_values(1.0, if depth >= previous { 1.0 } else { 0.0 }, 0.0);
        previous = depth;

        let samples = &values[..n];
        let exact = samples.iter().all(|&v| is_at_depth(v, depth, qr));
        rp.compare_values(1.0, if exact { 1.0 } else { 0.0 }, 0.0);
        if depth > 1 {
            let minimal = samples.iter().any(|&v| !is_at_depth(v, depth - 1, qr));
            rp.compare_values(1.0, if minimal { 1.0 } else { 0.0 }, 0.0);
        }
    }
    rp.compare_values(16.0, f64::from(previous), 0.0);

    assert!(rp.cleanup(), "depth_minimal regression test failed");
}

#[test]
fn depth_rescale_reg() {
    let mut rp = RegParams::new("depth_rescale");
    let session = Session::new(ResourceLimits::new(3));

    let mut image = synth::color_ramp(64, 48, QuantumDepth::Q16).unwrap();
    for depth in [12, 8, 5, 2, 1] {
        set_image_depth(&mut image, depth, &session).unwrap();
        rp.compare_values(f64::from(depth), f64::from(image.depth()), 0.0);
        let probed = get_image_depth(&image, &session).unwrap();
        rp.compare_values(1.0, if probed <= depth { 1.0 } else { 0.0 }, 0.0);
    }

    // rescaling to the current depth leaves pixels alone
    let mut image = synth::gray_ramp(40, 4, QuantumDepth::Q8).unwrap();
    set_image_depth(&mut image, 4, &session).unwrap();
    let before = image.try_clone().unwrap();
    set_image_depth(&mut image, 4, &session).unwrap();
    rp.compare_images(&before, &image);

    // at or above the quantum depth only the recorded depth changes
    let mut image = synth::gray_ramp(40, 4, QuantumDepth::Q8).unwrap();
    let before = image.try_clone().unwrap();
    set_image_depth(&mut image, 16, &session).unwrap();
    rp.compare_values(16.0, f64::from(image.depth()), 0.0);
    rp.compare_values(16.0, f64::from(image_quantum_depth(&image, false)), 0.0);
    rp.compare_values(8.0, f64::from(image_quantum_depth(&image, true)), 0.0);
    rp.compare_images(&before, &image);

    assert!(rp.cleanup(), "depth_rescale regression test failed");
}

#[test]
fn depth_palette_reg() {
    let mut rp = RegParams::new("depth_palette");
    let session = Session::default();

    let image =
        synth::paletted(8, 8, QuantumDepth::Q8, &[Pixel::gray(0), Pixel::gray(255)]).unwrap();
    rp.compare_values(1.0, f64::from(get_image_depth(&image, &session).unwrap()), 0.0);

    let mut image = synth::paletted(
        6,
        6,
        QuantumDepth::Q16,
        &[Pixel::rgb(1000, 20000, 40000), Pixel::rgb(65535, 3, 9)],
    )
    .unwrap();
    set_image_channel_depth(&mut image, ChannelMask::RGB, 2, &session).unwrap();
    let probed = get_image_depth(&image, &session).unwrap();
    rp.compare_values(1.0, if probed <= 2 { 1.0 } else { 0.0 }, 0.0);
    // pixels follow the rescaled palette
    let palette = image.palette().unwrap().clone();
    let pixel = image.get_pixel(0, 0).unwrap();
    rp.compare_values(1.0, if palette.index_of(&pixel).is_some() { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "depth_palette regression test failed");
}

#[test]
fn depth_failure_reg() {
    let session = Session::new(ResourceLimits::new(2));
    let mut image = synth::failing(5, 5, QuantumDepth::Q16, Pixel::gray(1234), 2).unwrap();

    assert!(get_image_depth(&image, &session).is_err());
    assert!(set_image_depth(&mut image, 4, &session).is_err());
    assert_eq!(image.depth(), 16);

    assert!(matches!(
        set_image_depth(&mut image, 0, &session),
        Err(AnalysisError::InvalidDepth(0))
    ));
    assert!(matches!(
        set_image_depth(&mut image, 65, &session),
        Err(AnalysisError::InvalidDepth(65))
    ));
}

#[test]
fn depth_palette_failure_reg() {
    let session = Session::new(ResourceLimits::new(3));
    let color = Pixel::gray(1234);
    let mut image = synth::failing(6, 6, QuantumDepth::Q16, color, 4).unwrap();
    image.set_palette(Some(Palette::from_colors([color]).unwrap()));
    image.set_storage_class(StorageClass::Indexed);

    // the palette is rescaled, then the pixel refresh hits the bad row
    let result = set_image_depth(&mut image, 4, &session);
    assert!(matches!(
        result,
        Err(AnalysisError::Core(Error::CacheRead { y: 4, .. }))
    ));
    assert_eq!(image.depth(), 16);
}
