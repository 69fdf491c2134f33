//! Image type classification regression test
//!
//! Every classifier returns a type for every image; pixel-derived types
//! follow the bilevel / grayscale / palette / truecolor decision order, and
//! the matte suffix tracks actual transparency.

use pixattr_analysis::{
    get_image_type, identify_image_gray, identify_image_monochrome, identify_image_type,
    identify_palette_image, is_opaque_image,
};
use pixattr_core::{
    Colorspace, Image, ImageType, Pixel, QuantumDepth, Rect, ResourceLimits, Session,
};
use pixattr_test::{RegParams, synth};

fn same_type(rp: &mut RegParams, expected: ImageType, actual: ImageType) {
    if !rp.compare_values(1.0, if expected == actual { 1.0 } else { 0.0 }, 0.0) {
        eprintln!("  expected {expected:?}, got {actual:?}");
    }
}

fn samples() -> Vec<(Image, ImageType)> {
    vec![
        (
            synth::two_tone(
                9,
                7,
                QuantumDepth::Q8,
                Pixel::gray(0),
                Pixel::gray(255),
                Rect::new(2, 2, 3, 3),
            )
            .unwrap(),
            ImageType::Bilevel,
        ),
        (synth::gray_ramp(30, 6, QuantumDepth::Q16).unwrap(), ImageType::Grayscale),
        (synth::color_ramp(16, 16, QuantumDepth::Q8).unwrap(), ImageType::Palette),
        (synth::color_ramp(32, 32, QuantumDepth::Q8).unwrap(), ImageType::TrueColor),
    ]
}

#[test]
fn classify_identify_reg() {
    let mut rp = RegParams::new("classify_identify");
    let session = Session::default();

    for (image, expected) in samples() {
        let identified = identify_image_type(&image, &session).unwrap();
        same_type(&mut rp, expected, identified);
        // cached classification is total as well
        rp.compare_values(
            1.0,
            if get_image_type(&image) != ImageType::Undefined { 1.0 } else { 0.0 },
            0.0,
        );
    }

    let image = synth::gray_ramp(10, 2, QuantumDepth::Q8).unwrap();
    rp.compare_values(0.0, f64::from(identify_image_monochrome(&image, &session).unwrap() as u8), 0.0);
    same_type(&mut rp, ImageType::Grayscale, identify_image_gray(&image, &session).unwrap());

    let image = synth::color_ramp(10, 2, QuantumDepth::Q8).unwrap();
    same_type(&mut rp, ImageType::Undefined, identify_image_gray(&image, &session).unwrap());
    rp.compare_values(1.0, f64::from(identify_palette_image(&image, &session).unwrap() as u8), 0.0);

    let mut image = synth::solid(4, 4, QuantumDepth::Q8, Pixel::rgb(10, 20, 30)).unwrap();
    image.set_colorspace(Colorspace::Cmyk);
    same_type(&mut rp, ImageType::ColorSeparation, identify_image_type(&image, &session).unwrap());

    assert!(rp.cleanup(), "classify_identify regression test failed");
}

#[test]
fn classify_matte_reg() {
    let mut rp = RegParams::new("classify_matte");
    let session = Session::new(ResourceLimits::new(3));

    // alpha channel present but fully opaque
    let mut image = synth::gray_ramp(12, 5, QuantumDepth::Q8).unwrap();
    image.set_matte(true);
    rp.compare_values(1.0, f64::from(is_opaque_image(&image, &session).unwrap() as u8), 0.0);
    same_type(&mut rp, ImageType::Grayscale, identify_image_type(&image, &session).unwrap());
    same_type(&mut rp, ImageType::GrayscaleMatte, get_image_type(&{
        let mut cached = image.try_clone().unwrap();
        cached.set_image_type(ImageType::Grayscale);
        cached
    }));

    // one translucent pixel
    image.set_pixel(3, 2, Pixel::rgbo(90, 90, 90, 100)).unwrap();
    rp.compare_values(0.0, f64::from(is_opaque_image(&image, &session).unwrap() as u8), 0.0);
    same_type(&mut rp, ImageType::GrayscaleMatte, identify_image_type(&image, &session).unwrap());

    let mut image = synth::color_ramp(32, 32, QuantumDepth::Q8).unwrap();
    image.set_matte(true);
    same_type(&mut rp, ImageType::TrueColor, identify_image_type(&image, &session).unwrap());
    image.set_pixel(0, 0, Pixel::rgbo(1, 2, 3, 255)).unwrap();
    same_type(&mut rp, ImageType::TrueColorMatte, identify_image_type(&image, &session).unwrap());

    assert!(rp.cleanup(), "classify_matte regression test failed");
}

#[test]
fn classify_thread_count_reg() {
    let mut rp = RegParams::new("classify_thread_count");

    for threads in 1..=8 {
        let session = Session::new(ResourceLimits::new(threads));
        for (image, expected) in samples() {
            same_type(&mut rp, expected, identify_image_type(&image, &session).unwrap());
        }
    }

    assert!(rp.cleanup(), "classify_thread_count regression test failed");
}

#[test]
fn classify_read_failure_reg() {
    let session = Session::default();
    let image = synth::failing(6, 6, QuantumDepth::Q8, Pixel::gray(255), 4).unwrap();
    assert!(identify_image_monochrome(&image, &session).is_err());
    assert!(identify_image_type(&image, &session).is_err());
}
