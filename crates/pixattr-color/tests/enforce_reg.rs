//! Image type enforcement regression test
//!
//! Enforcing a type is idempotent, leaves the requested type cached, and
//! produces pixels that the pixel-derived classifier agrees with.

use pixattr_analysis::identify_image_type;
use pixattr_color::{ColorError, set_image_type};
use pixattr_core::{
    Colorspace, Error, ImageType, Palette, Pixel, QuantumDepth, ResourceLimits, Session,
    StorageClass,
};
use pixattr_test::{RegParams, synth};

const TARGETS: [ImageType; 10] = [
    ImageType::Bilevel,
    ImageType::Grayscale,
    ImageType::GrayscaleMatte,
    ImageType::Palette,
    ImageType::PaletteMatte,
    ImageType::PaletteBilevelMatte,
    ImageType::TrueColor,
    ImageType::TrueColorMatte,
    ImageType::ColorSeparation,
    ImageType::ColorSeparationMatte,
];

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

#[test]
fn enforce_idempotent_reg() {
    let mut rp = RegParams::new("enforce_idempotent");
    let session = Session::new(ResourceLimits::new(4));

    for target in TARGETS {
        let mut once = synth::color_ramp(32, 32, QuantumDepth::Q8).unwrap();
        set_image_type(&mut once, target, &session).unwrap();
        rp.compare_values(1.0, flag(once.image_type() == target), 0.0);

        let mut twice = once.try_clone().unwrap();
        set_image_type(&mut twice, target, &session).unwrap();
        if !rp.compare_images(&once, &twice) {
            eprintln!("  second {target:?} pass changed pixels");
        }
        rp.compare_values(flag(once.matte()), flag(twice.matte()), 0.0);
        rp.compare_values(
            flag(once.storage_class() == StorageClass::Indexed),
            flag(twice.storage_class() == StorageClass::Indexed),
            0.0,
        );
        rp.compare_values(1.0, flag(once.colorspace() == twice.colorspace()), 0.0);
        rp.compare_values(1.0, flag(target.is_matte() == twice.matte()), 0.0);
    }

    assert!(rp.cleanup(), "enforce_idempotent regression test failed");
}

#[test]
fn enforce_classifier_agrees_reg() {
    let mut rp = RegParams::new("enforce_classifier_agrees");
    let session = Session::default();

    let cases = [
        (ImageType::Bilevel, ImageType::Bilevel),
        (ImageType::Grayscale, ImageType::Grayscale),
        (ImageType::Palette, ImageType::Palette),
        (ImageType::TrueColor, ImageType::TrueColor),
        (ImageType::ColorSeparation, ImageType::ColorSeparation),
    ];
    for (target, expected) in cases {
        let mut image = synth::color_ramp(32, 32, QuantumDepth::Q16).unwrap();
        set_image_type(&mut image, target, &session).unwrap();
        // forget the cached type so the classifier has to look at pixels
        image.set_image_type(ImageType::Undefined);
        let identified = identify_image_type(&image, &session).unwrap();
        if !rp.compare_values(1.0, flag(identified == expected), 0.0) {
            eprintln!("  {target:?} identified as {identified:?}");
        }
    }

    // bilevel pixels are pure black and white gray
    let mut image = synth::gray_ramp(40, 3, QuantumDepth::Q8).unwrap();
    set_image_type(&mut image, ImageType::Bilevel, &session).unwrap();
    let pixels = image.pixels().unwrap();
    rp.compare_values(1.0, flag(pixels.iter().all(|p| p.is_monochrome(255))), 0.0);
    rp.compare_values(1.0, flag(image.palette().is_some_and(|p| p.len() == 2)), 0.0);
    rp.compare_values(1.0, flag(image.colorspace() == Colorspace::Gray), 0.0);

    // palette enforcement keeps an existing small palette
    let colors = [Pixel::rgb(255, 0, 0), Pixel::rgb(0, 0, 255), Pixel::rgb(0, 255, 0)];
    let mut image = synth::paletted(5, 5, QuantumDepth::Q8, &colors).unwrap();
    let before = image.try_clone().unwrap();
    set_image_type(&mut image, ImageType::Palette, &session).unwrap();
    rp.compare_images(&before, &image);
    rp.compare_values(3.0, image.palette().map_or(0, |p| p.len()) as f64, 0.0);

    assert!(rp.cleanup(), "enforce_classifier_agrees regression test failed");
}

#[test]
fn enforce_alpha_reg() {
    let mut rp = RegParams::new("enforce_alpha");
    let session = Session::default();

    // palette bilevel matte leaves only fully opaque or fully transparent pixels
    let mut image = synth::color_ramp(8, 8, QuantumDepth::Q8).unwrap();
    image.set_matte(true);
    for x in 0..8 {
        let mut pixel = image.get_pixel(x, 0).unwrap();
        pixel.opacity = u64::from(x) * 36;
        image.set_pixel(x, 0, pixel).unwrap();
    }
    set_image_type(&mut image, ImageType::PaletteBilevelMatte, &session).unwrap();
    let pixels = image.pixels().unwrap();
    rp.compare_values(1.0, flag(pixels.iter().all(|p| p.opacity == 0 || p.opacity == 255)), 0.0);
    // alpha 255 - 4 * 36 = 111 is at or below half range
    rp.compare_values(255.0, image.get_pixel(4, 0).unwrap().opacity as f64, 0.0);
    rp.compare_values(0.0, image.get_pixel(3, 0).unwrap().opacity as f64, 0.0);
    rp.compare_values(1.0, flag(image.storage_class() == StorageClass::Indexed), 0.0);

    // matte targets add an opaque alpha channel, non-matte targets drop it
    let mut image = synth::gray_ramp(6, 6, QuantumDepth::Q8).unwrap();
    set_image_type(&mut image, ImageType::GrayscaleMatte, &session).unwrap();
    rp.compare_values(1.0, flag(image.matte()), 0.0);
    rp.compare_values(1.0, flag(image.pixels().unwrap().iter().all(|p| p.opacity == 0)), 0.0);
    set_image_type(&mut image, ImageType::Grayscale, &session).unwrap();
    rp.compare_values(0.0, flag(image.matte()), 0.0);

    assert!(rp.cleanup(), "enforce_alpha regression test failed");
}

#[test]
fn enforce_errors_reg() {
    let mut rp = RegParams::new("enforce_errors");
    let session = Session::default();

    let mut image = synth::color_ramp(6, 6, QuantumDepth::Q8).unwrap();
    image.set_colorspace(Colorspace::Lab);
    let result = set_image_type(&mut image, ImageType::Palette, &session);
    rp.compare_values(
        1.0,
        flag(matches!(result, Err(ColorError::UnsupportedTransform { .. }))),
        0.0,
    );
    rp.compare_values(1.0, flag(image.image_type() == ImageType::Undefined), 0.0);

    let mut image = synth::failing(6, 6, QuantumDepth::Q8, Pixel::rgb(10, 200, 30), 4).unwrap();
    let result = set_image_type(&mut image, ImageType::Bilevel, &session);
    rp.compare_values(1.0, flag(matches!(result, Err(ColorError::Core(_)))), 0.0);
    rp.compare_values(1.0, flag(image.image_type() == ImageType::Undefined), 0.0);

    // indexed images fail while refreshing pixels from the palette
    let color = Pixel::rgb(10, 200, 30);
    let mut image = synth::failing(6, 6, QuantumDepth::Q8, color, 3).unwrap();
    image.set_palette(Some(Palette::from_colors([color]).unwrap()));
    image.set_storage_class(StorageClass::Indexed);
    let result = set_image_type(&mut image, ImageType::GrayscaleMatte, &session);
    rp.compare_values(
        1.0,
        flag(matches!(result, Err(ColorError::Core(Error::CacheRead { y: 3, .. })))),
        0.0,
    );
    rp.compare_values(1.0, flag(image.image_type() == ImageType::Undefined), 0.0);

    assert!(rp.cleanup(), "enforce_errors regression test failed");
}
