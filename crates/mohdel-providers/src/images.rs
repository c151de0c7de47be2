//! Image support: per-adapter mimetype filters and token estimation.

use tracing::warn;

use mohdel_core::{Error, ImageInput, Result};

/// Mimetypes accepted by responses-style vendors.
pub const RESPONSES_MIMETYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Mimetypes accepted by generation-style vendors.
pub const GENERATION_MIMETYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Text-only families: every image is dropped.
pub const TEXT_ONLY: &[&str] = &[];

/// Side of one vision patch, in pixels.
const PATCH_SIZE: f64 = 32.0;
/// Patches above this are downscaled away by the vendor.
const MAX_PATCHES: f64 = 1536.0;

/// Token multiplier per model family, most specific prefix first.
const PATCH_MULTIPLIERS: &[(&str, f64)] = &[
    ("gpt-4.1-mini", 2.0),
    ("gpt-4.1-nano", 2.0),
    ("gpt-4.1", 2.0),
    ("o4-mini", 1.75),
    ("o1-pro", 2.5),
    ("o3", 2.25),
];

/// Keep only the images whose mimetype is in `supported`, warning once per drop.
pub fn filter_supported<'a>(
    images: &'a [ImageInput],
    supported: &[&str],
    provider: &str,
) -> Vec<&'a ImageInput> {
    images
        .iter()
        .filter(|image| {
            let ok = supported.contains(&image.mimetype.as_str());
            if !ok {
                warn!(provider, mimetype = %image.mimetype, "Dropping image with unsupported mimetype");
            }
            ok
        })
        .collect()
}

/// Estimate the input tokens an image costs on a responses-style model.
///
/// Fails with [`Error::UnsupportedCapability`] for models without a known
/// patch multiplier and for mimetypes the vendor rejects, and with
/// [`Error::InvalidInput`] when the image carries no dimensions.
pub fn estimate_image_tokens(api_model_name: &str, image: &ImageInput) -> Result<u32> {
    let multiplier = PATCH_MULTIPLIERS
        .iter()
        .find(|(prefix, _)| api_model_name.starts_with(prefix))
        .map(|(_, m)| *m)
        .ok_or_else(|| {
            Error::UnsupportedCapability(format!(
                "no image token estimate for model {api_model_name}"
            ))
        })?;

    if !RESPONSES_MIMETYPES.contains(&image.mimetype.as_str()) {
        return Err(Error::UnsupportedCapability(format!(
            "image type {} is not supported by {api_model_name}",
            image.mimetype
        )));
    }

    let (width, height) = match (image.width, image.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (f64::from(w), f64::from(h)),
        _ => {
            return Err(Error::InvalidInput(
                "image width and height are required to estimate tokens".into(),
            ))
        }
    };

    let patches = patch_count(width, height);
    Ok((patches * multiplier).ceil() as u32)
}

/// Number of 32px patches after the vendor's downscaling to `MAX_PATCHES`.
fn patch_count(width: f64, height: f64) -> f64 {
    let raw = (width / PATCH_SIZE).ceil() * (height / PATCH_SIZE).ceil();
    if raw <= MAX_PATCHES {
        return raw;
    }

    let shrink = (PATCH_SIZE * PATCH_SIZE * MAX_PATCHES / (width * height)).sqrt();
    let scaled_w = width * shrink / PATCH_SIZE;
    let scaled_h = height * shrink / PATCH_SIZE;
    // Fit a whole number of patches along the tighter side.
    let fit = (scaled_w.floor() / scaled_w).min(scaled_h.floor() / scaled_h);
    let shrink = shrink * fit;

    let patches = (width * shrink / PATCH_SIZE).ceil() * (height * shrink / PATCH_SIZE).ceil();
    patches.min(MAX_PATCHES)
}
