//! Media referenced by a configuration, for owners cleaning up uploads.

use crate::model::SanctuaryConfig;

#[derive(Debug, thiserror::Error)]
#[error("no media found in this sanctuary")]
pub struct NoMediaFound;

/// Background, video, then gallery photos in day order. Duplicates are
/// listed once, at their first position.
///
/// # Errors
/// Returns `NoMediaFound` if the configuration references no media.
pub fn media_urls(config: &SanctuaryConfig) -> Result<Vec<String>, NoMediaFound> {
    let mut urls: Vec<String> = Vec::new();
    let candidates = config
        .background_url
        .iter()
        .chain(config.video_url.iter())
        .chain(config.gallery_images.values().flatten());

    for url in candidates {
        if !url.is_empty() && !urls.contains(url) {
            urls.push(url.clone());
        }
    }

    if urls.is_empty() {
        return Err(NoMediaFound);
    }
    Ok(urls)
}
