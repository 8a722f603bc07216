//! `SanctuaryConfig` factory for test data creation.

use std::collections::BTreeMap;

use sanctuary::model::{DayKey, Names, Note, Plan, SanctuaryConfig};

/// Builder for configurations with sensible defaults: an `infinite` plan,
/// three days ending 2030-01-10, no passcode protection.
///
/// # Examples
///
/// ```ignore
/// let config = ConfigFactory::new()
///     .with_passcode("2468")
///     .with_note(1, "<p>see you soon</p>")
///     .with_video("https://cdn.example/v.mp4")
///     .build();
/// ```
pub struct ConfigFactory {
    config: SanctuaryConfig,
}

impl ConfigFactory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SanctuaryConfig {
                plan: Plan::Infinite,
                theme: "valentine".into(),
                occasion: "valentine".into(),
                custom_question: Some("Will you be my valentine?".into()),
                names: Names {
                    sender: "Sam".into(),
                    recipient: "Alex".into(),
                },
                target_date: "2030-01-10".into(),
                anniversary_date: "2022-07-28".into(),
                total_days: 3,
                spotify_tracks: BTreeMap::from([(DayKey::new(0), "4uLU6hMCjMI75M1A2tKUQC".into())]),
                notes: Vec::new(),
                passcode: "1402".into(),
                video_url: None,
                background_url: Some("https://cdn.example/bg.jpg".into()),
                gallery_images: BTreeMap::from([(
                    DayKey::new(2),
                    vec!["https://cdn.example/2a.jpg".into()],
                )]),
                signature: None,
            },
        }
    }

    #[must_use]
    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.config.plan = plan;
        self
    }

    #[must_use]
    pub fn with_total_days(mut self, total_days: u32) -> Self {
        self.config.total_days = total_days;
        self
    }

    #[must_use]
    pub fn with_passcode(mut self, passcode: &str) -> Self {
        self.config.passcode = passcode.to_string();
        self
    }

    #[must_use]
    pub fn with_note(mut self, day: u32, content: &str) -> Self {
        self.config.notes.push(Note::new(day, content));
        self
    }

    #[must_use]
    pub fn with_video(mut self, url: &str) -> Self {
        self.config.video_url = Some(url.to_string());
        self
    }

    #[must_use]
    pub fn with_gallery(mut self, day: u32, urls: &[&str]) -> Self {
        self.config
            .gallery_images
            .entry(DayKey::new(day))
            .or_default()
            .extend(urls.iter().map(|u| (*u).to_string()));
        self
    }

    #[must_use]
    pub fn with_signature(mut self, signature: &str) -> Self {
        self.config.signature = Some(signature.to_string());
        self
    }

    #[must_use]
    pub fn build(self) -> SanctuaryConfig {
        self.config
    }
}

impl Default for ConfigFactory {
    fn default() -> Self {
        Self::new()
    }
}
