//! Seal a configuration into a link and open it again, through both tiers.

mod common;

use common::factories::{fast_seal_options, ConfigFactory};
use sanctuary::link::{estimate_encoded_len, ShareLink, DEFAULT_SOFT_LIMIT};
use sanctuary::payload::{open, seal, GateState, OpenError, UnlockError};

#[tokio::test]
async fn sentinel_passcode_opens_without_gate() {
    let config = ConfigFactory::new()
        .with_note(0, "<p>happy day</p>")
        .with_video("https://cdn.example/v.mp4")
        .build();

    let sealed = seal(&config, &fast_seal_options()).await.expect("seal");
    let opened = open(sealed.url.as_str()).await.expect("open");

    assert!(opened.is_unlocked());
    assert_eq!(opened.gate().state(), GateState::Unlocked);
    assert_eq!(opened.config(), &config);
}

#[tokio::test]
async fn custom_passcode_full_trip() {
    let config = ConfigFactory::new()
        .with_passcode("2468")
        .with_note(2, "<p>two days to go</p>")
        .with_note(0, "<p>today</p>")
        .with_video("https://cdn.example/v.mp4")
        .build();

    let sealed = seal(&config, &fast_seal_options()).await.expect("seal");
    let mut opened = open(sealed.url.as_str()).await.expect("open");

    // Locked: protected fields are hidden, everything else visible
    assert_eq!(opened.gate().state(), GateState::Locked);
    assert!(opened.config().notes.is_empty());
    assert!(opened.config().video_url.is_none());
    assert!(opened.config().passcode.is_empty());
    assert_eq!(opened.config().gallery_images, config.gallery_images);
    let before = opened.config().clone();

    // Wrong code: back to locked, input cleared, nothing changed
    assert_eq!(opened.unlock_with("0000").await, Err(UnlockError::IncorrectCode));
    assert_eq!(opened.gate().state(), GateState::Locked);
    assert_eq!(opened.gate().input_len(), 0);
    assert_eq!(opened.config(), &before);

    // Right code, entered digit by digit
    for digit in "2468".chars() {
        assert!(opened.gate_mut().push_digit(digit));
    }
    opened.submit().await.expect("unlock");

    assert!(opened.is_unlocked());
    assert_eq!(opened.into_config(), config);
}

#[tokio::test]
async fn repeated_wrong_codes_are_idempotent() {
    let config = ConfigFactory::new().with_passcode("2468").with_note(1, "n").build();
    let sealed = seal(&config, &fast_seal_options()).await.expect("seal");
    let mut opened = open(sealed.url.as_str()).await.expect("open");

    for code in ["0000", "1402", "8642", "2467"] {
        assert_eq!(opened.unlock_with(code).await, Err(UnlockError::IncorrectCode));
        assert_eq!(opened.gate().state(), GateState::Locked);
    }
    assert_eq!(opened.unlock_with("24x8").await, Err(UnlockError::InvalidInput));
    assert_eq!(opened.unlock_with("246").await, Err(UnlockError::InvalidInput));
    assert_eq!(opened.gate().input_len(), 0);

    opened.unlock_with("2468").await.expect("unlock");
    assert_eq!(opened.config().notes.len(), 1);
}

#[tokio::test]
async fn passcode_on_unlocked_link_has_nothing_to_do() {
    let sealed = seal(&ConfigFactory::new().build(), &fast_seal_options())
        .await
        .expect("seal");
    let mut opened = open(sealed.url.as_str()).await.expect("open");
    assert_eq!(opened.unlock_with("2468").await, Err(UnlockError::NotLocked));
}

#[tokio::test]
async fn link_without_fragment_is_malformed() {
    let sealed = seal(&ConfigFactory::new().build(), &fast_seal_options())
        .await
        .expect("seal");
    let mut url = sealed.url.clone();
    url.set_fragment(None);

    let err = open(url.as_str()).await.unwrap_err();
    assert!(matches!(err, OpenError::MalformedLink(_)));
    assert_eq!(err.to_string(), "this link is incomplete or damaged");
}

#[tokio::test]
async fn wrong_key_and_tampering_look_the_same() {
    let config = ConfigFactory::new().build();
    let a = seal(&config, &fast_seal_options()).await.expect("seal");
    let b = seal(&config, &fast_seal_options()).await.expect("seal");

    // a's ciphertext with b's key
    let mut swapped = a.url.clone();
    swapped.set_fragment(b.url.fragment());
    let wrong_key = open(swapped.as_str()).await.unwrap_err();

    // flip one character of the ciphertext
    let link = ShareLink::parse(a.url.as_str()).expect("parse");
    let mut envelope = link.envelope.clone();
    let flipped = if envelope.ciphertext.starts_with('A') { "B" } else { "A" };
    envelope.ciphertext.replace_range(0..1, flipped);
    let tampered_url = ShareLink::new(envelope, link.key().to_string())
        .to_url("https://sanctuary.example")
        .expect("url");
    let tampered = open(tampered_url.as_str()).await.unwrap_err();

    assert_eq!(wrong_key.to_string(), tampered.to_string());
    assert!(matches!(wrong_key, OpenError::MalformedLink(_)));
    assert!(matches!(tampered, OpenError::MalformedLink(_)));
}

#[tokio::test]
async fn truncated_inputs_are_malformed() {
    let cases = [
        "https://sanctuary.example/",
        "https://sanctuary.example/?d=AAAA",
        "https://sanctuary.example/?d=AAAA&iv=AAAAAAAAAAAAAAAA",
        "https://sanctuary.example/?d=AAAA&iv=AAAAAAAAAAAAAAAA#short",
        "https://sanctuary.example/?d=AAAA&iv=AAAAAAAAAAAAAAAA&v=2#AAAA",
        "not a link",
    ];

    for case in cases {
        let result = open(case).await;
        assert!(
            matches!(result, Err(OpenError::MalformedLink(_))),
            "case '{case}': {:?}",
            result.map(|o| o.config().clone())
        );
    }
}

#[tokio::test]
async fn oversized_payload_is_reported_not_truncated() {
    let mut factory = ConfigFactory::new();
    let long = "<p>".to_string() + &"I love you. ".repeat(40) + "</p>";
    for i in 0..30 {
        factory = factory.with_note(i % 3, &long);
    }
    let config = factory.build();

    let sealed = seal(&config, &fast_seal_options()).await.expect("seal");
    assert!(sealed.report.exceeds_soft_limit);
    assert!(sealed.report.total_len > DEFAULT_SOFT_LIMIT);
    assert_eq!(sealed.report.total_len, sealed.url.as_str().len());

    let opened = open(sealed.url.as_str()).await.expect("open");
    assert_eq!(opened.config(), &config);
}

#[tokio::test]
async fn estimate_matches_unlocked_link_size() {
    let config = ConfigFactory::new().with_note(1, "<p>short</p>").build();
    let estimate = estimate_encoded_len(&config).expect("estimate");

    let sealed = seal(&config, &fast_seal_options()).await.expect("seal");
    assert_eq!(estimate, sealed.report.query_len + sealed.report.fragment_len);
}
