//! Configuration parsing tests.

use std::time::Duration;

use apeboot_core::Error;
use apeboot_core::common::PollPolicy;
use apeboot_core::config::{Config, PollConfig, SequenceConfig};
use pretty_assertions::assert_eq;

#[test]
fn defaults_bound_every_wait() {
    let config = Config::default();
    assert_eq!(config.mailbox.poll, PollConfig::new(1_000_000, 0));
    assert_eq!(config.sequence.select_verify, PollConfig::new(64, 0));
    assert_eq!(config.sequence.mdio, PollConfig::new(10_000, 0));
    assert!(config.sequence.zero_fill);
}

#[test]
fn empty_document_is_default() {
    assert_eq!(Config::from_json("{}").unwrap(), Config::default());
}

#[test]
fn partial_document_keeps_other_defaults() {
    let config = Config::from_json(r#"{ "sequence": { "mdio": { "max_attempts": 3 } } }"#).unwrap();
    assert_eq!(config.sequence.mdio, PollConfig::new(3, 0));
    assert_eq!(
        config.sequence.select_verify,
        SequenceConfig::default().select_verify
    );
    assert_eq!(config.mailbox, Config::default().mailbox);
}

#[test]
fn omitted_poll_field_keeps_section_default() {
    let config = Config::from_json(r#"{ "sequence": { "mdio": { "delay_us": 10 } } }"#).unwrap();
    assert_eq!(config.sequence.mdio, PollConfig::new(10_000, 10));

    let config = Config::from_json(r#"{ "mailbox": { "poll": {} } }"#).unwrap();
    assert_eq!(config.mailbox.poll, PollConfig::new(1_000_000, 0));

    let config =
        Config::from_json(r#"{ "sequence": { "select_verify": { "delay_us": 5 } } }"#).unwrap();
    assert_eq!(config.sequence.select_verify, PollConfig::new(64, 5));
    assert_eq!(config.sequence.mdio, SequenceConfig::default().mdio);
}

#[test]
fn malformed_document_is_a_config_error() {
    let err = Config::from_json(r#"{ "mailbox": { "poll": 5 } }"#).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().starts_with("invalid configuration"));
}

#[test]
fn poll_config_converts_to_policy() {
    let policy: PollPolicy = PollConfig::new(12, 250).into();
    assert_eq!(policy.max_attempts, 12);
    assert_eq!(policy.delay, Duration::from_micros(250));
}
