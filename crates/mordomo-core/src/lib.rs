// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mordomo household agent.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Mordomo workspace. All adapter
//! implementations live in sibling crates and implement traits defined here.

pub mod error;
pub mod text;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MordomoError;
pub use types::{AdapterType, HealthStatus, MessageId, UNKNOWN_ACTOR_ID};

// Re-export all adapter traits at crate root.
pub use traits::{
    AlertSink, ChannelAdapter, IntentClassifier, PluginAdapter, RecordStore, SpeechTranscriber,
    VisionExtractor,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mordomo_error_has_all_variants() {
        let _config = MordomoError::Config("test".into());
        let _storage = MordomoError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = MordomoError::Channel {
            message: "test".into(),
            source: None,
        };
        let _classifier = MordomoError::Classifier {
            message: "test".into(),
            source: None,
        };
        let _rate = MordomoError::RateLimited {
            message: "test".into(),
        };
        let _timeout = MordomoError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = MordomoError::Internal("test".into());
    }

    #[test]
    fn adapter_type_round_trip() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Channel,
            AdapterType::Classifier,
            AdapterType::Storage,
            AdapterType::Alert,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that the trait surface is reachable through the
        // public API.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_classifier<T: IntentClassifier>() {}
        fn _assert_speech<T: SpeechTranscriber>() {}
        fn _assert_vision<T: VisionExtractor>() {}
        fn _assert_record_store<T: RecordStore>() {}
        fn _assert_alert_sink<T: AlertSink>() {}
    }
}
