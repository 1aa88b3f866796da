// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Mordomo household agent.

pub mod adapter;
pub mod alert;
pub mod channel;
pub mod classifier;
pub mod records;

pub use adapter::PluginAdapter;
pub use alert::AlertSink;
pub use channel::ChannelAdapter;
pub use classifier::{IntentClassifier, SpeechTranscriber, VisionExtractor};
pub use records::RecordStore;
