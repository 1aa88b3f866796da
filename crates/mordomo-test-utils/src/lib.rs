// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mordomo integration tests.

pub mod harness;
pub mod mock_channel;
pub mod mock_services;

pub use harness::{make_media_message, make_text_message, temp_store, test_config};
pub use mock_channel::MockChannel;
pub use mock_services::{MockAlertSink, MockClassifier, MockSpeech, MockVision};
