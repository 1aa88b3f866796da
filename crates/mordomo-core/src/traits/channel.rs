// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the household chat channel.

use async_trait::async_trait;

use crate::error::MordomoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, InboundMessage, MediaRef, MessageId, OutboundMessage};

/// Adapter for the bidirectional chat channel.
///
/// The session supervisor and router depend only on this narrow contract;
/// the wire protocol behind it is the adapter's concern.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the chat platform, completing any
    /// handshake before returning. Takes `&self`: adapters keep connection
    /// state behind interior mutability so the session supervisor and the
    /// router can share one instance.
    async fn connect(&self) -> Result<(), MordomoError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, MordomoError>;

    /// Receives the next inbound message from the channel.
    ///
    /// An `Err` here signals a channel-level failure; the supervisor treats
    /// it as a disconnect.
    async fn receive(&self) -> Result<InboundMessage, MordomoError>;

    /// Downloads the bytes behind a media reference.
    async fn download_media(&self, media: &MediaRef) -> Result<Vec<u8>, MordomoError>;
}
