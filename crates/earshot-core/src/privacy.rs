//! Privacy-channel audibility.
//!
//! A listener's privacy state comes from its own active Override. Channels
//! partition participants: same channel hears each other unless listening
//! is disallowed, different channels never do. Listeners in a private
//! channel still hear participants without a channel unless they mute
//! outsiders.

use crate::{ChannelId, Override};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerPrivacy {
    pub channel: Option<ChannelId>,
    pub mute_outsiders: bool,
    pub disallow_listening: bool,
}

impl ListenerPrivacy {
    /// Privacy state implied by the listener's active Override, if any.
    pub fn from_override(active: Option<&Override>) -> Self {
        match active {
            Some(ov) => Self {
                channel: ov.privacy_channel,
                mute_outsiders: ov.mute_outsiders,
                disallow_listening: ov.disallow_listening_to_channel,
            },
            None => Self::default(),
        }
    }

    #[inline]
    pub fn in_private_channel(&self) -> bool {
        self.channel.is_some()
    }
}

/// Whether a listener can hear a participant whose active Override is on `other_channel`.
///
/// Two channel-less sides count as the same channel, so `disallow_listening`
/// also applies to them.
pub fn can_hear(other_channel: Option<ChannelId>, listener: &ListenerPrivacy) -> bool {
    if other_channel == listener.channel && !listener.disallow_listening {
        return true;
    }
    listener.in_private_channel() && other_channel.is_none() && !listener.mute_outsiders
}

/// Which parameter set applies to an emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Audibility {
    /// Use the emitter's own active Override.
    Override,
    /// Emitter has no Override; use the ambient configuration.
    Ambient,
    Muted,
}

pub fn resolve_audibility(other: Option<&Override>, listener: &ListenerPrivacy) -> Audibility {
    match other {
        Some(ov) if can_hear(ov.privacy_channel, listener) => Audibility::Override,
        Some(_) => Audibility::Muted,
        None if listener.mute_outsiders => Audibility::Muted,
        None => Audibility::Ambient,
    }
}
