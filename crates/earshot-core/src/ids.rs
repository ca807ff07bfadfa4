use std::fmt;

/// Session-unique participant identifier.
///
/// Ids are reused only after a participant has been removed from every
/// registry, see [`crate::OverrideDirectory::participant_left`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for ParticipantId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Privacy channel identifier. Participants on different channels never hear each other.
pub type ChannelId = u32;

/// Bit mask of physics categories considered by a ray query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// Mask containing exactly the given layers.
    pub fn from_layers(layers: &[u32]) -> Self {
        layers
            .iter()
            .fold(Self::NONE, |mask, &layer| mask.with_layer(layer))
    }

    #[inline]
    pub fn with_layer(self, layer: u32) -> Self {
        match 1u32.checked_shl(layer) {
            Some(bit) => Self(self.0 | bit),
            None => self,
        }
    }

    #[inline]
    pub fn without_layer(self, layer: u32) -> Self {
        match 1u32.checked_shl(layer) {
            Some(bit) => Self(self.0 & !bit),
            None => self,
        }
    }

    #[inline]
    pub fn contains_layer(self, layer: u32) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}
