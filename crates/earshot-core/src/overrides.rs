//! Overrides: named, prioritized attenuation bundles attached to participants.
//!
//! An Override is owned by whichever authoring component created it (a zone
//! trigger, a door, a UI toggle) through an [`OverrideHandle`]. Registries only
//! keep [`OverrideRef`]s, so dropping the last handle makes the Override stale
//! everywhere at once. Stale references are expected steady-state and are
//! compacted away lazily.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use fnv::FnvHashSet;

use crate::{AttenuationParams, ChannelId, ParticipantId, ReverbSettings};

/// Listeners that must never resolve to a given Override.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListenerBlacklist {
    listeners: FnvHashSet<ParticipantId>,
}

impl ListenerBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(listeners: impl IntoIterator<Item = ParticipantId>) -> Self {
        Self {
            listeners: listeners.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, listener: ParticipantId) -> bool {
        self.listeners.insert(listener)
    }

    pub fn remove(&mut self, listener: ParticipantId) -> bool {
        self.listeners.remove(&listener)
    }

    #[inline]
    pub fn excludes(&self, listener: ParticipantId) -> bool {
        self.listeners.contains(&listener)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Override {
    pub name: String,
    /// Changed only through `OverrideDirectory::set_priority`, which keeps registries ordered.
    priority: i32,
    pub params: AttenuationParams,
    pub privacy_channel: Option<ChannelId>,
    /// Channel members additionally refuse to hear anyone outside the channel.
    pub mute_outsiders: bool,
    /// The local participant, while affected, does not hear its own channel.
    pub disallow_listening_to_channel: bool,
    pub blacklist: Option<ListenerBlacklist>,
    pub reverb: Option<ReverbSettings>,
    affected: FnvHashSet<ParticipantId>,
}

impl Override {
    pub fn new(name: impl Into<String>, priority: i32, params: AttenuationParams) -> Self {
        Self {
            name: name.into(),
            priority,
            params: params.sanitized(),
            privacy_channel: None,
            mute_outsiders: false,
            disallow_listening_to_channel: false,
            blacklist: None,
            reverb: None,
            affected: FnvHashSet::default(),
        }
    }

    pub fn with_privacy_channel(mut self, channel: ChannelId) -> Self {
        self.privacy_channel = Some(channel);
        self
    }

    pub fn with_mute_outsiders(mut self, mute: bool) -> Self {
        self.mute_outsiders = mute;
        self
    }

    pub fn with_disallow_listening(mut self, disallow: bool) -> Self {
        self.disallow_listening_to_channel = disallow;
        self
    }

    pub fn with_blacklist(mut self, blacklist: ListenerBlacklist) -> Self {
        self.blacklist = Some(blacklist);
        self
    }

    pub fn with_reverb(mut self, reverb: ReverbSettings) -> Self {
        self.reverb = Some(reverb);
        self
    }

    #[inline]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// True if `listener` is excluded by this Override's blacklist.
    #[inline]
    pub fn is_blacklisted(&self, listener: ParticipantId) -> bool {
        self.blacklist
            .as_ref()
            .is_some_and(|b| b.excludes(listener))
    }

    pub fn is_affected(&self, participant: ParticipantId) -> bool {
        self.affected.contains(&participant)
    }

    /// Participants currently marked as affected, in no particular order.
    pub fn affected(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.affected.iter().copied()
    }

    pub fn affected_count(&self) -> usize {
        self.affected.len()
    }

    // Only the directory mutates the affected set, alongside the registries.
    pub(crate) fn mark_affected(&mut self, participant: ParticipantId) -> bool {
        self.affected.insert(participant)
    }

    pub(crate) fn unmark_affected(&mut self, participant: ParticipantId) -> bool {
        self.affected.remove(&participant)
    }
}

/// Owning handle to an Override. Cloning shares the same Override.
#[derive(Clone)]
pub struct OverrideHandle(Rc<RefCell<Override>>);

impl OverrideHandle {
    pub fn new(ov: Override) -> Self {
        Self(Rc::new(RefCell::new(ov)))
    }

    pub fn borrow(&self) -> Ref<'_, Override> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Override> {
        self.0.borrow_mut()
    }

    pub fn downgrade(&self) -> OverrideRef {
        OverrideRef(Rc::downgrade(&self.0))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &OverrideHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn refers_to(&self, r: &OverrideRef) -> bool {
        std::ptr::eq(Rc::as_ptr(&self.0), r.0.as_ptr())
    }
}

impl fmt::Debug for OverrideHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(ov) => write!(f, "OverrideHandle({:?}, priority={})", ov.name, ov.priority),
            Err(_) => f.write_str("OverrideHandle(<borrowed>)"),
        }
    }
}

impl From<Override> for OverrideHandle {
    fn from(ov: Override) -> Self {
        Self::new(ov)
    }
}

/// Non-owning reference to an Override. May become stale at any time.
#[derive(Clone, Default)]
pub struct OverrideRef(Weak<RefCell<Override>>);

impl OverrideRef {
    /// A reference that was never live.
    pub fn dangling() -> Self {
        Self(Weak::new())
    }

    pub fn upgrade(&self) -> Option<OverrideHandle> {
        self.0.upgrade().map(OverrideHandle)
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Identity comparison. Stale references keep their allocation alive, so
    /// a stale reference never compares equal to a newer Override.
    #[inline]
    pub fn ptr_eq(&self, other: &OverrideRef) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }

    /// Priority of the referenced Override, `None` if stale.
    pub fn priority(&self) -> Option<i32> {
        self.0.upgrade().map(|ov| ov.borrow().priority)
    }
}

impl fmt::Debug for OverrideRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(handle) => write!(f, "OverrideRef -> {handle:?}"),
            None => f.write_str("OverrideRef(<stale>)"),
        }
    }
}

impl From<&OverrideHandle> for OverrideRef {
    fn from(handle: &OverrideHandle) -> Self {
        handle.downgrade()
    }
}
