//! Scheduler tuning defaults.
//!
//! A participant budget of 0 visits everyone every frame; any other value
//! spreads the sweep over several frames.
use std::time::Duration;

// Participants visited per frame (0 = all)
pub const DEFAULT_PARTICIPANTS_PER_FRAME: usize = 1;

// Time after startup before the first sweep
pub const DEFAULT_START_DELAY: Duration = Duration::from_secs(3);

// Initial capacity of the participant buffer
pub const PARTICIPANT_BUFFER_CAPACITY: usize = 32;
