/// Animation frame period while a scroll transition is in flight (~60 fps).
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Consecutive rejected local matches tolerated before escalating to global search.
pub const DEFAULT_GLOBAL_SEARCH_AFTER_FAILURES: u32 = 8;

/// Buffered driver inputs before senders wait.
pub const INPUT_CHANNEL_CAPACITY: usize = 64;
