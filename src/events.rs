use druid::Selector;

// Commands submitted from background rounds back to the UI thread.
pub const SUGGESTION_PROGRESS: Selector<(usize, usize)> = Selector::new("suggestion_progress");
pub const SUGGESTION_DONE: Selector<String> = Selector::new("suggestion_done");
pub const RENAME_DONE: Selector<String> = Selector::new("rename_done");
