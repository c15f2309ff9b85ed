// src/watch/mod.rs

//! File watching: which paths trigger which tasks, and the notify-backed
//! watcher feeding the watch loop.

pub mod patterns;
pub mod watcher;

pub use patterns::{compile_rules, tasks_for_path, WatchRule};
pub use watcher::{spawn_watcher, WatcherHandle};
