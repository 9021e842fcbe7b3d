use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

pub mod api;
pub mod badges;
pub mod blog;
pub mod brief;
pub mod config;
pub mod csvio;
pub mod genlog;
pub mod ledger;
pub mod overrides;
pub mod planner;
pub mod progress;
pub mod prompts;
pub mod reference;
pub mod settings;
pub mod shorts;
pub mod srt;
pub mod store;
pub mod theme;

pub type StudioLogHook = Arc<Mutex<dyn Fn(&str) + Send + Sync + 'static>>;

static LOG_HOOK: Lazy<Mutex<Option<StudioLogHook>>> = Lazy::new(|| Mutex::new(None));

pub fn set_log_hook(hook: Option<StudioLogHook>) {
    if let Ok(mut guard) = LOG_HOOK.lock() {
        *guard = hook;
    }
}

pub(crate) fn logv(tag: &str, message: &str) {
    eprintln!("[{}] {}", tag, message);

    if let Ok(guard) = LOG_HOOK.lock() {
        if let Some(hook) = guard.as_ref() {
            if let Ok(callback) = hook.lock() {
                let line = format!("[{}] {}", tag, message);
                callback(&line);
            }
        }
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}

pub mod init;
