//! Label lookup for the tray menu and status texts.
//!
//! Two languages are supported. The language is detected once from the
//! locale environment variables.

use std::sync::OnceLock;

/// Supported UI languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    /// Japanese
    Ja,
    /// English
    En,
}

impl Lang {
    /// Detects the language from `LC_ALL`, `LC_MESSAGES` and `LANG`.
    pub fn detect() -> Self {
        let locale = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.is_empty());
        Self::from_locale(locale.as_deref())
    }

    /// Maps a locale string such as `ja_JP.UTF-8` to a language.
    pub fn from_locale(locale: Option<&str>) -> Self {
        match locale {
            Some(l) if l.to_ascii_lowercase().starts_with("ja") => Lang::Ja,
            _ => Lang::En,
        }
    }

    /// Returns the short language code.
    pub fn code(&self) -> &'static str {
        match self {
            Lang::Ja => "ja",
            Lang::En => "en",
        }
    }

    /// Looks up a label, returning the key itself when it is unknown.
    pub fn tr<'a>(&self, key: &'a str) -> &'a str {
        let table = match self {
            Lang::Ja => JA,
            Lang::En => EN,
        };
        table
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or(key)
    }
}

/// Returns the process-wide language, detected on first use.
pub fn current() -> Lang {
    static LANG: OnceLock<Lang> = OnceLock::new();
    *LANG.get_or_init(Lang::detect)
}

/// Looks up a label in the process-wide language.
pub fn tr(key: &str) -> &str {
    current().tr(key)
}

const JA: &[(&str, &str)] = &[
    ("work_noise", "作業用ノイズ"),
    ("break_noise", "休憩用ノイズ"),
    ("none", "なし"),
    ("stop_timer", "タイマーを停止"),
    ("show_timer", "タイマーを表示"),
    ("settings_menu", "設定..."),
    ("credits", "クレジット"),
    ("quit", "アプリを終了"),
    ("state_stopped", "停止中"),
    ("state_work", "作業中"),
    ("state_break", "休憩中"),
    ("state_paused", "一時停止中"),
    ("status_fmt", "状態: {state} (残り {time})"),
    ("start", "タイマーを開始"),
    ("resume", "タイマーを再開"),
    ("pause", "タイマーを一時停止"),
    ("tooltip", "LeanFocus"),
];

const EN: &[(&str, &str)] = &[
    ("work_noise", "Work Noise"),
    ("break_noise", "Break Noise"),
    ("none", "None"),
    ("stop_timer", "Stop Timer"),
    ("show_timer", "Show Timer"),
    ("settings_menu", "Settings..."),
    ("credits", "Credits"),
    ("quit", "Quit"),
    ("state_stopped", "Stopped"),
    ("state_work", "Working"),
    ("state_break", "Break"),
    ("state_paused", "Paused"),
    ("status_fmt", "Status: {state} (Left {time})"),
    ("start", "Start Timer"),
    ("resume", "Resume Timer"),
    ("pause", "Pause Timer"),
    ("tooltip", "LeanFocus"),
];
