// i18n.rs
//
// Runtime string tables:
// - Built-in tables are compiled in from assets/i18n.json ({ "<lang>": { "key": "value" } })
// - Overrides are read from assets/i18n/<lang>.json or assets/i18n.json next to the
//   executable or in the working directory, and win over the built-in strings
// - Lookup: tr("key") / tr_with("key", &[("name", "...")]) with {name} placeholders
//
// Language selection: --lang <code>, then PANORAMA_LANG, then the config file, then ko.

use once_cell::sync::OnceCell;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const DEFAULT_LANG: &str = "ko";

const BUILTIN: &str = include_str!("../assets/i18n.json");

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: HashMap<String, String>,
    fallback_map: HashMap<String, String>,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

type Tables = HashMap<String, HashMap<String, String>>;

fn builtin_table(lang: &str) -> HashMap<String, String> {
    serde_json::from_str::<Tables>(BUILTIN)
        .ok()
        .and_then(|mut all| all.remove(lang))
        .unwrap_or_default()
}

fn load_json_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn load_multi_lang_json(path: &Path, lang: &str) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    let mut all: Tables = serde_json::from_str(&text).ok()?;
    all.remove(lang)
}

/// Candidate locations for `rel`: next to the executable first, then the working dir.
fn asset_candidates(rel: &Path) -> Vec<PathBuf> {
    let mut out = Vec::with_capacity(2);
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            out.push(dir.join("assets").join(rel));
        }
    }
    out.push(PathBuf::from("assets").join(rel));
    out
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    let mut map = builtin_table(lang);

    let per_lang = PathBuf::from("i18n").join(format!("{lang}.json"));
    let override_map = asset_candidates(&per_lang)
        .iter()
        .find_map(|p| load_json_map(p))
        .or_else(|| {
            asset_candidates(Path::new("i18n.json"))
                .iter()
                .find_map(|p| load_multi_lang_json(p, lang))
        });

    if let Some(extra) = override_map {
        map.extend(extra);
    }
    map
}

impl I18n {
    pub fn new(lang: impl Into<String>) -> Self {
        let lang = lang.into();
        let map = load_lang(&lang);
        let fallback_map = if lang == DEFAULT_LANG {
            HashMap::new()
        } else {
            load_lang(DEFAULT_LANG)
        };
        Self {
            lang,
            map,
            fallback_map,
        }
    }

    /// Localized text for `key`, or the key itself when no table has it.
    pub fn lookup(&self, key: &str) -> String {
        self.map
            .get(key)
            .or_else(|| self.fallback_map.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Initialize global i18n. Later calls replace the active language.
pub fn init(lang: impl Into<String>) {
    let i = I18n::new(lang);
    let lock = I18N.get_or_init(|| RwLock::new(i.clone()));
    if let Ok(mut w) = lock.write() {
        *w = i;
    }
}

/// Get localized text by key. If key missing, returns key itself.
pub fn tr(key: &str) -> String {
    let lock = I18N.get_or_init(|| RwLock::new(I18n::new(DEFAULT_LANG)));
    match lock.read() {
        Ok(i) => i.lookup(key),
        Err(_) => key.to_string(),
    }
}

fn substitute(mut s: String, args: &[(&str, String)]) -> String {
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}

/// Get localized text and substitute `{name}` placeholders.
/// Any placeholder not provided is kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    substitute(tr(key), args)
}

/// Choose the UI language: explicit argument, then PANORAMA_LANG, then `configured`.
pub fn resolve_lang(cli: Option<&str>, configured: &str) -> String {
    if let Some(v) = cli.filter(|v| !v.trim().is_empty()) {
        return v.to_string();
    }
    if let Ok(v) = std::env::var("PANORAMA_LANG") {
        if !v.trim().is_empty() {
            return v;
        }
    }
    if configured.trim().is_empty() {
        DEFAULT_LANG.to_string()
    } else {
        configured.to_string()
    }
}
