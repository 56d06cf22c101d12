/// Output folder used when neither a language code nor a folder is given.
pub const DEFAULT_LANG_DIR: &str = "ChineseTraditional";

/// RimWorld language folders and the codes that select them.
const LANGUAGES: &[(&str, &[&str])] = &[
    ("English", &["en", "en-us", "en-gb"]),
    ("ChineseSimplified", &["zh", "zh-cn", "zh-sg", "zh-hans", "cn"]),
    ("ChineseTraditional", &["zh-tw", "zh-hk", "zh-mo", "zh-hant", "tw"]),
    ("Japanese", &["ja", "ja-jp", "jp"]),
    ("Korean", &["ko", "ko-kr", "kr"]),
    ("Russian", &["ru", "ru-ru"]),
    ("Ukrainian", &["uk", "uk-ua"]),
    ("French", &["fr", "fr-fr", "fr-ca"]),
    ("German", &["de", "de-de"]),
    ("Spanish", &["es", "es-es"]),
    ("SpanishLatin", &["es-419", "es-mx", "es-ar", "es-cl", "es-co"]),
    ("Portuguese", &["pt", "pt-pt"]),
    ("PortugueseBrazilian", &["pt-br"]),
    ("Polish", &["pl", "pl-pl"]),
    ("Italian", &["it", "it-it"]),
    ("Turkish", &["tr", "tr-tr"]),
    ("Czech", &["cs", "cs-cz"]),
    ("Hungarian", &["hu", "hu-hu"]),
    ("Dutch", &["nl", "nl-nl"]),
    ("Romanian", &["ro", "ro-ro"]),
    ("Thai", &["th", "th-th"]),
    ("Greek", &["el", "el-gr"]),
];

/// Map a language code (`zh-TW`, `ru`) or folder name (`Russian`) to the
/// RimWorld language folder. Unknown codes become CamelCase (`xx-yy` → `XxYy`).
pub fn rimworld_lang_dir(lang: &str) -> String {
    let trimmed = lang.trim();
    if let Some((folder, _)) = LANGUAGES
        .iter()
        .find(|(folder, _)| folder.eq_ignore_ascii_case(trimmed))
    {
        return folder.to_string();
    }
    let code = trimmed.to_ascii_lowercase().replace('_', "-");
    if let Some((folder, _)) = LANGUAGES.iter().find(|(_, codes)| codes.contains(&code.as_str())) {
        return folder.to_string();
    }
    code.split('-')
        .filter(|p| !p.is_empty())
        .map(|p| {
            let mut chars = p.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// A custom folder name wins over a language code; both fall back to
/// [`DEFAULT_LANG_DIR`].
pub fn resolve_lang_dir(lang: Option<&str>, lang_dir: Option<&str>) -> String {
    if let Some(dir) = lang_dir.map(str::trim).filter(|d| !d.is_empty()) {
        return dir.to_string();
    }
    match lang.map(str::trim).filter(|l| !l.is_empty()) {
        Some(code) => rimworld_lang_dir(code),
        None => DEFAULT_LANG_DIR.to_string(),
    }
}
