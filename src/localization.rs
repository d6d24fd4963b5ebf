//! Localization for both bots, backed by Fluent resources compiled into the binary.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use tracing::warn;
use unic_langid::LanguageIdentifier;

pub const DEFAULT_LANGUAGE: &str = "en";

const RESOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("ru", include_str!("../locales/ru/main.ftl")),
];

/// Localization manager shared by both bots
pub struct Localizer {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl Localizer {
    /// Build bundles for every bundled language
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();
        for (code, source) in RESOURCES {
            bundles.insert(code.to_string(), Self::create_bundle(code, source)?);
        }
        Ok(Self { bundles })
    }

    fn create_bundle(code: &str, source: &str) -> Result<FluentBundle<FluentResource>> {
        let locale: LanguageIdentifier = code.parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        // Telegram renders the Unicode isolation marks literally
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("invalid Fluent resource for {code}: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("conflicting Fluent messages for {code}: {errors:?}"))?;
        Ok(bundle)
    }

    /// Supported language for a Telegram `language_code` such as `ru` or `en-US`
    pub fn resolve_language(&self, language_code: Option<&str>) -> &str {
        language_code
            .and_then(|code| code.split(['-', '_']).next())
            .map(|code| code.to_ascii_lowercase())
            .and_then(|code| self.bundles.get_key_value(code.as_str()).map(|(k, _)| k.as_str()))
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Localized message for `key`
    pub fn t(&self, key: &str, language_code: Option<&str>) -> String {
        self.format(key, None, language_code)
    }

    /// Localized message for `key` with named string arguments
    pub fn t_args(&self, key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, FluentValue::from(*value));
        }
        self.format(key, Some(&fluent_args), language_code)
    }

    /// Whether `text` equals the message `key` in any bundled language.
    ///
    /// Used to recognize reply-keyboard button presses regardless of the
    /// language the keyboard was rendered in.
    pub fn matches_any(&self, key: &str, text: &str) -> bool {
        let text = text.trim();
        self.bundles
            .keys()
            .any(|lang| self.format(key, None, Some(lang)).trim().eq_ignore_ascii_case(text))
    }

    fn format(&self, key: &str, args: Option<&FluentArgs>, language_code: Option<&str>) -> String {
        let lang = self.resolve_language(language_code);
        let Some(bundle) = self.bundles.get(lang) else {
            return key.to_string();
        };

        let Some(pattern) = bundle.get_message(key).and_then(|msg| msg.value()) else {
            warn!(key = %key, lang = %lang, "Missing translation");
            return key.to_string();
        };

        let mut errors = Vec::new();
        let value = bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!(key = %key, lang = %lang, errors = ?errors, "Errors while formatting message");
        }
        value.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_language_fallback() {
        let l10n = Localizer::new().unwrap();
        assert_eq!(l10n.resolve_language(Some("ru")), "ru");
        assert_eq!(l10n.resolve_language(Some("en-US")), "en");
        assert_eq!(l10n.resolve_language(Some("de")), "en");
        assert_eq!(l10n.resolve_language(None), "en");
    }

    #[test]
    fn test_missing_key_returns_key() {
        let l10n = Localizer::new().unwrap();
        assert_eq!(l10n.t("no-such-message", None), "no-such-message");
    }
}
