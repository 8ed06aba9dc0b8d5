//! Locale-aware resolution of validation messages.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use faultgate_errors::BindError;
use indexmap::IndexMap;
use regex::{Captures, Regex};

#[allow(clippy::expect_used)] // good regex, it doesn't panic
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\d+)\}").expect("static regex should not panic"));

/// A language tag such as `en` or `ru-RU`, normalized to lower case with `-` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().replace('_', "-").to_ascii_lowercase())
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// First language of an `Accept-Language` header; quality values are ignored.
    #[must_use]
    pub fn from_accept_language(header: Option<&str>, default: &Self) -> Self {
        header
            .and_then(|value| value.split(',').next())
            .and_then(|entry| entry.split(';').next())
            .map(str::trim)
            .filter(|tag| !tag.is_empty() && *tag != "*")
            .map_or_else(|| default.clone(), Self::new)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en")
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable `locale -> code -> template` catalog with `{0}`-style placeholders.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    default_locale: Locale,
    bundles: HashMap<Locale, HashMap<String, String>>,
}

impl MessageCatalog {
    #[must_use]
    pub fn new(default_locale: Locale) -> Self {
        Self {
            default_locale,
            bundles: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_bundle<I, K, V>(mut self, locale: &Locale, messages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.bundles
            .entry(locale.clone())
            .or_default()
            .extend(messages.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    /// Resolve `code` for `locale`: exact tag, bare language, then the default locale.
    #[must_use]
    pub fn resolve(&self, code: &str, arguments: &[String], locale: &Locale) -> Option<String> {
        let candidates = [
            locale.clone(),
            Locale::new(locale.language()),
            self.default_locale.clone(),
            Locale::new(self.default_locale.language()),
        ];
        candidates
            .iter()
            .find_map(|candidate| self.bundles.get(candidate)?.get(code))
            .map(|template| substitute(template, arguments))
    }
}

/// Replace each `{n}` with `arguments[n]` in one pass; unknown indexes stay as written.
fn substitute(template: &str, arguments: &[String]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| arguments.get(index))
                .map_or_else(|| caps[0].to_owned(), Clone::clone)
        })
        .into_owned()
}

/// A resolved message for one object or field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    pub name: String,
    pub message: String,
}

/// Turns a [`BindError`] into display messages.
#[derive(Debug, Clone)]
pub struct ValidationMessages {
    catalog: Arc<MessageCatalog>,
}

impl ValidationMessages {
    #[must_use]
    pub fn new(catalog: Arc<MessageCatalog>) -> Self {
        Self { catalog }
    }

    /// Object-level messages first, then field-level ones, each in reported order.
    #[must_use]
    pub fn format(&self, errors: &BindError, locale: &Locale) -> Vec<FieldMessage> {
        let globals = errors.global_errors.iter().map(|e| FieldMessage {
            name: e.object_name.clone(),
            message: self.resolve(
                e.code.as_deref(),
                &e.arguments,
                e.default_message.as_deref(),
                locale,
            ),
        });
        let fields = errors.field_errors.iter().map(|e| FieldMessage {
            name: e.field.clone(),
            message: self.resolve(
                e.code.as_deref(),
                &e.arguments,
                e.default_message.as_deref(),
                locale,
            ),
        });
        globals.chain(fields).collect()
    }

    /// Name to message; when a name repeats, its first message is kept.
    #[must_use]
    pub fn to_map(&self, errors: &BindError, locale: &Locale) -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        for FieldMessage { name, message } in self.format(errors, locale) {
            map.entry(name).or_insert(message);
        }
        map
    }

    /// `"<field>: <message>"` lines for non-structured rendering.
    #[must_use]
    pub fn to_display_list(&self, errors: &BindError, locale: &Locale) -> Vec<String> {
        self.to_map(errors, locale)
            .into_iter()
            .map(|(name, message)| format!("{name}: {message}"))
            .collect()
    }

    fn resolve(
        &self,
        code: Option<&str>,
        arguments: &[String],
        default_message: Option<&str>,
        locale: &Locale,
    ) -> String {
        let Some(code) = code else {
            return default_message.unwrap_or_default().to_owned();
        };
        self.catalog
            .resolve(code, arguments, locale)
            .or_else(|| default_message.map(str::to_owned))
            .unwrap_or_else(|| code.to_owned())
    }
}
