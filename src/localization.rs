use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use unic_langid::LanguageIdentifier;

/// Language used when the user's language is unknown or unsupported
pub const DEFAULT_LANGUAGE: &str = "ru";

/// Languages with a bundled translation
pub const SUPPORTED_LANGUAGES: &[&str] = &["ru", "en"];

fn resource_source(language: &str) -> Option<&'static str> {
    match language {
        "ru" => Some(include_str!("../locales/ru/main.ftl")),
        "en" => Some(include_str!("../locales/en/main.ftl")),
        _ => None,
    }
}

/// Localization manager for the flights bot
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every supported language loaded
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for language in SUPPORTED_LANGUAGES {
            let locale: LanguageIdentifier = language.parse()?;
            let bundle = Self::create_bundle(&locale)?;
            bundles.insert(language.to_string(), Arc::new(bundle));
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Telegram renders the bidi isolation marks literally
        bundle.set_use_isolating(false);

        let source = resource_source(&locale.to_string())
            .ok_or_else(|| anyhow!("No resource for locale {locale}"))?;
        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Failed to parse {locale} resource: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Failed to add {locale} resource: {errors:?}"))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific language, falling back to the default
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {}", key),
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::from(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }

    /// Get a localized message in the default language
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, &str>>) -> String {
        self.get_message_in_language(key, DEFAULT_LANGUAGE, args)
    }
}

/// Map a Telegram language code (`en-US`, `ru`, ...) to a supported language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let Some(code) = language_code else {
        return DEFAULT_LANGUAGE;
    };
    let primary = code.split(['-', '_']).next().unwrap_or_default().to_lowercase();

    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| **lang == primary)
        .copied()
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Global localization instance
static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager
pub fn init_localization() -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_none() {
        let manager = LocalizationManager::new()?;
        // A concurrent initializer may have won the race; both managers are identical
        let _ = LOCALIZATION_MANAGER.set(manager);
    }
    Ok(())
}

fn manager() -> Option<&'static LocalizationManager> {
    if LOCALIZATION_MANAGER.get().is_none() {
        if let Err(e) = init_localization() {
            tracing::error!(error = %e, "Failed to initialize localization");
        }
    }
    LOCALIZATION_MANAGER.get()
}

/// Get a localized message for the given Telegram language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    match manager() {
        Some(manager) => manager.get_message_in_language(key, detect_language(language_code), None),
        None => format!("Missing translation: {}", key),
    }
}

/// Get a localized message with arguments for the given Telegram language code
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    match manager() {
        Some(manager) => {
            manager.get_message_in_language(key, detect_language(language_code), Some(&args_map))
        }
        None => format!("Missing translation: {}", key),
    }
}
