//! Translation routing domain
//!
//! Routing rules decide whether a language pair is translated directly or
//! through an intermediate language; [`Translator`] serves single hops.

mod entity;
mod resolver;
mod translator;

pub use entity::{
    normalize_language, LanguagePair, RoutingRule, TranslationPath, ALL_LANGUAGES, NO_INTERMEDIATE,
};
pub use resolver::{Route, TranslationPathResolver};
pub use translator::Translator;

#[cfg(test)]
pub use translator::MockTranslator;
