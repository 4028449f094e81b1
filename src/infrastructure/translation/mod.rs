//! Translation services backed by assistants

mod assistant_translator;
mod path_executor;

pub use assistant_translator::AssistantTranslator;
pub use path_executor::{TranslationOutcome, TranslationPathExecutor};
