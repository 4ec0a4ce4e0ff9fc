pub mod fanout;
pub mod payload;
pub mod registry;
pub mod translate;

pub use fanout::TranslationFanout;
pub use payload::CaptionPayload;
pub use registry::{CallRegistry, OutboundFrame, Participant};
pub use translate::{HttpTranslator, Translator};
