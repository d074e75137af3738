//! Question/answer automation against a web chat assistant.
//!
//! The crate is built around two algorithms:
//!
//! - [`extract::ResponseExtractor`]: walks an ordered list of CSS selector
//!   candidates and returns the first answer long enough to be real, falling
//!   back to a generic scan of the page.
//! - [`completion::CompletionDetector`]: a bounded two-phase wait on the
//!   assistant's "thinking" indicator.
//!
//! [`pipeline::AskPipeline`] ties them to the submit sequencer, the
//! bot-message listing and the [`sink::ArtifactSink`]. Everything talks to the
//! browser through [`chatprobe_drivers::ChatPage`].

pub mod completion;
pub mod extract;
pub mod fallback;
pub mod messages;
pub mod pipeline;
pub mod probe;
pub mod sink;
pub mod submit;
pub mod types;

pub use completion::{CompletionDetector, CompletionReport};
pub use extract::ResponseExtractor;
pub use pipeline::{AskOutcome, AskPipeline, AskRequest, FollowUpOutcome};
pub use probe::{probe_selectors, ProbeResult, SelectorReport};
pub use sink::ArtifactSink;
pub use submit::{QuestionSubmitter, SubmitControl, Submitted};
pub use types::{BotMessage, ResponseResult, SelectorCandidate};
