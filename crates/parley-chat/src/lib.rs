//! Conversation core for the Parley assistant.
//!
//! Routes each user turn to a capability (chat completion, scene
//! description, long-running image generation) while keeping a bounded
//! dialogue history. The orchestrator talks to the outside world only
//! through the traits in `parley-clients`, so the whole core runs against
//! mocks in tests.

pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod router;
pub mod session;

pub use error::{ChatError, Result};
pub use orchestrator::{Capabilities, ConversationOrchestrator, TurnOutcome};
pub use poller::{GeneratedImage, JobPoller};
pub use router::IntentRouter;
pub use session::DialogueSession;
