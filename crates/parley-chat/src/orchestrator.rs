//! Conversation orchestrator: reads turns from the modality port, routes
//! them, and drives the capability collaborators.
//!
//! One turn completes fully (including any generation polling) before the
//! next utterance is read. Every capability failure is recovered at the
//! dispatch boundary with an apology turn; only the exit intent or a port
//! failure ends the run.

use std::path::Path;

use tracing::{info, warn};

use parley_clients::{
    BlobStore, ChatCompletion, FrameSource, ImageGeneration, ModalityPort, SceneCaption,
};
use parley_core::config::{GenerationConfig, ParleyConfig, PersonaConfig};
use parley_core::types::Intent;

use crate::error::{ChatError, Result};
use crate::poller::{GeneratedImage, JobPoller};
use crate::router::IntentRouter;
use crate::session::DialogueSession;

/// What the run loop should do after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Ended,
}

/// The capability collaborators the orchestrator dispatches to.
pub struct Capabilities {
    pub chat: Box<dyn ChatCompletion>,
    pub vision: Box<dyn SceneCaption>,
    pub imaging: Box<dyn ImageGeneration>,
    pub blobs: Box<dyn BlobStore>,
    pub frames: Box<dyn FrameSource>,
}

/// Routes user turns to the capability services while maintaining a bounded
/// dialogue history.
pub struct ConversationOrchestrator {
    router: IntentRouter,
    session: DialogueSession,
    poller: JobPoller,
    persona: PersonaConfig,
    generation: GenerationConfig,
    caption_language: String,
    capabilities: Capabilities,
}

impl ConversationOrchestrator {
    pub fn new(config: &ParleyConfig, capabilities: Capabilities) -> Self {
        Self {
            router: IntentRouter::new(config.router.clone()),
            session: DialogueSession::new(config.session.window_limit),
            poller: JobPoller::new(config.generation.max_poll_attempts),
            persona: config.persona.clone(),
            generation: config.generation.clone(),
            caption_language: config.services.caption_language.clone(),
            capabilities,
        }
    }

    /// Persist generated images under `dir`, using the configured file name.
    pub fn with_output_dir(mut self, dir: &Path) -> Self {
        let path = dir.join(&self.generation.output_file);
        self.poller = self.poller.with_output_path(path);
        self
    }

    pub fn session(&self) -> &DialogueSession {
        &self.session
    }

    /// Emit the greeting, then read and handle turns until the user exits
    /// or the port fails.
    pub async fn run(&mut self, port: &mut dyn ModalityPort) -> Result<()> {
        port.emit(&self.persona.greeting).map_err(ChatError::Port)?;
        loop {
            let utterance = port.read_utterance().map_err(ChatError::Port)?;
            if self.handle_turn(port, &utterance).await? == TurnOutcome::Ended {
                info!(session_id = %self.session.id(), "Conversation ended");
                return Ok(());
            }
        }
    }

    /// Handle one utterance end to end.
    pub async fn handle_turn(
        &mut self,
        port: &mut dyn ModalityPort,
        utterance: &str,
    ) -> Result<TurnOutcome> {
        let intent = self.router.classify(utterance);
        info!(session_id = %self.session.id(), ?intent, "Handling turn");

        match intent {
            Intent::Empty => {
                port.emit(&self.persona.fallback_reply)
                    .map_err(ChatError::Port)?;
            }
            Intent::Exit => return Ok(TurnOutcome::Ended),
            Intent::Restart => {
                self.session.reset();
                port.emit(&self.persona.greeting).map_err(ChatError::Port)?;
            }
            Intent::GenerateImage => {
                port.emit(&self.persona.generation_ack)
                    .map_err(ChatError::Port)?;
                if let Err(err) = self.generate(utterance).await {
                    self.recover(port, err)?;
                }
            }
            Intent::DescribeScene => {
                port.emit(&self.persona.describe_ack)
                    .map_err(ChatError::Port)?;
                match self.describe_scene().await {
                    Ok(caption) => {
                        let enriched =
                            format!("{} {}: {}", utterance, self.persona.describe_suffix, caption);
                        if let Err(err) = self.answer(port, &enriched).await {
                            self.recover(port, err)?;
                        }
                    }
                    Err(err) => self.recover(port, err)?,
                }
            }
            Intent::Query => {
                if let Err(err) = self.answer(port, utterance).await {
                    self.recover(port, err)?;
                }
            }
        }
        Ok(TurnOutcome::Continue)
    }

    /// Complete `utterance` against the history, emit and record the reply,
    /// then run the imagine-the-scene overlay if either side asked for it.
    ///
    /// Nothing is appended when the completion fails, so the history never
    /// holds a partial exchange.
    async fn answer(&mut self, port: &mut dyn ModalityPort, utterance: &str) -> Result<()> {
        let reply = self
            .capabilities
            .chat
            .complete(
                &self.persona.system_profile,
                self.session.snapshot(),
                utterance,
            )
            .await?;
        port.emit(&reply).map_err(ChatError::Port)?;
        self.session.append(utterance, &reply);

        if self.router.wants_overlay(utterance) || self.router.wants_overlay(&reply) {
            port.emit(&self.persona.imagine_reply)
                .map_err(ChatError::Port)?;
            let caption = self.describe_scene().await?;
            self.generate(&format!("{utterance}: {caption}")).await?;
        }
        Ok(())
    }

    /// Capture a frame, upload it, and caption the uploaded snapshot.
    async fn describe_scene(&self) -> Result<String> {
        let frame = self.capabilities.frames.capture_frame().await?;
        let url = self
            .capabilities
            .blobs
            .upload(
                &self.generation.container,
                &self.generation.snapshot_file,
                &frame,
            )
            .await?;
        let caption = self
            .capabilities
            .vision
            .caption(&url, &self.caption_language)
            .await?;
        info!(caption = %caption.text, confidence = caption.confidence, "Scene captioned");
        Ok(caption.text)
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        info!(prompt, "Starting image generation");
        self.poller
            .run(self.capabilities.imaging.as_ref(), prompt)
            .await
    }

    /// Recover a failed turn: port errors propagate, everything else turns
    /// into an apology and the loop continues.
    fn recover(&self, port: &mut dyn ModalityPort, err: ChatError) -> Result<()> {
        match err {
            ChatError::Port(e) => Err(ChatError::Port(e)),
            other => {
                warn!(session_id = %self.session.id(), error = %other, "Turn failed");
                port.emit(&self.persona.apology).map_err(ChatError::Port)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parley_clients::mock::{
        MockBlobStore, MockChatCompletion, MockFrameSource, MockImageGeneration, MockSceneCaption,
    };
    use parley_clients::MockPort;

    struct Mocks {
        chat: Arc<MockChatCompletion>,
        vision: Arc<MockSceneCaption>,
        imaging: Arc<MockImageGeneration>,
        blobs: Arc<MockBlobStore>,
    }

    fn orchestrator_with(
        chat: MockChatCompletion,
        imaging: MockImageGeneration,
    ) -> (ConversationOrchestrator, Mocks) {
        let mocks = Mocks {
            chat: Arc::new(chat),
            vision: Arc::new(MockSceneCaption::with_caption("um gato no sofá")),
            imaging: Arc::new(imaging),
            blobs: Arc::new(MockBlobStore::new()),
        };
        let capabilities = Capabilities {
            chat: Box::new(mocks.chat.clone()),
            vision: Box::new(mocks.vision.clone()),
            imaging: Box::new(mocks.imaging.clone()),
            blobs: Box::new(mocks.blobs.clone()),
            frames: Box::new(MockFrameSource::new()),
        };
        let orchestrator =
            ConversationOrchestrator::new(&ParleyConfig::default(), capabilities);
        (orchestrator, mocks)
    }

    fn defaults() -> PersonaConfig {
        PersonaConfig::default()
    }

    // ---- simple dispatch ----

    #[tokio::test]
    async fn test_empty_utterance_gets_fallback_and_no_history() {
        let (mut orchestrator, mocks) = orchestrator_with(
            MockChatCompletion::with_reply("oi"),
            MockImageGeneration::succeeding_after(1, 0),
        );
        let mut port = MockPort::default();

        let outcome = orchestrator.handle_turn(&mut port, "").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Continue);
        assert_eq!(port.emitted(), &[defaults().fallback_reply]);
        assert!(orchestrator.session().is_empty());
        assert!(mocks.chat.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exit_ends_the_turn_loop() {
        let (mut orchestrator, _) = orchestrator_with(
            MockChatCompletion::with_reply("oi"),
            MockImageGeneration::succeeding_after(1, 0),
        );
        let mut port = MockPort::default();

        let outcome = orchestrator.handle_turn(&mut port, "sair").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Ended);
        assert!(port.emitted().is_empty());
    }

    #[tokio::test]
    async fn test_query_emits_reply_and_appends_exchange() {
        let (mut orchestrator, mocks) = orchestrator_with(
            MockChatCompletion::with_reply("Brasília."),
            MockImageGeneration::succeeding_after(1, 0),
        );
        let mut port = MockPort::default();

        orchestrator
            .handle_turn(&mut port, "qual a capital do Brasil?")
            .await
            .unwrap();

        assert_eq!(port.emitted(), &["Brasília.".to_string()]);
        assert_eq!(orchestrator.session().len(), 2);

        let calls = mocks.chat.calls();
        assert_eq!(calls[0].system_profile, defaults().system_profile);
        assert_eq!(calls[0].utterance, "qual a capital do Brasil?");
        // The history snapshot passed to the service predates the append.
        assert!(calls[0].history.is_empty());
    }

    #[tokio::test]
    async fn test_restart_clears_history_and_greets_again() {
        let (mut orchestrator, mocks) = orchestrator_with(
            MockChatCompletion::with_reply("resposta"),
            MockImageGeneration::succeeding_after(1, 0),
        );
        let mut port = MockPort::default();

        orchestrator.handle_turn(&mut port, "pergunta").await.unwrap();
        assert_eq!(orchestrator.session().len(), 2);

        orchestrator.handle_turn(&mut port, "limpar").await.unwrap();
        assert!(orchestrator.session().is_empty());
        assert_eq!(port.emitted().last().unwrap(), &defaults().greeting);

        // The next query sees an empty history.
        orchestrator.handle_turn(&mut port, "outra").await.unwrap();
        assert!(mocks.chat.calls().last().unwrap().history.is_empty());
    }

    // ---- image generation ----

    #[tokio::test(start_paused = true)]
    async fn test_generate_acks_then_submits_raw_utterance() {
        let (mut orchestrator, mocks) = orchestrator_with(
            MockChatCompletion::with_reply("oi"),
            MockImageGeneration::succeeding_after(1, 1),
        );
        let mut port = MockPort::default();

        orchestrator
            .handle_turn(&mut port, "gerar uma imagem de um gato")
            .await
            .unwrap();

        assert_eq!(port.emitted(), &[defaults().generation_ack]);
        assert_eq!(
            mocks.imaging.submitted(),
            vec!["gerar uma imagem de um gato".to_string()]
        );
        // Generation turns are not recorded in the dialogue history.
        assert!(orchestrator.session().is_empty());
        assert!(mocks.chat.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_dir_persists_generated_image() {
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, _mocks) = orchestrator_with(
            MockChatCompletion::with_reply("oi"),
            MockImageGeneration::succeeding_after(1, 0),
        );
        let mut orchestrator = orchestrator.with_output_dir(dir.path());
        let mut port = MockPort::default();

        orchestrator
            .handle_turn(&mut port, "gerar um quadro do mar")
            .await
            .unwrap();

        let saved = std::fs::read(dir.path().join("gen_image.jpg")).unwrap();
        assert!(!saved.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_failure_apologizes_and_continues() {
        let (mut orchestrator, _) = orchestrator_with(
            MockChatCompletion::with_reply("oi"),
            MockImageGeneration::failing_with(1, "content filtered"),
        );
        let mut port = MockPort::default();

        let outcome = orchestrator
            .handle_turn(&mut port, "gerar um quadro")
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Continue);
        assert_eq!(
            port.emitted(),
            &[defaults().generation_ack, defaults().apology]
        );
        assert!(orchestrator.session().is_empty());
    }

    // ---- scene description ----

    #[tokio::test]
    async fn test_describe_enriches_utterance_with_caption() {
        let (mut orchestrator, mocks) = orchestrator_with(
            MockChatCompletion::with_reply("Vejo um gato tranquilo."),
            MockImageGeneration::succeeding_after(1, 0),
        );
        let mut port = MockPort::default();

        orchestrator
            .handle_turn(&mut port, "o que você vê agora?")
            .await
            .unwrap();

        let persona = defaults();
        assert_eq!(
            port.emitted(),
            &[persona.describe_ack, "Vejo um gato tranquilo.".to_string()]
        );

        // Snapshot went to the blob store and its URL was captioned in pt.
        assert_eq!(
            mocks.blobs.uploaded(),
            vec![("images".to_string(), "snapshot.jpg".to_string())]
        );
        assert_eq!(
            mocks.vision.calls(),
            vec![("mock://images/snapshot.jpg".to_string(), "pt".to_string())]
        );

        // The completion saw the enriched utterance, and the enriched form
        // is what lands in the history.
        let call = &mocks.chat.calls()[0];
        assert_eq!(
            call.utterance,
            "o que você vê agora? Elabore uma pequena descrição para: um gato no sofá"
        );
        assert_eq!(orchestrator.session().snapshot()[0].content, call.utterance);
    }

    #[tokio::test]
    async fn test_describe_failure_apologizes_without_completion() {
        let mocks_chat = Arc::new(MockChatCompletion::with_reply("oi"));
        let capabilities = Capabilities {
            chat: Box::new(mocks_chat.clone()),
            vision: Box::new(MockSceneCaption::failing()),
            imaging: Box::new(MockImageGeneration::succeeding_after(1, 0)),
            blobs: Box::new(MockBlobStore::new()),
            frames: Box::new(MockFrameSource::new()),
        };
        let mut orchestrator =
            ConversationOrchestrator::new(&ParleyConfig::default(), capabilities);
        let mut port = MockPort::default();

        orchestrator
            .handle_turn(&mut port, "o que você vê?")
            .await
            .unwrap();

        assert_eq!(
            port.emitted(),
            &[defaults().describe_ack, defaults().apology]
        );
        assert!(mocks_chat.calls().is_empty());
        assert!(orchestrator.session().is_empty());
    }

    // ---- completion failure ----

    #[tokio::test]
    async fn test_completion_failure_appends_nothing() {
        let (mut orchestrator, _) = orchestrator_with(
            MockChatCompletion::failing(),
            MockImageGeneration::succeeding_after(1, 0),
        );
        let mut port = MockPort::default();

        let outcome = orchestrator
            .handle_turn(&mut port, "uma pergunta qualquer")
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Continue);
        assert_eq!(port.emitted(), &[defaults().apology]);
        assert!(orchestrator.session().is_empty());
    }

    // ---- imagine-the-scene overlay ----

    #[tokio::test(start_paused = true)]
    async fn test_overlay_fires_on_reply_and_composes_prompt() {
        let (mut orchestrator, mocks) = orchestrator_with(
            MockChatCompletion::with_reply("Feche os olhos e imagine a cena."),
            MockImageGeneration::succeeding_after(1, 1),
        );
        let mut port = MockPort::default();

        orchestrator
            .handle_turn(&mut port, "como seria uma praia em Marte?")
            .await
            .unwrap();

        let persona = defaults();
        assert_eq!(
            port.emitted(),
            &[
                "Feche os olhos e imagine a cena.".to_string(),
                persona.imagine_reply,
            ]
        );
        // The generation prompt folds the scene caption into the question.
        assert_eq!(
            mocks.imaging.submitted(),
            vec!["como seria uma praia em Marte?: um gato no sofá".to_string()]
        );
        // The exchange itself was recorded before the overlay ran.
        assert_eq!(orchestrator.session().len(), 2);
    }

    #[tokio::test]
    async fn test_no_overlay_for_plain_reply() {
        let (mut orchestrator, mocks) = orchestrator_with(
            MockChatCompletion::with_reply("Uma resposta comum."),
            MockImageGeneration::succeeding_after(1, 0),
        );
        let mut port = MockPort::default();

        orchestrator.handle_turn(&mut port, "pergunta").await.unwrap();
        assert!(mocks.imaging.submitted().is_empty());
    }
}
