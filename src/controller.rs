//! Session state and the generate/edit request lifecycle.

use serde::Serialize;

use crate::{
    attachment::{AttachedImage, AttachmentSlot, SelectedFile},
    error::{PhotorealError, Result},
    gemini::ImageGenerator,
    models::{AttachmentPayload, GenerationOptions, ImageReference, OptionUpdate},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum GenerationState {
    Idle,
    Loading,
    Success(ImageReference),
    Failure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Generate,
    Edit,
}

/// A request issued by [`GenerationController::begin_submit`], tagged with its sequence number.
#[derive(Debug, Clone)]
pub struct PendingGeneration {
    pub seq: u64,
    pub options: GenerationOptions,
    pub attachment: Option<AttachmentPayload>,
}

impl PendingGeneration {
    pub fn mode(&self) -> Mode {
        if self.attachment.is_some() {
            Mode::Edit
        } else {
            Mode::Generate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

pub struct GenerationController<G> {
    client: G,
    options: GenerationOptions,
    attachment: AttachmentSlot,
    state: GenerationState,
    latest_seq: u64,
}

impl<G: ImageGenerator> GenerationController<G> {
    pub fn new(client: G) -> Self {
        Self::with_options(client, GenerationOptions::default())
    }

    pub fn with_options(client: G, options: GenerationOptions) -> Self {
        Self {
            client,
            options,
            attachment: AttachmentSlot::new(),
            state: GenerationState::Idle,
            latest_seq: 0,
        }
    }

    pub fn client(&self) -> &G {
        &self.client
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn set(&mut self, update: OptionUpdate) {
        self.options.set(update);
    }

    pub fn attachment(&self) -> Option<&AttachedImage> {
        self.attachment.current()
    }

    pub fn attachment_slot(&self) -> &AttachmentSlot {
        &self.attachment
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.is_attached()
    }

    pub fn mode(&self) -> Mode {
        if self.has_attachment() {
            Mode::Edit
        } else {
            Mode::Generate
        }
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, GenerationState::Loading)
    }

    /// Whether the submit control should be enabled.
    pub fn submit_enabled(&self) -> bool {
        !self.is_loading() && self.options.is_submittable()
    }

    /// Aspect ratio and resolution selection is inactive while an image is attached.
    pub fn dimension_controls_enabled(&self) -> bool {
        !self.has_attachment()
    }

    /// Attaches a reference image, switching to edit mode. A rejected file leaves the
    /// attachment and options untouched; its message is shown unless a request is in flight.
    pub async fn attach(&mut self, file: SelectedFile) -> Result<()> {
        match self.attachment.attach(file).await {
            Ok(_) => Ok(()),
            Err(err) => {
                if !self.is_loading() {
                    self.state = GenerationState::Failure(err.to_string());
                }
                Err(err)
            }
        }
    }

    pub fn detach(&mut self) {
        self.attachment.detach();
    }

    /// Validates and moves to `Loading`. Returns `None` when a request is already in
    /// flight or the prompt is blank; the latter records the validation failure.
    pub fn begin_submit(&mut self) -> Option<PendingGeneration> {
        if self.is_loading() {
            log::debug!("Submit ignored: request {} still loading", self.latest_seq);
            return None;
        }

        if !self.options.is_submittable() {
            let err = PhotorealError::empty_prompt();
            log::warn!("{}", err);
            self.state = GenerationState::Failure(err.to_string());
            return None;
        }

        self.latest_seq += 1;
        self.state = GenerationState::Loading;

        let pending = PendingGeneration {
            seq: self.latest_seq,
            options: self.options.clone(),
            attachment: self.attachment.payload(),
        };
        log::info!(
            "Request {} started ({:?} mode)",
            pending.seq,
            pending.mode()
        );
        Some(pending)
    }

    /// Applies the outcome of request `seq` if it is still the one being waited on.
    pub fn complete(&mut self, seq: u64, outcome: Result<ImageReference>) -> Completion {
        if seq != self.latest_seq || !self.is_loading() {
            log::debug!(
                "Dropping stale result for request {} (latest is {})",
                seq,
                self.latest_seq
            );
            return Completion::Stale;
        }

        self.state = match outcome {
            Ok(image) => {
                log::info!("Request {} succeeded: {}", seq, image);
                GenerationState::Success(image)
            }
            Err(err) => {
                log::error!("Request {} failed: {}", seq, err);
                GenerationState::Failure(err.to_string())
            }
        };
        Completion::Applied
    }

    /// Runs one full cycle: validate, call the generator, record the outcome.
    pub async fn submit(&mut self) -> &GenerationState {
        if let Some(pending) = self.begin_submit() {
            let outcome = self
                .client
                .generate(&pending.options, pending.attachment.as_ref())
                .await;
            self.complete(pending.seq, outcome);
        }
        &self.state
    }

    /// Returns to `Idle`; a request still in flight will have its result discarded.
    pub fn reset(&mut self) {
        if self.is_loading() {
            log::info!("Abandoning request {}", self.latest_seq);
            self.latest_seq += 1;
        }
        self.state = GenerationState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EMPTY_PROMPT_MESSAGE;
    use crate::models::{AspectRatio, Style};
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;

    enum Reply {
        Image,
        Empty,
        Fail(&'static str),
    }

    struct FakeGenerator {
        reply: Reply,
        calls: Mutex<Vec<(GenerationOptions, Option<AttachmentPayload>)>>,
    }

    impl FakeGenerator {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageGenerator for FakeGenerator {
        async fn generate(
            &self,
            options: &GenerationOptions,
            attachment: Option<&AttachmentPayload>,
        ) -> Result<ImageReference> {
            self.calls
                .lock()
                .unwrap()
                .push((options.clone(), attachment.cloned()));
            match self.reply {
                Reply::Image => Ok(ImageReference::from_bytes("image/jpeg", b"jpeg")),
                Reply::Empty => Err(PhotorealError::no_image(None)),
                Reply::Fail(message) => Err(PhotorealError::generation_failed(message)),
            }
        }
    }

    fn make(reply: Reply) -> GenerationController<FakeGenerator> {
        GenerationController::new(FakeGenerator::new(reply))
    }

    #[tokio::test]
    async fn test_blank_prompt_never_calls_client() {
        for prompt in ["", "   ", "\n\t "] {
            let mut controller = make(Reply::Image);
            controller.set(OptionUpdate::Prompt(prompt.to_string()));

            let state = controller.submit().await.clone();
            assert_eq!(state, GenerationState::Failure(EMPTY_PROMPT_MESSAGE.to_string()));
            assert_eq!(controller.client().call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_successful_generate_cycle() {
        let mut controller = make(Reply::Image);
        controller.set(OptionUpdate::Prompt("a red bicycle on a beach".to_string()));
        assert!(controller.submit_enabled());
        assert_eq!(controller.mode(), Mode::Generate);

        let state = controller.submit().await.clone();
        let GenerationState::Success(image) = state else {
            panic!("expected success, got {:?}", state);
        };
        assert_eq!(image.mime_type(), "image/jpeg");

        let calls = controller.client().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.prompt, "a red bicycle on a beach");
        assert!(calls[0].1.is_none());
    }

    #[tokio::test]
    async fn test_failures_become_failure_state() {
        let mut controller = make(Reply::Empty);
        controller.set(OptionUpdate::Prompt("a cat".to_string()));
        let GenerationState::Failure(message) = controller.submit().await.clone() else {
            panic!("expected failure");
        };
        assert!(message.contains("did not return an image"));

        let mut controller = make(Reply::Fail("quota exceeded"));
        controller.set(OptionUpdate::Prompt("a cat".to_string()));
        assert_eq!(
            controller.submit().await,
            &GenerationState::Failure("Failed to generate image: quota exceeded".to_string())
        );
    }

    #[test]
    fn test_second_submit_while_loading_is_noop() {
        let mut controller = make(Reply::Image);
        controller.set(OptionUpdate::Prompt("a cat".to_string()));

        let first = controller.begin_submit().expect("first submit starts");
        assert!(controller.is_loading());
        assert!(!controller.submit_enabled());
        assert!(controller.begin_submit().is_none());
        assert!(controller.is_loading());

        let image = ImageReference::from_bytes("image/jpeg", b"x");
        assert_eq!(controller.complete(first.seq, Ok(image.clone())), Completion::Applied);
        assert_eq!(controller.state(), &GenerationState::Success(image));
    }

    #[test]
    fn test_superseded_result_is_ignored() {
        let mut controller = make(Reply::Image);
        controller.set(OptionUpdate::Prompt("first".to_string()));
        let first = controller.begin_submit().unwrap();

        controller.reset();
        assert_eq!(controller.state(), &GenerationState::Idle);

        controller.set(OptionUpdate::Prompt("second".to_string()));
        let second = controller.begin_submit().unwrap();
        assert!(second.seq > first.seq);

        let stale = ImageReference::from_bytes("image/jpeg", b"old");
        assert_eq!(controller.complete(first.seq, Ok(stale)), Completion::Stale);
        assert!(controller.is_loading());

        let fresh = ImageReference::from_bytes("image/jpeg", b"new");
        assert_eq!(controller.complete(second.seq, Ok(fresh.clone())), Completion::Applied);
        assert_eq!(controller.state(), &GenerationState::Success(fresh));

        // Completing again after the state settled is also stale.
        assert_eq!(
            controller.complete(second.seq, Err(PhotorealError::generation_failed("late"))),
            Completion::Stale
        );
    }

    #[tokio::test]
    async fn test_cycle_is_repeatable() {
        let mut controller = make(Reply::Image);
        controller.set(OptionUpdate::Prompt("one".to_string()));
        controller.submit().await;
        controller.set(OptionUpdate::Style(Style::Macro));
        controller.set(OptionUpdate::AspectRatio(AspectRatio::Portrait));
        controller.submit().await;

        assert!(matches!(controller.state(), GenerationState::Success(_)));
        let calls = controller.client().calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0.style, Style::Macro);
        assert_eq!(calls[1].0.aspect_ratio, AspectRatio::Portrait);
    }

    #[tokio::test]
    async fn test_edit_mode_passes_attachment() {
        let mut tmp = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        tmp.write_all(b"jpeg bytes").unwrap();

        let mut controller = make(Reply::Image);
        controller.set(OptionUpdate::Prompt("make it night".to_string()));
        controller
            .attach(SelectedFile::from_path(tmp.path()))
            .await
            .unwrap();
        assert_eq!(controller.mode(), Mode::Edit);

        controller.submit().await;
        {
            let calls = controller.client().calls.lock().unwrap();
            let payload = calls[0].1.as_ref().expect("edit payload");
            assert_eq!(payload.mime_type, "image/jpeg");
        }

        controller.detach();
        assert_eq!(controller.mode(), Mode::Generate);
        assert!(controller.attachment().is_none());
    }

    #[tokio::test]
    async fn test_dimension_controls_follow_attachment() {
        let mut tmp = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        tmp.write_all(b"jpeg bytes").unwrap();

        let mut controller = make(Reply::Image);
        assert!(controller.dimension_controls_enabled());

        controller
            .attach(SelectedFile::from_path(tmp.path()))
            .await
            .unwrap();
        assert_eq!(controller.mode(), Mode::Edit);
        assert!(!controller.dimension_controls_enabled());

        controller.detach();
        assert!(controller.dimension_controls_enabled());
    }

    #[tokio::test]
    async fn test_rejected_attachment_leaves_options_alone() {
        let mut controller = make(Reply::Image);
        controller.set(OptionUpdate::Prompt("keep me".to_string()));
        let before = controller.options().clone();

        let err = controller
            .attach(SelectedFile::with_media_type("doc.pdf", "application/pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PhotorealError::InvalidFileType(_)));
        assert!(!controller.has_attachment());
        assert_eq!(controller.options(), &before);
        assert!(matches!(controller.state(), GenerationState::Failure(_)));
    }

    #[test]
    fn test_state_serializes_for_display() {
        let value = serde_json::to_value(GenerationState::Failure("nope".into())).unwrap();
        assert_eq!(value, serde_json::json!({"state": "failure", "value": "nope"}));
        let idle = serde_json::to_value(GenerationState::Idle).unwrap();
        assert_eq!(idle, serde_json::json!({"state": "idle"}));
    }
}
