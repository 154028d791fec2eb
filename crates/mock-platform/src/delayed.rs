//! Delayed gateway - wraps another gateway with artificial latency.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use voice_core::{
    AudioFrame, BackendSpec, InferenceGateway, PipelineError, ResponseAction, ResponseRequest,
};

/// A gateway that wraps another gateway and delays every reasoning call.
///
/// Useful for simulating backend latency and teardown mid-reply.
pub struct DelayedGateway<G: InferenceGateway> {
    inner: G,
    delay: Duration,
}

impl<G: InferenceGateway> DelayedGateway<G> {
    /// Create a new DelayedGateway wrapping the given gateway.
    pub fn new(inner: G, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a gateway with a delay in milliseconds.
    pub fn with_millis(inner: G, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<G: InferenceGateway> InferenceGateway for DelayedGateway<G> {
    async fn transcribe(
        &self,
        spec: &BackendSpec,
        frame: &AudioFrame,
    ) -> Result<Option<String>, PipelineError> {
        self.inner.transcribe(spec, frame).await
    }

    async fn respond(
        &self,
        spec: &BackendSpec,
        request: ResponseRequest,
    ) -> Result<ResponseAction, PipelineError> {
        sleep(self.delay).await;
        self.inner.respond(spec, request).await
    }

    async fn synthesize(
        &self,
        spec: &BackendSpec,
        text: &str,
    ) -> Result<AudioFrame, PipelineError> {
        self.inner.synthesize(spec, text).await
    }

    fn denoise(&self, filter: &str, frame: &mut AudioFrame) {
        self.inner.denoise(filter, frame)
    }
}
