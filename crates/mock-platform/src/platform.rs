//! Recording platform - runs sessions in-process and records what happens.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};
use voice_core::{
    AgentSpec, AmbientClip, AmbientPlayer, CallContext, CallController, InferenceGateway,
    MediaPlatform, MediaSession, Participant, PipelineError, PlanSummary, ResponseAction,
    ResponseRequest, SessionPlan, Speaker, ToolExecutor, ToolRequest, ToolResult, Turn,
    VoiceActivityDetector,
};

use crate::echo::EchoGateway;
use crate::vad::EnergyVad;

/// Upper bound on tool calls answered within one caller turn.
const MAX_TOOL_ROUNDS: usize = 3;

/// Something observable that happened in a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session was started.
    Started {
        plan: PlanSummary,
        instructions: String,
        tools: Vec<String>,
    },
    /// A reply was requested with explicit instructions.
    Reply {
        instructions: String,
        allow_interruptions: bool,
    },
    /// The caller spoke.
    CallerSaid(String),
    /// The agent spoke.
    AgentSaid(String),
    /// A tool ran. `None` means the result was discarded.
    ToolCalled { name: String, result: Option<String> },
    /// A noise filter was chosen for a participant.
    FilterSelected { identity: String, filter: String },
    /// The ambient loop started.
    AmbientStarted { clip: AmbientClip, volume: f32 },
}

/// Faults to inject into the platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformFaults {
    pub vad_load: bool,
    pub session_start: bool,
    pub greeting: bool,
    pub ambient: bool,
}

type EventLog = Arc<Mutex<Vec<SessionEvent>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Started {
    plan: SessionPlan,
    agent: AgentSpec,
    tools: Arc<dyn ToolExecutor>,
}

/// A session that runs the conversation loop in-process.
pub struct RecordingSession {
    ctx: CallContext,
    faults: PlatformFaults,
    events: EventLog,
    started: Mutex<Option<Arc<Started>>>,
    turns: Mutex<Vec<Turn>>,
    tool_calls: AtomicUsize,
}

impl RecordingSession {
    fn new(ctx: CallContext, faults: PlatformFaults) -> Self {
        Self {
            ctx,
            faults,
            events: Arc::new(Mutex::new(Vec::new())),
            started: Mutex::new(None),
            turns: Mutex::new(Vec::new()),
            tool_calls: AtomicUsize::new(0),
        }
    }

    /// Everything recorded so far, in order.
    pub fn events(&self) -> Vec<SessionEvent> {
        lock(&self.events).clone()
    }

    /// Whether `start` has completed.
    pub fn is_started(&self) -> bool {
        lock(&self.started).is_some()
    }

    fn record(&self, event: SessionEvent) {
        debug!("Session {}: {:?}", self.ctx.call_id(), event);
        lock(&self.events).push(event);
    }

    fn started(&self) -> Result<Arc<Started>, PipelineError> {
        lock(&self.started)
            .clone()
            .ok_or_else(|| PipelineError::Unavailable("session not started".to_string()))
    }

    /// A participant joined; apply the session's noise filter policy.
    ///
    /// Returns the chosen filter name.
    pub fn join_participant(&self, participant: &Participant) -> Result<String, PipelineError> {
        let started = self.started()?;
        let filter = started.plan.noise_filter.filter_for(participant);
        let name = filter.name().to_string();
        self.record(SessionEvent::FilterSelected {
            identity: participant.identity.clone(),
            filter: name.clone(),
        });
        Ok(name)
    }

    /// Run one caller turn through the reasoning backend.
    ///
    /// Returns what the agent said, or `None` if the call closed while a
    /// tool was running.
    pub async fn caller_says(&self, text: &str) -> Result<Option<String>, PipelineError> {
        let started = self.started()?;
        if self.ctx.is_closed() {
            return Err(PipelineError::CallClosed);
        }
        self.record(SessionEvent::CallerSaid(text.to_string()));
        self.push_turn(Turn::new(Speaker::Caller, text));

        for _ in 0..MAX_TOOL_ROUNDS {
            match started.plan.llm.respond(self.request(&started, None)).await? {
                ResponseAction::Say(reply) => {
                    self.speak(&started, &reply).await?;
                    return Ok(Some(reply));
                }
                ResponseAction::CallTool { name, arguments } => {
                    let Some(result) = self.run_tool(&started, &name, arguments).await else {
                        return Ok(None);
                    };
                    self.push_turn(Turn::new(Speaker::Tool, result.content));
                }
            }
        }
        Err(PipelineError::Backend {
            backend: started.plan.llm.spec().model_string(),
            reason: "too many tool calls in one turn".to_string(),
        })
    }

    /// Invoke a tool the way the reasoning backend would.
    pub async fn invoke_tool(
        &self,
        name: &str,
        arguments: HashMap<String, Value>,
    ) -> Result<Option<ToolResult>, PipelineError> {
        let started = self.started()?;
        Ok(self.run_tool(&started, name, arguments).await)
    }

    async fn run_tool(
        &self,
        started: &Started,
        name: &str,
        arguments: HashMap<String, Value>,
    ) -> Option<ToolResult> {
        let id = format!("tc-{}", self.tool_calls.fetch_add(1, Ordering::SeqCst) + 1);
        let request = ToolRequest::new(id, name, arguments, self.ctx.clone());
        let result = started.tools.execute(request).await;
        self.record(SessionEvent::ToolCalled {
            name: name.to_string(),
            result: result.as_ref().map(|r| r.content.clone()),
        });
        result
    }

    fn request(&self, started: &Started, reply_instructions: Option<&str>) -> ResponseRequest {
        ResponseRequest {
            instructions: started.agent.instructions.clone(),
            turns: lock(&self.turns).clone(),
            reply_instructions: reply_instructions.map(str::to_string),
            tools: started.agent.tools.clone(),
        }
    }

    async fn speak(&self, started: &Started, text: &str) -> Result<(), PipelineError> {
        started.plan.tts.synthesize(text).await?;
        self.record(SessionEvent::AgentSaid(text.to_string()));
        self.push_turn(Turn::new(Speaker::Agent, text));
        Ok(())
    }

    fn push_turn(&self, turn: Turn) {
        lock(&self.turns).push(turn);
    }
}

#[async_trait]
impl MediaSession for RecordingSession {
    async fn start(
        &self,
        plan: SessionPlan,
        agent: AgentSpec,
        tools: Arc<dyn ToolExecutor>,
    ) -> Result<(), PipelineError> {
        if self.faults.session_start {
            return Err(PipelineError::SessionStart("injected fault".to_string()));
        }
        if self.ctx.is_closed() {
            return Err(PipelineError::CallClosed);
        }
        self.record(SessionEvent::Started {
            plan: plan.summary(),
            instructions: agent.instructions.clone(),
            tools: agent.tools.iter().map(|t| t.name.clone()).collect(),
        });
        *lock(&self.started) = Some(Arc::new(Started { plan, agent, tools }));
        Ok(())
    }

    async fn generate_reply(
        &self,
        instructions: &str,
        allow_interruptions: bool,
    ) -> Result<(), PipelineError> {
        let started = self.started()?;
        self.record(SessionEvent::Reply {
            instructions: instructions.to_string(),
            allow_interruptions,
        });
        if self.faults.greeting {
            return Err(PipelineError::Backend {
                backend: started.plan.llm.spec().model_string(),
                reason: "injected fault".to_string(),
            });
        }
        match started
            .plan
            .llm
            .respond(self.request(&started, Some(instructions)))
            .await?
        {
            ResponseAction::Say(reply) => self.speak(&started, &reply).await,
            ResponseAction::CallTool { name, .. } => Err(PipelineError::Backend {
                backend: started.plan.llm.spec().model_string(),
                reason: format!("unexpected tool call '{}' in a scripted reply", name),
            }),
        }
    }
}

/// Ambient player that records into its session's event log.
pub struct RecordingAmbientPlayer {
    events: EventLog,
    fail: bool,
}

#[async_trait]
impl AmbientPlayer for RecordingAmbientPlayer {
    async fn start(&self, clip: AmbientClip, volume: f32) -> Result<(), PipelineError> {
        if self.fail {
            return Err(PipelineError::Unavailable("ambient audio track".to_string()));
        }
        lock(&self.events).push(SessionEvent::AmbientStarted { clip, volume });
        Ok(())
    }
}

/// A media platform that keeps every session in memory.
///
/// Calls are dispatched with [`ring`](RecordingPlatform::ring) and handed
/// out, in order, by [`MediaPlatform::next_call`].
pub struct RecordingPlatform {
    gateway: Arc<dyn InferenceGateway>,
    faults: PlatformFaults,
    vad_loads: AtomicUsize,
    sessions: Mutex<HashMap<String, Arc<RecordingSession>>>,
    dispatch: Mutex<Option<mpsc::UnboundedSender<CallContext>>>,
    incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<CallContext>>,
}

impl RecordingPlatform {
    /// Create a platform backed by an [`EchoGateway`].
    pub fn new() -> Self {
        Self::with_gateway(Arc::new(EchoGateway::new()))
    }

    /// Create a platform backed by the given gateway.
    pub fn with_gateway(gateway: Arc<dyn InferenceGateway>) -> Self {
        let (dispatch, incoming) = mpsc::unbounded_channel();
        Self {
            gateway,
            faults: PlatformFaults::default(),
            vad_loads: AtomicUsize::new(0),
            sessions: Mutex::new(HashMap::new()),
            dispatch: Mutex::new(Some(dispatch)),
            incoming: tokio::sync::Mutex::new(incoming),
        }
    }

    /// Dispatch a new call to the worker.
    ///
    /// Returns the platform side of the call, or `None` once
    /// [`stop_accepting`](Self::stop_accepting) has been called.
    pub fn ring(&self, call_id: impl Into<String>) -> Option<CallController> {
        let call_id = call_id.into();
        let controller = CallController::new(call_id.clone());
        lock(&self.dispatch)
            .as_ref()?
            .send(controller.context())
            .ok()?;
        info!("Dispatched call {}", call_id);
        Some(controller)
    }

    /// Stop dispatching calls. Calls already queued are still handed out.
    pub fn stop_accepting(&self) {
        lock(&self.dispatch).take();
    }

    /// Inject faults into sessions created from now on.
    pub fn with_faults(mut self, faults: PlatformFaults) -> Self {
        self.faults = faults;
        self
    }

    /// How many times the VAD was loaded.
    pub fn vad_loads(&self) -> usize {
        self.vad_loads.load(Ordering::SeqCst)
    }

    /// The session created for a call, if any.
    pub fn session(&self, call_id: &str) -> Option<Arc<RecordingSession>> {
        lock(&self.sessions).get(call_id).cloned()
    }

    fn session_or_create(&self, ctx: &CallContext) -> Arc<RecordingSession> {
        lock(&self.sessions)
            .entry(ctx.call_id().to_string())
            .or_insert_with(|| Arc::new(RecordingSession::new(ctx.clone(), self.faults)))
            .clone()
    }
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaPlatform for RecordingPlatform {
    async fn next_call(&self) -> Option<CallContext> {
        self.incoming.lock().await.recv().await
    }

    fn load_vad(&self) -> Result<Arc<dyn VoiceActivityDetector>, PipelineError> {
        self.vad_loads.fetch_add(1, Ordering::SeqCst);
        if self.faults.vad_load {
            return Err(PipelineError::Unavailable("vad model".to_string()));
        }
        Ok(Arc::new(EnergyVad::new()))
    }

    fn inference(&self) -> Arc<dyn InferenceGateway> {
        self.gateway.clone()
    }

    async fn create_session(
        &self,
        ctx: &CallContext,
    ) -> Result<Arc<dyn MediaSession>, PipelineError> {
        let session: Arc<dyn MediaSession> = self.session_or_create(ctx);
        Ok(session)
    }

    async fn ambient_player(
        &self,
        ctx: &CallContext,
    ) -> Result<Arc<dyn AmbientPlayer>, PipelineError> {
        let session = self.session_or_create(ctx);
        Ok(Arc::new(RecordingAmbientPlayer {
            events: session.events.clone(),
            fail: self.faults.ambient,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_core::{
        BackendSpec, NoiseFilter, NoiseFilterPolicy, ParticipantKind, Responder, Synthesizer,
        Transcriber, TurnDetection,
    };

    struct Fixed(BackendSpec);

    #[async_trait]
    impl Responder for Fixed {
        fn spec(&self) -> &BackendSpec {
            &self.0
        }

        async fn respond(
            &self,
            request: ResponseRequest,
        ) -> Result<ResponseAction, PipelineError> {
            EchoGateway::new().respond(&self.0, request).await
        }
    }

    #[async_trait]
    impl Synthesizer for Fixed {
        fn spec(&self) -> &BackendSpec {
            &self.0
        }

        async fn synthesize(&self, text: &str) -> Result<voice_core::AudioFrame, PipelineError> {
            EchoGateway::new().synthesize(&self.0, text).await
        }
    }

    #[async_trait]
    impl Transcriber for Fixed {
        fn spec(&self) -> &BackendSpec {
            &self.0
        }

        async fn transcribe(
            &self,
            _frame: &voice_core::AudioFrame,
        ) -> Result<Option<String>, PipelineError> {
            Ok(None)
        }
    }

    struct Named(&'static str);

    impl NoiseFilter for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn process(&self, _frame: &mut voice_core::AudioFrame) {}
    }

    struct ByKind;

    impl NoiseFilterPolicy for ByKind {
        fn filter_for(&self, participant: &Participant) -> Arc<dyn NoiseFilter> {
            match participant.kind {
                ParticipantKind::Sip => Arc::new(Named("phone")),
                _ => Arc::new(Named("general")),
            }
        }
    }

    struct NoTools;

    #[async_trait]
    impl ToolExecutor for NoTools {
        async fn execute(&self, request: ToolRequest) -> Option<ToolResult> {
            Some(ToolResult::failure(request.id, "no tools"))
        }

        fn tool_specs(&self) -> Vec<voice_core::ToolSpec> {
            Vec::new()
        }
    }

    fn plan() -> SessionPlan {
        let spec = BackendSpec::parse("test/model").unwrap();
        SessionPlan {
            agent_name: "Ben".to_string(),
            stt: Arc::new(Fixed(spec.clone())),
            llm: Arc::new(Fixed(spec.clone())),
            tts: Arc::new(Fixed(spec)),
            vad: Arc::new(EnergyVad::new()),
            turn_detection: TurnDetection::default(),
            noise_filter: Arc::new(ByKind),
        }
    }

    fn agent() -> AgentSpec {
        AgentSpec {
            instructions: "Be brief".to_string(),
            tools: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_reply_before_start_fails() {
        let platform = RecordingPlatform::new();
        let controller = CallController::new("job-1");
        let session = platform.create_session(&controller.context()).await.unwrap();
        assert!(session.generate_reply("hi", true).await.is_err());
    }

    #[tokio::test]
    async fn test_session_records_in_order() {
        let platform = RecordingPlatform::new();
        let controller = CallController::new("job-1");
        let ctx = controller.context();

        let session = platform.create_session(&ctx).await.unwrap();
        let plan = plan();
        let summary = plan.summary();
        session.start(plan, agent(), Arc::new(NoTools)).await.unwrap();
        session.generate_reply("Say hello", true).await.unwrap();
        platform
            .ambient_player(&ctx)
            .await
            .unwrap()
            .start(AmbientClip::Office, 0.3)
            .await
            .unwrap();

        let recorded = platform.session("job-1").unwrap();
        assert_eq!(
            recorded.events(),
            vec![
                SessionEvent::Started {
                    plan: summary,
                    instructions: "Be brief".to_string(),
                    tools: Vec::new(),
                },
                SessionEvent::Reply {
                    instructions: "Say hello".to_string(),
                    allow_interruptions: true,
                },
                SessionEvent::AgentSaid("Say hello".to_string()),
                SessionEvent::AmbientStarted {
                    clip: AmbientClip::Office,
                    volume: 0.3,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_caller_turn_and_filters() {
        let platform = RecordingPlatform::new();
        let controller = CallController::new("job-2");
        let session = platform.create_session(&controller.context()).await.unwrap();
        session.start(plan(), agent(), Arc::new(NoTools)).await.unwrap();

        let recorded = platform.session("job-2").unwrap();
        let reply = recorded.caller_says("hello there").await.unwrap();
        assert_eq!(reply.as_deref(), Some("hello there"));

        let phone = Participant::new("sip_1", ParticipantKind::Sip);
        let web = Participant::new("web_1", ParticipantKind::Standard);
        assert_eq!(recorded.join_participant(&phone).unwrap(), "phone");
        assert_eq!(recorded.join_participant(&web).unwrap(), "general");

        let result = recorded.invoke_tool("anything", HashMap::new()).await.unwrap();
        assert_eq!(result.unwrap().content, "no tools");
    }

    #[tokio::test]
    async fn test_calls_dispatched_in_order() {
        let platform = RecordingPlatform::new();
        let first = platform.ring("job-1").unwrap();
        let _second = platform.ring("job-2").unwrap();
        platform.stop_accepting();
        assert!(platform.ring("job-3").is_none());

        let ctx = platform.next_call().await.unwrap();
        assert_eq!(ctx.call_id(), "job-1");
        first.set_room_name("room-1");
        assert_eq!(ctx.room_name().as_deref(), Some("room-1"));

        assert_eq!(platform.next_call().await.unwrap().call_id(), "job-2");
        assert!(platform.next_call().await.is_none());
    }

    #[tokio::test]
    async fn test_vad_load_counter_and_fault() {
        let platform = RecordingPlatform::new().with_faults(PlatformFaults {
            vad_load: true,
            ..Default::default()
        });
        assert!(platform.load_vad().is_err());
        assert_eq!(platform.vad_loads(), 1);
    }
}
