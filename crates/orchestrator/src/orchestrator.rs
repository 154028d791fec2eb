//! Session orchestrator: turns an accepted call into a running session.

use std::future::Future;
use std::sync::Arc;

use agent_config::{AgentConfig, ConfigResolver, ConfigSettings};
use agent_tools::{SmsSettings, ToolPolicy};
use audio_pipeline::{start_ambient, BackendCatalog};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use voice_core::{
    CallContext, MediaPlatform, MediaSession, SessionPlan, ToolExecutor, ToolRequest, ToolResult,
};

use crate::agent::VoiceAgent;
use crate::error::OrchestratorError;
use crate::state::{SessionState, StateMachine};
use crate::warmup::WorkerResources;

/// Settings for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    /// Remote configuration endpoint.
    pub config: ConfigSettings,
    /// SMS endpoint used by the `send_sms` tool.
    pub sms: SmsSettings,
    /// Limits applied to tool invocations.
    pub tool_policy: ToolPolicy,
}

impl OrchestratorSettings {
    /// Create settings from environment variables.
    ///
    /// See [`ConfigSettings::from_env`] and [`SmsSettings::from_env`].
    pub fn from_env() -> Self {
        Self {
            config: ConfigSettings::from_env(),
            sms: SmsSettings::from_env(),
            tool_policy: ToolPolicy::default(),
        }
    }
}

/// Brings calls up on a media platform.
///
/// Created once per worker process; warm-up happens in the constructor
/// and its result is shared read-only by every call.
pub struct SessionOrchestrator {
    platform: Arc<dyn MediaPlatform>,
    resources: WorkerResources,
    catalog: BackendCatalog,
    resolver: Arc<ConfigResolver>,
    sms: SmsSettings,
    tool_policy: ToolPolicy,
}

impl SessionOrchestrator {
    /// Warm up the worker and create the orchestrator.
    pub fn new(
        platform: Arc<dyn MediaPlatform>,
        settings: OrchestratorSettings,
    ) -> Result<Self, OrchestratorError> {
        let resources = WorkerResources::warm_up(platform.as_ref())?;
        let catalog = BackendCatalog::new(platform.inference());
        Ok(Self {
            platform,
            resources,
            catalog,
            resolver: Arc::new(ConfigResolver::new(settings.config)),
            sms: settings.sms,
            tool_policy: settings.tool_policy,
        })
    }

    /// Create the orchestrator with settings from environment variables.
    pub fn from_env(platform: Arc<dyn MediaPlatform>) -> Result<Self, OrchestratorError> {
        Self::new(platform, OrchestratorSettings::from_env())
    }

    pub fn resources(&self) -> &WorkerResources {
        &self.resources
    }

    pub fn catalog(&self) -> &BackendCatalog {
        &self.catalog
    }

    /// Accept calls from the platform until it stops dispatching.
    ///
    /// See [`run_with_shutdown`](Self::run_with_shutdown).
    pub async fn run(self: Arc<Self>) -> usize {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Accept calls until the platform stops dispatching or `shutdown`
    /// resolves. Returns how many calls were accepted.
    ///
    /// Every call runs on its own task, from [`handle_call`](Self::handle_call)
    /// through [`ActiveCall::wait_closed`]. When the platform stops
    /// dispatching, calls in progress are allowed to finish; on shutdown
    /// they are aborted.
    pub async fn run_with_shutdown<S>(self: Arc<Self>, shutdown: S) -> usize
    where
        S: Future<Output = ()> + Send,
    {
        info!("Worker ready, waiting for calls");
        let mut calls = JoinSet::new();
        let mut accepted = 0;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("Shutdown signal received, dropping {} active call(s)", calls.len());
                    calls.shutdown().await;
                    return accepted;
                }

                Some(_) = calls.join_next(), if !calls.is_empty() => {}

                next = self.platform.next_call() => {
                    let Some(ctx) = next else {
                        info!("Platform stopped dispatching calls");
                        break;
                    };
                    accepted += 1;
                    let orchestrator = self.clone();
                    calls.spawn(async move { orchestrator.run_call(ctx).await });
                }
            }
        }

        while calls.join_next().await.is_some() {}
        accepted
    }

    async fn run_call(&self, ctx: CallContext) {
        let call_id = ctx.call_id().to_string();
        match self.handle_call(ctx).await {
            Ok(call) => {
                let state = call.wait_closed().await;
                debug!("Call {} finished in state {}", call_id, state);
            }
            Err(e) => warn!("Call {} failed: {}", call_id, e),
        }
    }

    /// Accept a call and bring its session to `Active`.
    ///
    /// Configuration problems never fail the call. Greeting and ambient
    /// audio failures are logged and the call stays up. Only the platform
    /// refusing to create or start the session is an error.
    pub async fn handle_call(&self, ctx: CallContext) -> Result<ActiveCall, OrchestratorError> {
        let state = StateMachine::new(ctx.call_id());
        info!("Accepted call {}", ctx.call_id());

        state.advance(SessionState::ConfigResolving)?;
        let config = self.resolve_config().await;
        self.ensure_open(&ctx, &state)?;

        state.advance(SessionState::Assembling)?;
        let agent = VoiceAgent::new(&config, self.sms.clone(), self.tool_policy.clone());
        let plan = self.catalog.plan(&config, self.resources.vad());

        let session = match self.start_session(&ctx, &agent, plan).await {
            Ok(session) => session,
            Err(e) => {
                state.close();
                return Err(e);
            }
        };
        self.ensure_open(&ctx, &state)?;
        state.advance(SessionState::Active)?;

        if let Err(e) = agent.on_enter(session.as_ref()).await {
            warn!("Greeting failed for call {}: {}", ctx.call_id(), e);
        }
        self.start_ambient(&ctx, &config).await;

        Ok(ActiveCall {
            ctx,
            state,
            config,
            agent,
            session,
        })
    }

    /// Resolve configuration off the call's task.
    async fn resolve_config(&self) -> AgentConfig {
        let resolver = self.resolver.clone();
        match tokio::spawn(async move { resolver.resolve().await }).await {
            Ok(config) => config,
            Err(e) => {
                warn!("Config resolution task failed ({}), using defaults", e);
                AgentConfig::default()
            }
        }
    }

    async fn start_session(
        &self,
        ctx: &CallContext,
        agent: &VoiceAgent,
        plan: SessionPlan,
    ) -> Result<Arc<dyn MediaSession>, OrchestratorError> {
        let session = self.platform.create_session(ctx).await?;
        session.start(plan, agent.spec(), agent.tools()).await?;
        Ok(session)
    }

    async fn start_ambient(&self, ctx: &CallContext, config: &AgentConfig) {
        let player = match self.platform.ambient_player(ctx).await {
            Ok(player) => player,
            Err(e) => {
                warn!("No ambient player for call {}: {}", ctx.call_id(), e);
                return;
            }
        };
        if let Err(e) = start_ambient(
            player,
            &config.background_audio_clip,
            config.background_audio_volume,
        )
        .await
        {
            warn!("Ambient audio failed for call {}: {}", ctx.call_id(), e);
        }
    }

    fn ensure_open(&self, ctx: &CallContext, state: &StateMachine) -> Result<(), OrchestratorError> {
        if ctx.is_closed() {
            state.close();
            return Err(OrchestratorError::ClosedDuringSetup(ctx.call_id().to_string()));
        }
        Ok(())
    }
}

/// A call whose session is running.
///
/// Holding this keeps the call's agent and session alive; it is released
/// by [`ActiveCall::wait_closed`] once the platform tears the call down.
pub struct ActiveCall {
    ctx: CallContext,
    state: StateMachine,
    config: AgentConfig,
    agent: VoiceAgent,
    session: Arc<dyn MediaSession>,
}

impl ActiveCall {
    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn context(&self) -> &CallContext {
        &self.ctx
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn agent(&self) -> &VoiceAgent {
        &self.agent
    }

    pub fn session(&self) -> Arc<dyn MediaSession> {
        self.session.clone()
    }

    /// Run a tool call through the agent's executor.
    ///
    /// Returns `None` when the call ended before the tool finished.
    pub async fn invoke_tool(&self, request: ToolRequest) -> Option<ToolResult> {
        self.agent.tools().execute(request).await
    }

    /// Wait for the platform to tear the call down, then release it.
    pub async fn wait_closed(self) -> SessionState {
        self.ctx.closed().await;
        self.state.close();
        info!("Call {} released", self.ctx.call_id());
        self.state.current()
    }
}
