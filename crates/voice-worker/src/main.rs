use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agent_config::{ConfigResolver, PlatformSettings};
use audio_pipeline::BackendCatalog;
use clap::{Parser, Subcommand};
use mock_platform::{EchoGateway, RecordingPlatform, RecordingSession, SessionEvent};
use orchestrator::{OrchestratorSettings, SessionOrchestrator};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voice_core::{CallController, MediaPlatform, Participant, ParticipantKind};

/// How long to wait for a dispatched call's session before giving up on it.
const SESSION_WAIT: Duration = Duration::from_secs(15);

/// Room name used for the simulated console call.
const CONSOLE_ROOM: &str = "console-room";

#[derive(Debug, Parser)]
#[command(name = "voice-worker")]
#[command(about = "Voice agent worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the worker: accept dispatched calls until stdin closes or Ctrl+C.
    ///
    /// Requires LIVEKIT_URL, LIVEKIT_API_KEY and LIVEKIT_API_SECRET. Calls
    /// are dispatched from stdin: `call <room>` rings a phone call into
    /// `<room>`, `hangup <room>` ends it.
    Start,
    /// Run a simulated call on the terminal.
    Console {
        /// Connect the simulated caller as a phone (SIP) participant
        #[arg(long)]
        phone: bool,
    },
    /// Resolve the remote configuration and print the effective session plan.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Start => run_worker().await,
        Command::Console { phone } => run_console(phone).await,
        Command::CheckConfig => check_config().await,
    }
}

async fn check_config() -> Result<(), Box<dyn std::error::Error>> {
    let platform = PlatformSettings::from_env();
    let missing = platform.missing();
    if !missing.is_empty() {
        warn!("Media platform settings missing: {}", missing.join(", "));
    }

    let config = ConfigResolver::from_env().resolve().await;
    let local = RecordingPlatform::new();
    let catalog = BackendCatalog::new(local.inference());
    let plan = catalog.plan(&config, local.load_vad()?);

    let report = json!({
        "config": config,
        "effectiveInstructions": config.effective_instructions(),
        "effectiveGreeting": config.effective_greeting(),
        "plan": plan.summary(),
        "platformMissing": missing,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_worker() -> Result<(), Box<dyn std::error::Error>> {
    let settings = PlatformSettings::from_env();
    let missing = settings.missing();
    if !missing.is_empty() {
        return Err(format!("media platform settings missing: {}", missing.join(", ")).into());
    }
    info!(
        "Registering worker with media platform at {}",
        settings.url.as_deref().unwrap_or_default()
    );

    let platform = Arc::new(RecordingPlatform::with_gateway(Arc::new(
        EchoGateway::with_prefix("You said: "),
    )));
    let orchestrator = Arc::new(SessionOrchestrator::from_env(platform.clone())?);
    let mut worker = tokio::spawn(orchestrator.run_with_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }));

    println!("Worker running. `call <room>` rings a call, `hangup <room>` ends it.");
    let mut calls: HashMap<String, CallController> = HashMap::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            accepted = &mut worker => {
                info!("Worker stopped after {} call(s)", accepted?);
                return Ok(());
            }
        };
        let Some(line) = line else {
            break;
        };

        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("call"), Some(room)) => {
                let Some(controller) = platform.ring(room) else {
                    break;
                };
                controller.set_room_name(room);
                if let Some(session) = wait_for_session(&platform, room).await {
                    let caller = Participant::new(format!("sip_{}", room), ParticipantKind::Sip);
                    if let Err(e) = session.join_participant(&caller) {
                        warn!("Caller could not join {}: {}", room, e);
                    }
                    print_events(&session, 0);
                }
                calls.insert(room.to_string(), controller);
            }
            (Some("hangup"), Some(room)) => match calls.remove(room) {
                Some(controller) => {
                    controller.close();
                    println!("[{} hung up]", room);
                }
                None => println!("no call in {}", room),
            },
            (None, _) => {}
            _ => println!("usage: call <room> | hangup <room>"),
        }
    }

    platform.stop_accepting();
    for controller in calls.values() {
        controller.close();
    }
    let accepted = worker.await?;
    info!("Worker stopped after {} call(s)", accepted);
    Ok(())
}

/// Wait until the worker has started the session for `call_id`.
async fn wait_for_session(
    platform: &RecordingPlatform,
    call_id: &str,
) -> Option<Arc<RecordingSession>> {
    let deadline = tokio::time::Instant::now() + SESSION_WAIT;
    while tokio::time::Instant::now() < deadline {
        if let Some(session) = platform.session(call_id).filter(|s| s.is_started()) {
            return Some(session);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    warn!("Call {} did not start within {:?}", call_id, SESSION_WAIT);
    None
}

async fn run_console(phone: bool) -> Result<(), Box<dyn std::error::Error>> {
    let platform = Arc::new(RecordingPlatform::with_gateway(Arc::new(
        EchoGateway::with_prefix("You said: "),
    )));
    let orchestrator = SessionOrchestrator::new(platform.clone(), OrchestratorSettings::from_env())?;

    let call_id = format!("console-{}", std::process::id());
    let controller = CallController::new(call_id.clone());
    controller.set_room_name(CONSOLE_ROOM);

    let call = orchestrator.handle_call(controller.context()).await?;
    let session = platform
        .session(&call_id)
        .ok_or("platform did not record a session")?;

    let kind = if phone {
        ParticipantKind::Sip
    } else {
        ParticipantKind::Standard
    };
    session.join_participant(&Participant::new("console-caller", kind))?;

    let mut printed = print_events(&session, 0);
    println!("Type to talk. /sms <text> sends a text, /quit hangs up.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        if let Some(text) = line.strip_prefix("/sms") {
            let mut args = HashMap::new();
            args.insert("message".to_string(), Value::String(text.trim().to_string()));
            session.invoke_tool("send_sms", args).await?;
        } else if let Err(e) = session.caller_says(line).await {
            warn!("Turn failed: {}", e);
        }
        printed = print_events(&session, printed);
    }

    controller.close();
    let state = call.wait_closed().await;
    info!("Console call ended ({})", state);
    Ok(())
}

/// Print events recorded after `from`; returns the new high-water mark.
fn print_events(session: &RecordingSession, from: usize) -> usize {
    let events = session.events();
    for event in events.iter().skip(from) {
        match event {
            SessionEvent::Started { plan, tools, .. } => println!(
                "[session started: {} on {} / {} / {} with tools {:?}]",
                plan.agent_name,
                plan.stt.model_string(),
                plan.llm.model_string(),
                plan.tts.model_string(),
                tools
            ),
            SessionEvent::AgentSaid(text) => println!("agent> {}", text),
            SessionEvent::ToolCalled { name, result } => match result {
                Some(result) => println!("[{}] {}", name, result),
                None => println!("[{}] result discarded", name),
            },
            SessionEvent::FilterSelected { identity, filter } => {
                println!("[noise filter for {}: {}]", identity, filter)
            }
            SessionEvent::AmbientStarted { clip, volume } => {
                println!("[ambient: {} at {:.2}]", clip, volume)
            }
            SessionEvent::Reply { .. } | SessionEvent::CallerSaid(_) => {}
        }
    }
    events.len()
}
