use std::io::Write;
use std::sync::Arc;

use clap::{Args, Subcommand};
use hiit_core::timer::format_clock;
use hiit_core::{
    Config, CueHandler, CueMailbox, CueScheduler, Event, IntervalTimer, MailboxCueHandler, Phase,
    PlanStore, RestPolicy, SessionConfig, SystemClock,
};
use tokio::time::MissedTickBehavior;

use crate::terminal::{AudioRenderer, HapticLog};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a session in the foreground (Ctrl-C stops it)
    Run {
        #[command(flatten)]
        session: SessionArgs,
        /// Print events as JSON lines instead of a status line
        #[arg(long)]
        json: bool,
    },
    /// Show the phase sequence and total time without running it
    Preview {
        #[command(flatten)]
        session: SessionArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct SessionArgs {
    /// Saved plan to run (defaults to `default_plan` from config)
    #[arg(long)]
    plan: Option<String>,
    /// Work interval in seconds (5-300)
    #[arg(long)]
    work: Option<u32>,
    /// Rest interval in seconds (5-300)
    #[arg(long)]
    rest: Option<u32>,
    /// Number of rounds (1-50)
    #[arg(long)]
    rounds: Option<u32>,
    /// Rest after the final round as well
    #[arg(long)]
    rest_after_final_round: bool,
}

fn resolve(
    config: &Config,
    args: &SessionArgs,
) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let mut settings = config.timer;
    if let Some(work) = args.work {
        settings.set_work_secs(work);
    }
    if let Some(rest) = args.rest {
        settings.set_rest_secs(rest);
    }
    if let Some(rounds) = args.rounds {
        settings.set_rounds(rounds);
    }
    if args.rest_after_final_round {
        settings.rest_policy = RestPolicy::RestAfterFinalRound;
    }

    let plan = match args.plan.as_ref().or(config.default_plan.as_ref()) {
        Some(name) => Some(PlanStore::open()?.require(name)?.clone()),
        None => None,
    };
    Ok(SessionConfig { settings, plan })
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        TimerAction::Preview { session, json } => {
            let session = resolve(&config, &session)?;
            preview(&session, json)
        }
        TimerAction::Run { session, json } => {
            let session = resolve(&config, &session)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_session(&config, session, json))
        }
    }
}

fn preview(session: &SessionConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let steps = session.steps();
    if json {
        let out = serde_json::json!({
            "total_rounds": session.total_rounds(),
            "total_duration_secs": session.total_duration_secs(),
            "rest_policy": session.rest_policy(),
            "steps": steps,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for step in &steps {
        let exercise = step.exercise.as_deref().unwrap_or("");
        println!(
            "{:<7} {:>2}/{:<2} {:>6}  {exercise}",
            step.phase.label(),
            step.round,
            session.total_rounds(),
            format_clock(step.duration_secs as u64 * 1000),
        );
    }
    println!(
        "{} rounds, {} total (plus {}s warmup)",
        session.total_rounds(),
        format_clock(session.total_duration_secs() * 1000),
        hiit_core::timer::WARMUP_SECS,
    );
    Ok(())
}

async fn run_session(
    config: &Config,
    session: SessionConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mailbox = Arc::new(CueMailbox::new());
    let mut handlers: Vec<Arc<dyn CueHandler>> = Vec::new();
    let renderer = if config.cues.sound {
        handlers.push(Arc::new(MailboxCueHandler::new(Arc::clone(&mailbox))));
        Some(AudioRenderer::spawn(Arc::clone(&mailbox)))
    } else {
        None
    };
    if config.cues.haptics {
        handlers.push(Arc::new(HapticLog));
    }

    let cues = CueScheduler::new(handlers).with_ui_sync_delay(config.ui_sync_delay());
    let mut timer = IntervalTimer::new(session, Arc::new(SystemClock), cues)
        .with_countdown(config.cues.countdown_offsets.clone())
        .with_entry_announcements(config.cues.announce_on_entry);

    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    emit(&timer.start(), json)?;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                emit(&timer.tick(), json)?;
                if !json {
                    status_line(&timer)?;
                }
                if timer.phase() == Phase::Complete {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted, stopping session");
                emit(&timer.reset(), json)?;
                break;
            }
        }
    }
    if !json {
        println!();
    }

    if let Some(renderer) = renderer {
        // Let the final cue reach the render thread before stopping it.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        renderer.stop();
    }
    Ok(())
}

fn emit(events: &[Event], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        match event {
            Event::TimerStarted { .. } => tracing::info!("audio session activated"),
            Event::TimerStopped { reason, .. } => {
                tracing::info!(?reason, "audio session deactivated")
            }
            Event::PhaseChanged { from, to, round, .. } => {
                tracing::debug!(%from, %to, round, "phase changed")
            }
            _ => {}
        }
        if json {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(())
}

fn status_line(timer: &IntervalTimer) -> std::io::Result<()> {
    let mut line = format!(
        "\r{:<7} round {}/{}",
        timer.phase().label(),
        timer.round(),
        timer.total_rounds(),
    );
    if timer.phase().is_timed() {
        line.push_str(&format!("  {:>5}", timer.formatted_remaining()));
    }
    if let Some(exercise) = timer.current_exercise() {
        line.push_str(&format!("  {exercise}"));
    }
    if let Some(next) = timer.next_exercise() {
        line.push_str(&format!("  (next: {next})"));
    }
    line.push_str("\x1b[K");
    let mut out = std::io::stdout();
    out.write_all(line.as_bytes())?;
    out.flush()
}
