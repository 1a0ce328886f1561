use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use fact_arena::config::PacingConfig;
use fact_arena::engine::consensus::RandomVoteSource;
use fact_arena::game::{
    ClaimDraft, ClaimStatus, MatchCoordinator, MatchPhase, PlayerId, PlayerProfile, RoomSettings,
};
use fact_arena::{MatchConfig, MatchEvent, RoomRegistry};

const LOG_TARGET: &str = "bin::fact_arena_demo";

#[derive(Debug, Parser)]
#[command(name = "fact_arena_demo")]
#[command(about = "Play one match against bots and print the global leaderboard", long_about = None)]
struct Args {
    /// Display name of the human host
    #[arg(long, env = "DEMO_HOST", default_value = "host")]
    host: String,

    /// Number of bots to seat next to the host
    #[arg(long, env = "DEMO_BOTS", default_value_t = 3)]
    bots: usize,

    /// Length of the submission phase
    #[arg(long, env = "DEMO_SUBMISSION_MINUTES", default_value_t = 1)]
    submission_minutes: u32,

    /// Length of the dispute phase
    #[arg(long, env = "DEMO_DISPUTE_SECONDS", default_value_t = 30)]
    dispute_seconds: u64,

    /// Optional RNG seed for deterministic validator votes
    #[arg(long, env = "DEMO_RNG_SEED")]
    seed: Option<u64>,

    /// Skip the simulated validator latency
    #[arg(long, env = "DEMO_FAST", default_value_t = false)]
    fast: bool,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "DEMO_LOG_JSON", default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(args.json)?;

    let config = MatchConfig {
        dispute_duration: Duration::from_secs(args.dispute_seconds),
        pacing: if args.fast {
            PacingConfig::instant()
        } else {
            PacingConfig::default()
        },
        ..MatchConfig::default()
    };
    let source = match args.seed {
        Some(seed) => RandomVoteSource::seeded(seed),
        None => RandomVoteSource::from_entropy(),
    };
    let registry =
        RoomRegistry::new(config, Arc::new(source)).context("invalid match configuration")?;

    let room = registry.create_room().context("failed to open a room")?;
    info!(target: LOG_TARGET, room = %room.room_code(), "room ready");
    play(&room, &args).await?;

    let standings = registry.leaderboard().standings();
    println!("{}", serde_json::to_string_pretty(&standings)?);
    registry.shutdown().await;
    Ok(())
}

fn load_dotenv() {
    let manifest_env = env!("CARGO_MANIFEST_DIR");
    let manifest_env_path = PathBuf::from(manifest_env).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

async fn play(room: &MatchCoordinator, args: &Args) -> Result<()> {
    let host = room
        .register_player(PlayerProfile {
            id: None,
            username: args.host.clone(),
            avatar: "🧑‍🚀".to_string(),
        })
        .await
        .context("failed to seat the host")?;
    for _ in 0..args.bots {
        let bot = room.add_bot().await.context("failed to seat a bot")?;
        info!(target: LOG_TARGET, bot = %bot.username, "bot joined");
    }
    room.update_settings(
        host.id.clone(),
        RoomSettings {
            submission_minutes: args.submission_minutes,
            ..RoomSettings::default()
        },
    )
    .await?;

    let mut events = room.event_stream();
    room.start_match(host.id.clone()).await?;
    room.submit_claim(
        host.id.clone(),
        ClaimDraft::new("The Eiffel Tower is located in Paris.", 90)
            .with_source("https://www.toureiffel.paris"),
    )
    .await
    .context("host claim rejected")?;

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                warn!(target: LOG_TARGET, error = %err, "event stream lagged");
                continue;
            }
        };
        println!("{}", serde_json::to_string(&event)?);

        match event {
            MatchEvent::PhaseChanged(change) if change.to == MatchPhase::Dispute => {
                challenge_a_false_claim(room, &host.id).await?;
            }
            MatchEvent::MatchFinished(_) => return Ok(()),
            _ => {}
        }
    }
    Err(anyhow!("match ended without a summary"))
}

/// The host disputes the first False claim written by someone else.
async fn challenge_a_false_claim(room: &MatchCoordinator, host: &PlayerId) -> Result<()> {
    let snapshot = room.snapshot().await?;
    let target = snapshot
        .claims
        .iter()
        .find(|claim| claim.status == ClaimStatus::False && &claim.author_id != host);
    if let Some(claim) = target {
        let dispute = room
            .file_dispute(host.clone(), claim.id, "I can find sources for this one.")
            .await?;
        info!(target: LOG_TARGET, dispute_id = %dispute.id, claim_id = %claim.id, "host disputed");
    }
    Ok(())
}
