//! milestone - completion 通知をローカルで動かすデモ CLI
//!
//! in-memory の directory にユーザーとコースを入れて、保存フックを順番に呼びます。
//! メールは LogMailer が tracing に書き出すだけです。

mod scenario;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use milestone_core::{MilestoneConfig, NotifierBuilder};
use milestone_core::impls::{InMemoryAchievements, LogMailer};
use milestone_core::ports::{MailTransport, SystemClock, UlidGenerator};
use milestone_core::queue::{InMemoryMailQueue, MailQueue, QueuedMailTransport};
use milestone_core::worker::MailWorkerGroup;
use scenario::{FlakyTransport, Scenario, World};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Milestone - completion notifier demo
#[derive(Parser, Debug)]
#[command(name = "milestone")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (defaults are used when omitted)
    #[arg(short, long, env = "MILESTONE_CONFIG")]
    config: Option<PathBuf>,

    /// Send mail through the queue even if the config disables it
    #[arg(long)]
    queued: bool,

    /// Override the number of mail workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Scenario to run
    #[arg(short, long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Make the first N mail sends fail (shows retry in queued mode)
    #[arg(long, default_value_t = 0)]
    flaky: u32,

    /// How long to wait for the queue to drain before giving up
    #[arg(long, default_value_t = 30)]
    drain_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MilestoneConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => MilestoneConfig::default(),
    };
    if args.queued {
        config.queue.enabled = true;
    }
    if let Some(workers) = args.workers {
        anyhow::ensure!(workers > 0, "--workers must be at least 1");
        config.queue.workers = workers;
    }

    init_tracing(&config.log_filter);
    tracing::info!("Starting milestone v{}", env!("CARGO_PKG_VERSION"));

    let world = World::seed();
    let delivery: Arc<dyn MailTransport> = Arc::new(FlakyTransport::new(
        LogMailer::new(config.mail.from.clone()),
        args.flaky,
    ));

    // (A) queue を使うなら transport は「積むだけ」にして、worker が本物に渡す
    let mut pipeline = None;
    let transport: Arc<dyn MailTransport> = if config.queue.enabled {
        let queue = Arc::new(InMemoryMailQueue::new(
            config.queue.retry_policy(),
            Arc::new(UlidGenerator::new(SystemClock)),
        ));
        let workers = MailWorkerGroup::spawn(config.queue.workers, queue.clone(), delivery);
        tracing::info!(
            workers = workers.worker_count(),
            max_attempts = config.queue.max_attempts,
            "mail queue enabled"
        );
        pipeline = Some((queue.clone(), workers));
        Arc::new(QueuedMailTransport::new(queue))
    } else {
        delivery
    };

    // (B) Notifier を組み立てる（足りない port があればここで落ちる）
    let achievements = Arc::new(InMemoryAchievements::new());
    let notifier = NotifierBuilder::new()
        .with_directory(world.directory.clone())
        .transport(transport)
        .achievements(achievements.clone())
        .mail_settings(config.mail_settings())
        .build()
        .context("failed to build notifier")?;

    // (C) 保存フックを呼ぶ
    for outcome in scenario::run(&notifier, &world, args.scenario).await {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    println!("achievements awarded: {}", achievements.len());

    // (D) queue の完了を待ってから worker を止める
    if let Some((queue, workers)) = pipeline {
        let drained = tokio::select! {
            drained = wait_until_settled(queue.as_ref(), Duration::from_secs(args.drain_timeout_secs)) => drained,
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("interrupted, stopping workers");
                false
            }
        };
        if !drained {
            tracing::warn!("mail queue did not drain");
        }

        queue.close().await;
        workers.shutdown_and_join().await;

        let counts = queue.counts_by_state().await;
        println!("queue: {}", serde_json::to_string(&counts)?);
        for dead in queue.dead_letters().await {
            println!(
                "dead letter: {} to={} attempts={} last_error={:?}",
                dead.mail_id, dead.mail.to, dead.attempts, dead.last_error
            );
        }
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn wait_until_settled(queue: &dyn MailQueue, timeout: Duration) -> bool {
    tokio::time::timeout(timeout, async {
        while !queue.counts_by_state().await.is_settled() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .is_ok()
}
