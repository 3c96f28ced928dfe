use anyhow::Context;
use async_insert::core::Column;
use async_insert::{
    AsyncInsertConfig, AsyncInsertCoordinator, DataType, EnqueueOptions, Entity, EntityTranslator,
    ForceSync, InMemoryQueue, InMemoryStorage, TableSchema, spawn_queue_worker,
};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Enqueue a batch of rows through the deferred insert pipeline against an
/// in-memory store and report where they ended up.
#[derive(Debug, Parser)]
#[command(name = "async-insert-demo", version)]
struct Args {
    /// Number of rows to enqueue
    #[arg(long, default_value_t = 10)]
    rows: u32,

    /// Queue delay per message, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Close the queue before enqueueing so every write falls back
    #[arg(long)]
    broken_queue: bool,

    /// Bypass the queue entirely
    #[arg(long)]
    force_sync: bool,

    /// Deferred retry ceiling
    #[arg(long, default_value_t = 5)]
    max_retries: u32,
}

#[derive(Serialize)]
struct PageView {
    path: String,
    user_id: i64,
    meta: serde_json::Value,
}

impl Entity for PageView {
    fn table_name() -> &'static str {
        "page_views"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let storage = InMemoryStorage::new();
    storage
        .create_table(TableSchema::new(
            PageView::table_name(),
            vec![
                Column::new("id", DataType::Integer).primary_key().auto_increment(),
                Column::new("path", DataType::Text).not_null(),
                Column::new("user_id", DataType::Integer),
                Column::new("meta", DataType::Text),
            ],
        ))
        .await
        .context("creating demo table")?;

    let force_sync = if args.force_sync { ForceSync::Enabled } else { ForceSync::default() };
    let config = AsyncInsertConfig::from_env()
        .context("reading ASYNC_INSERT_* environment")?
        .force_sync(force_sync)
        .max_retries(args.max_retries);

    let (queue, mut receiver) = InMemoryQueue::new();
    let coordinator = AsyncInsertCoordinator::new(Arc::new(queue), storage.connection(), config);

    let worker = if args.broken_queue {
        receiver.close();
        None
    } else {
        Some(spawn_queue_worker(receiver, Arc::new(coordinator.consumer(storage.connection()))))
    };

    let options = EnqueueOptions::new().delay(Duration::from_millis(args.delay_ms));
    let mut unit = coordinator.begin_unit_of_work();
    for i in 0..args.rows {
        let view = PageView {
            path: format!("/articles/{}", i),
            user_id: i64::from(i % 3),
            meta: serde_json::json!({ "referrer": "demo", "seq": i }),
        };
        coordinator
            .enqueue(&EntityTranslator, &view, options, unit.buffer_mut())
            .await
            .context("translating page view")?;
    }
    let report = coordinator.finish_unit_of_work(unit).await;

    if let Some(worker) = worker {
        tokio::time::sleep(Duration::from_millis(args.delay_ms + 50)).await;
        worker.stop().await.context("stopping queue worker")?;
    }

    let stats = coordinator.stats();
    println!("queued:          {}", stats.queued);
    println!("direct writes:   {}", stats.direct_writes);
    println!("duplicates:      {}", stats.duplicates);
    println!("deferred:        {}", stats.deferred);
    println!("flush inserted:  {}", report.inserted());
    println!("flush exhausted: {}", report.exhausted());
    println!("rows stored:     {}", storage.row_count(PageView::table_name()).await?);

    Ok(())
}
