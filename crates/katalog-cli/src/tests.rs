use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use katalog_core::ShopConfig;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::worker::{find_shop, stale_cutoff, JobSlot};

#[test]
fn parses_process_without_batch_size() {
    let cli = Cli::try_parse_from(["katalog-cli", "process"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Process { batch_size: None }));
}

#[test]
fn parses_process_with_batch_size() {
    let cli = Cli::try_parse_from(["katalog-cli", "process", "--batch-size", "25"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Process {
            batch_size: Some(25)
        }
    ));
}

#[test]
fn negative_batch_size_is_accepted_and_clamped_later() {
    let cli = Cli::try_parse_from(["katalog-cli", "process", "--batch-size", "-3"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Process {
            batch_size: Some(-3)
        }
    ));
}

#[test]
fn parses_scrape_command() {
    let cli = Cli::try_parse_from([
        "katalog-cli",
        "scrape",
        "--shop",
        "gigatron",
        "--url",
        "https://gigatron.example/p/1",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Scrape { ref shop, ref url }
            if shop == "gigatron" && url == "https://gigatron.example/p/1"
    ));
}

#[test]
fn scrape_requires_shop_and_url() {
    assert!(Cli::try_parse_from(["katalog-cli", "scrape", "--shop", "gigatron"]).is_err());
    assert!(Cli::try_parse_from(["katalog-cli", "scrape", "--url", "https://x.example"]).is_err());
}

fn parse(args: &[&str]) -> Commands {
    Cli::try_parse_from(args)
        .expect("expected valid cli args")
        .command
}

#[test]
fn parses_commands_without_arguments() {
    assert!(matches!(parse(&["katalog-cli", "watch"]), Commands::Watch));
    assert!(matches!(parse(&["katalog-cli", "rescrape"]), Commands::Rescrape));
    assert!(matches!(parse(&["katalog-cli", "seed-shops"]), Commands::SeedShops));
    assert!(matches!(parse(&["katalog-cli", "migrate"]), Commands::Migrate));
}

#[test]
fn missing_command_is_an_error() {
    assert!(Cli::try_parse_from(["katalog-cli"]).is_err());
}

fn shop(id: &str) -> ShopConfig {
    ShopConfig {
        id: id.to_string(),
        name: id.to_uppercase(),
        base_url: format!("https://{id}.example"),
        selectors: std::collections::BTreeMap::new(),
        rate_limit_ms: 0,
        retry_limit: 0,
        retry_backoff_ms: 0,
        requires_js: false,
        offer_type: katalog_core::OfferType::Good,
        enabled: true,
        title_suffixes: Vec::new(),
    }
}

#[test]
fn shops_are_found_case_insensitively() {
    let shops = vec![shop("gigatron"), shop("tehnomanija")];
    assert_eq!(
        find_shop(&shops, "Tehnomanija").map(|s| s.id.as_str()),
        Some("tehnomanija")
    );
    assert!(find_shop(&shops, "winwin").is_none());
}

#[test]
fn stale_cutoff_subtracts_hours() {
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
    assert_eq!(
        stale_cutoff(now, 6),
        Utc.with_ymd_and_hms(2026, 10, 19, 6, 0, 0).unwrap()
    );
}

#[test]
fn job_slot_admits_one_run_until_shutdown() {
    let slot = JobSlot::default();
    let cancel = CancellationToken::new();

    let first = slot.try_begin(&cancel);
    assert!(first.is_some());
    assert!(slot.try_begin(&cancel).is_none());
    drop(first);

    cancel.cancel();
    assert!(slot.try_begin(&cancel).is_none());
}

#[tokio::test]
async fn drain_waits_for_the_running_job_to_finish() {
    let slot = Arc::new(JobSlot::default());
    let cancel = CancellationToken::new();
    let finished = Arc::new(AtomicBool::new(false));
    let (started_tx, started_rx) = tokio::sync::oneshot::channel();

    let job = {
        let slot = Arc::clone(&slot);
        let cancel = cancel.clone();
        let finished = Arc::clone(&finished);
        tokio::spawn(async move {
            let _running = slot.try_begin(&cancel).expect("slot should be free");
            started_tx.send(()).expect("test is waiting");
            tokio::time::sleep(Duration::from_millis(50)).await;
            finished.store(true, Ordering::SeqCst);
        })
    };

    started_rx.await.expect("job should start");
    cancel.cancel();
    slot.drain().await;

    assert!(finished.load(Ordering::SeqCst));
    job.await.expect("job should not panic");
}
