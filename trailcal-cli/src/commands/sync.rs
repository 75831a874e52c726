use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use trailcal_core::reconcile::{Reconciler, RunOutcome};
use trailcal_core::source::load_races;

use super::Settings;
use crate::render::{Render, render_plan};
use crate::utils::tui::create_spinner;

pub async fn run(settings: Settings, json: bool, full: bool) -> Result<ExitCode> {
    let declared = load_races(&settings.races)?;
    let remote = settings.config.remote()?;
    remote.provider.binary_path()?;

    // Items not yet applied when Ctrl-C arrives are reported as cancelled.
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing the current item");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let reconciler = Reconciler::new(remote, settings.namespace.clone()).with_cancel_flag(cancel);

    let spinner = create_spinner(format!("Fetching {} events", settings.namespace));
    let plan = reconciler.plan(&declared).await;
    spinner.finish_and_clear();
    let plan = plan?;

    if !json {
        println!("{}", remote.provider.name().bold());
        println!("{}", render_plan(&plan, full));
    }

    let spinner = create_spinner(format!("Applying {} changes", plan.len()));
    let report = reconciler.apply(&plan, Utc::now()).await;
    spinner.finish_and_clear();

    let outcome = report.outcome();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !plan.is_empty() || outcome != RunOutcome::Clean {
        println!();
        println!("{}", report.render());
    }

    Ok(ExitCode::from(outcome.exit_code() as u8))
}
