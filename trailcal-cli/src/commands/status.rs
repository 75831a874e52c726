use anyhow::Result;
use owo_colors::OwoColorize;
use trailcal_core::DeclaredEvent;
use trailcal_core::diff::SyncPlan;
use trailcal_core::identity::Namespace;
use trailcal_core::reconcile::Reconciler;
use trailcal_core::remote::RemoteStore;
use trailcal_core::source::load_races;

use super::Settings;
use crate::render::render_plan;
use crate::utils::tui::create_spinner;

pub async fn run(settings: Settings, full: bool) -> Result<()> {
    let declared = load_races(&settings.races)?;
    let remote = settings.config.remote()?;
    remote.provider.binary_path()?;

    let spinner = create_spinner(remote.provider.name().to_string());
    let plan = dry_run(remote, &settings.namespace, &declared).await;
    spinner.finish_and_clear();
    let plan = plan?;

    println!(
        "{} {}",
        remote.provider.name().bold(),
        format!("({} races in {})", declared.len(), settings.races.display()).dimmed()
    );
    println!("{}", render_plan(&plan, full));

    Ok(())
}

/// Plan without applying; an unreachable store or bad input fails the command.
async fn dry_run<S: RemoteStore>(
    store: &S,
    namespace: &Namespace,
    declared: &[DeclaredEvent],
) -> Result<SyncPlan> {
    Ok(Reconciler::new(store, namespace.clone())
        .plan(declared)
        .await?)
}
