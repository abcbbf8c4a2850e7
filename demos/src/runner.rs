use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context as _, Result};
use cucumber::{World as _, WriterExt as _, writer, writer::Verbosity};
use fabric_testing_config::FixturePaths;
use fabric_testing_core::{RunContext, admin::simulated::SimulatedNetwork};
use fabric_testing_cucumber::FabricWorld;
use tracing::info;

const FEATURES_DIR: &str = "cucumber/features";
const JUNIT_OUTPUT: &str = "cucumber-output-junit.xml";

/// Run context backed by an in-memory network and the bundled fixtures
/// (or `FABRIC_TEST_FIXTURES_DIR`).
#[must_use]
pub fn simulated_context() -> RunContext {
    RunContext::new(Arc::new(SimulatedNetwork::new()), FixturePaths::from_env())
}

/// Directory holding the bundled feature files.
#[must_use]
pub fn features_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(FEATURES_DIR)
}

/// Runs every feature sequentially against `ctx`. The context, and with it
/// the chaincode tracker, is shared by all scenarios of the run.
pub async fn run(ctx: RunContext) -> Result<()> {
    let features = features_dir();
    let junit = fs::File::create(JUNIT_OUTPUT)
        .with_context(|| format!("creating {JUNIT_OUTPUT}"))?;

    info!(features = %features.display(), fixtures = %ctx.fixtures().root().display(), "starting cucumber run");

    FabricWorld::cucumber()
        .max_concurrent_scenarios(1)
        .fail_on_skipped()
        .with_writer(
            writer::Summarize::new(writer::Basic::new(
                io::stdout(),
                writer::Coloring::Auto,
                Verbosity::Default,
            ))
            .tee::<FabricWorld, _>(writer::JUnit::for_tee(junit, 0))
            .normalized(),
        )
        .before(move |feature, _rule, scenario, world| {
            let ctx = ctx.clone();
            Box::pin(async move {
                info!(feature = %feature.name, scenario = %scenario.name, "starting scenario");
                world.attach(ctx);
            })
        })
        .run_and_exit(features)
        .await;

    Ok(())
}
