use runner_demos::{
    defaults::{init_logging_defaults, init_simulated_timeouts, init_tracing},
    run, simulated_context,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging_defaults();
    init_simulated_timeouts();
    init_tracing();

    run(simulated_context()).await
}
