use cucumber::given;
use tracing::info;

use crate::world::{FabricWorld, StepResult};

const BANNER: &str = "**********************************************************************************";

#[given(regex = r"^I put a log message (.+?)$")]
async fn log_message(_world: &mut FabricWorld, message: String) -> StepResult {
    info!("{BANNER}");
    info!("****** {message} ******");
    info!("{BANNER}");
    Ok(())
}
