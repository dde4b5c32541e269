pub mod args;
mod setup;

pub use args::AppArgs;

use anyhow::Result;

pub async fn launch() -> Result<()> {
    launch_with_args(AppArgs::from_cli()).await
}

pub async fn launch_with_args(args: AppArgs) -> Result<()> {
    let setup::PreparedApp {
        addr,
        service,
        log_guard: _log_guard,
    } = setup::prepare(args)?;

    crate::web::start_server(service, &addr).await
}
