pub mod keygen;
pub mod migrate;
pub mod serve;
pub mod token;

use crew_config::CrewConfig;

use crate::cli::Commands;

/// Route a parsed command to its handler.
pub async fn dispatch(command: Commands, config: CrewConfig) -> anyhow::Result<()> {
    match command {
        Commands::Serve => serve::handle(config).await,
        Commands::Migrate => migrate::handle(&config).await,
        Commands::Token { action } => token::handle(&action, &config),
        Commands::Keygen => keygen::handle(),
    }
}
