use std::error::Error;
use std::sync::Arc;

use schedule_planner::catalog::{SqliteSource, TermCatalog};
use schedule_planner::gpa::NoGpaData;
use schedule_planner::{run_server, AppState, Config};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str())))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env()?;

    let catalog = Arc::new(TermCatalog::new());
    let source = SqliteSource::new(&config.database_path);

    if let Err(e) = source.load_course_index(&catalog) {
        warn!(path = %config.database_path.display(), error = %e, "could not load course index");
    }
    for term in &config.active_terms {
        match source.load_term(&catalog, term) {
            Ok(n) => info!(%term, sections = n, "active term ready"),
            Err(e) => warn!(%term, error = %e, "failed to load active term"),
        }
    }

    let state = AppState::new(catalog, Arc::new(NoGpaData), Some(source), &config);
    run_server(config, state).await?;
    Ok(())
}
