use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::AppConfig;
use crate::jobs::{EmailStarred, Host, Job, SaveStarred};

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum JobId {
    SaveStarred,
    EmailStarred,
}

pub async fn run(id: JobId) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let host = Host::from_config(&config).await?;

    let job: Box<dyn Job> = match id {
        JobId::SaveStarred => Box::new(SaveStarred),
        JobId::EmailStarred => Box::new(EmailStarred),
    };

    println!("Running job: {:?}", id);
    job.run_job(&config, &host).await?;
    println!("Job completed");

    Ok(())
}
