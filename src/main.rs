mod cli;

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::Value;
use tokio::sync::watch;

use cli::{Cli, Command, TaskCommand};
use unmand::config::UnmandConfig;
use unmand::exfil::{ExfilClient, SubmitOptions};
use unmand::extraction::{Extraction, Status};
use unmand::swarm::{NewTask, Task};
use unmand::ui::{PollProgress, print_json};
use unmand::{Poller, Submitter, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = resolve_config(&cli)?;
    config.require_token()?;

    match &cli.command {
        Command::Extract {
            file,
            model,
            no_wait,
        } => {
            let client = config.exfil_client()?;
            let mut job = submit(&client, file, model.as_deref()).await?;
            println!("Submitted {job}");
            if *no_wait {
                return Ok(());
            }
            poll_to_end(&client, &config, cli.quiet, &mut job).await
        }
        Command::Poll { id } => {
            let client = config.exfil_client()?;
            let mut job = Extraction::new(id.clone(), Status::Queued);
            poll_to_end(&client, &config, cli.quiet, &mut job).await
        }
        Command::Task(TaskCommand::Upload { file }) => {
            let task = read_task(file)?;
            let body = config.swarm_client()?.upload_task(&task).await?;
            print_json("Uploaded task", &body);
            Ok(())
        }
        Command::Task(TaskCommand::Update { file }) => {
            let task = read_task(file)?;
            let body = config.swarm_client()?.update_task(&task).await?;
            print_json("Updated task", &body);
            Ok(())
        }
    }
}

/// `unmand.toml` and the environment, with command line flags on top.
fn resolve_config(cli: &Cli) -> Result<UnmandConfig> {
    let mut config = UnmandConfig::load()?;
    if let Some(token) = &cli.token {
        config.api_token = token.clone();
    }
    if cli.test {
        config.test = true;
    }
    if let Some(interval) = cli.interval_ms {
        config.poll_interval_ms = interval;
    }
    if let Some(max) = cli.max_attempts {
        config.max_attempts = max;
    }
    Ok(config)
}

async fn submit(client: &ExfilClient, file: &Path, model: Option<&str>) -> Result<Extraction> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let mut options = SubmitOptions::default();
    if let Some(name) = file.file_name().and_then(|n| n.to_str()) {
        options = options.with_file_name(name);
    }
    if let Some(model) = model {
        options = options.with_model(model);
    }

    Ok(Submitter::new(client).submit_with(&bytes, &options).await?)
}

async fn poll_to_end(
    client: &ExfilClient,
    config: &UnmandConfig,
    quiet: bool,
    job: &mut Extraction,
) -> Result<()> {
    let mut poll_config = config.poll_config();
    poll_config.suppress_output = quiet;

    // Ctrl-C stops polling at the next wait; the extraction keeps running remotely.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let mut poller = Poller::with_config(client, poll_config).with_cancellation(cancel_rx);
    let progress = if quiet {
        None
    } else {
        Some(PollProgress::start(job))
    };
    if let Some(progress) = &progress {
        poller = poller.with_sink(progress.clone());
    }

    match poller.poll(job).await {
        Ok(job) => {
            if let Some(progress) = &progress {
                progress.complete(job);
            }
            if let Some(result) = job.result() {
                print_json("Result", &Value::Object(result.clone()));
            }
            if job.status() == Status::Failed {
                bail!("extraction {} failed", job.id());
            }
            Ok(())
        }
        Err(err) => {
            if let Some(progress) = &progress {
                progress.abort(&err);
            }
            Err(err.into())
        }
    }
}

fn read_task(path: &Path) -> Result<Task> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let new_task: NewTask = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid task description", path.display()))?;
    Ok(Task::new(new_task)?)
}
