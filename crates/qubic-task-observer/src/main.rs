/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Created, observed, approved, or audited tasks rendered to the terminal
[POS]:    Binary entry point
[UPDATE]: When changing CLI commands, startup flow, or shutdown handling
*/

mod cli;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use console::style;
use qubic_task_adapter::{TaskApi, TaskParameters, TaskType};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use qubic_task_observer::render::{render_audit, render_view};
use qubic_task_observer::{
    ApprovalGate, AuditCorrelator, ObservationHandle, ObservationView, ObserverConfig, Reconciler,
    RefreshOutcome, TaskObserver,
};

use crate::cli::interactive::{PromptTracker, prompt_decision};

#[derive(Parser, Debug)]
#[command(name = "qubic-task-observer", version, about = "Qubic task lifecycle observer")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate configuration
    Check {
        /// Also query the gateway health endpoint
        #[arg(long)]
        probe: bool,
    },
    /// Submit a new task
    Create {
        #[arg(long = "type", value_name = "TYPE")]
        task_type: String,
        #[arg(long, value_name = "ADDR")]
        wallet: String,
        #[arg(long, value_name = "ADDR")]
        destination: Option<String>,
        #[arg(long, value_name = "DEC")]
        amount: Option<Decimal>,
        #[arg(long)]
        description: Option<String>,
        /// Keep observing the task after creation
        #[arg(long)]
        watch: bool,
    },
    /// Show status and audit log once
    Status { task_id: String },
    /// Poll until the task settles or Ctrl-C
    Watch {
        task_id: String,
        /// Prompt for a decision when approval is required
        #[arg(long)]
        interactive: bool,
    },
    Approve {
        task_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    Reject {
        task_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Show the audit log
    Audit { task_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = load_config(args.config_path.as_ref())?;
    info!(
        base_url = %config.gateway.base_url,
        interval_ms = config.polling.interval_ms,
        "configuration loaded"
    );

    match args.command {
        Command::Check { probe } => check(&config, probe).await,
        Command::Create {
            task_type,
            wallet,
            destination,
            amount,
            description,
            watch,
        } => {
            let mut parameters = TaskParameters::wallet(wallet);
            if let Some(destination) = destination {
                parameters = parameters.with_destination(destination);
            }
            if let Some(amount) = amount {
                parameters = parameters.with_amount(amount);
            }
            create(
                &config,
                TaskType::from(task_type),
                description,
                parameters,
                watch,
            )
            .await
        }
        Command::Status { task_id } => status(&config, &task_id).await,
        Command::Watch {
            task_id,
            interactive,
        } => {
            let mut observer = TaskObserver::new(build_api(&config)?, config.polling.clone());
            setup_signal_handlers(observer.shutdown_token());
            let handle = observer.begin_observation(&task_id).await;
            watch(&mut observer, handle, interactive).await
        }
        Command::Approve { task_id, reason } => {
            decide(&config, &task_id, true, reason.as_deref()).await
        }
        Command::Reject { task_id, reason } => {
            decide(&config, &task_id, false, reason.as_deref()).await
        }
        Command::Audit { task_id } => audit(&config, &task_id).await,
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<ObserverConfig> {
    let Some(path) = path else {
        let config = ObserverConfig::default();
        config.validate().context("default config")?;
        return Ok(config);
    };
    let path_str = path.to_str().context("config path must be valid utf-8")?;
    ObserverConfig::from_file(path_str).context("load config")
}

fn build_api(config: &ObserverConfig) -> Result<Arc<dyn TaskApi>> {
    Ok(Arc::new(config.build_client()?))
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

async fn check(config: &ObserverConfig, probe: bool) -> Result<()> {
    println!("{}", style("Configuration OK").green());
    if !probe {
        return Ok(());
    }

    let client = config.build_client()?;
    let health = client.health().await.context("gateway health probe")?;
    if health.is_healthy() {
        println!(
            "{} {}",
            style("Gateway healthy:").green(),
            health.service.as_deref().unwrap_or("api-gateway")
        );
        Ok(())
    } else {
        Err(anyhow!(
            "gateway unhealthy: {}",
            health.error.unwrap_or(health.status)
        ))
    }
}

async fn create(
    config: &ObserverConfig,
    task_type: TaskType,
    description: Option<String>,
    parameters: TaskParameters,
    watch_after: bool,
) -> Result<()> {
    let mut observer = TaskObserver::new(build_api(config)?, config.polling.clone());
    setup_signal_handlers(observer.shutdown_token());

    let created = observer
        .create_task(task_type, description, parameters)
        .await
        .context("create task")?;
    println!(
        "{} {}",
        style("Task created:").green(),
        style(&created.snapshot.task_id).cyan()
    );

    if watch_after {
        return watch(&mut observer, created.handle, false).await;
    }
    observer.shutdown_and_wait().await.context("stop observation")
}

/// Fetch status once, failing if the status cannot be read.
async fn refresh_once(reconciler: &Reconciler) -> Result<ObservationView> {
    if let RefreshOutcome::Failed(err) = reconciler.refresh().await {
        return Err(err).with_context(|| format!("fetch status task_id={}", reconciler.task_id()));
    }
    Ok(reconciler.view())
}

async fn status(config: &ObserverConfig, task_id: &str) -> Result<()> {
    let reconciler = Reconciler::new(task_id, build_api(config)?);
    let view = refresh_once(&reconciler).await?;
    print_lines(render_view(&view));
    Ok(())
}

async fn audit(config: &ObserverConfig, task_id: &str) -> Result<()> {
    let log = AuditCorrelator::new(build_api(config)?)
        .fetch(task_id)
        .await
        .with_context(|| format!("fetch audit log task_id={task_id}"))?;
    print_lines(render_audit(&log));
    Ok(())
}

async fn decide(
    config: &ObserverConfig,
    task_id: &str,
    approved: bool,
    reason: Option<&str>,
) -> Result<()> {
    let api = build_api(config)?;
    let reconciler = Arc::new(Reconciler::new(task_id, api.clone()));
    refresh_once(&reconciler).await?;

    let gate = ApprovalGate::new(api, reconciler.clone());
    let receipt = if approved {
        gate.approve(reason).await
    } else {
        gate.reject(reason).await
    }
    .with_context(|| format!("submit decision task_id={task_id}"))?;

    println!("{}", style(&receipt.response.message).green());
    print_lines(render_view(&reconciler.view()));
    Ok(())
}

async fn watch(
    observer: &mut TaskObserver,
    handle: ObservationHandle,
    interactive: bool,
) -> Result<()> {
    let task_id = handle.task_id().to_string();
    let display_stop = CancellationToken::new();
    let display = tokio::spawn(display_loop(handle, interactive, display_stop.clone()));

    let exit = observer.wait_for_completion(&task_id).await;
    display_stop.cancel();
    if let Err(err) = display.await {
        warn!(task_id = %task_id, error = %err, "display loop join error");
    }

    let exit = exit?;
    info!(task_id = %task_id, exit = ?exit, "watch finished");
    observer.shutdown_and_wait().await.context("shutdown observations")
}

async fn display_loop(handle: ObservationHandle, interactive: bool, stop: CancellationToken) {
    let mut rx = handle.subscribe();
    let mut prompts = PromptTracker::default();
    print_lines(render_view(&rx.borrow_and_update()));

    loop {
        tokio::select! {
            biased;
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = stop.cancelled() => break,
        }

        let view = rx.borrow_and_update().clone();
        println!("{}", style("-".repeat(40)).dim());
        print_lines(render_view(&view));

        if interactive
            && prompts.should_prompt(view.approval_episode)
            && handle.gate().is_enabled().await
            && prompt_and_decide(&handle, &view).await
        {
            prompts.mark_answered(view.approval_episode);
        }
    }
}

/// Returns true once the user has answered for this episode: decided, or chose to wait.
async fn prompt_and_decide(handle: &ObservationHandle, view: &ObservationView) -> bool {
    let Some(task) = view.task.clone() else {
        return false;
    };
    let choice = match tokio::task::spawn_blocking(move || prompt_decision(&task)).await {
        Ok(Ok(Some(choice))) => choice,
        Ok(Ok(None)) => return true,
        Ok(Err(err)) => {
            warn!(task_id = %handle.task_id(), error = %err, "approval prompt failed");
            return false;
        }
        Err(err) => {
            warn!(task_id = %handle.task_id(), error = %err, "approval prompt join error");
            return false;
        }
    };

    match handle.decide(choice.approved, &choice.reason).await {
        Ok(receipt) => {
            println!("{}", style(&receipt.response.message).green());
            true
        }
        Err(err) => {
            println!("{} {err}", style("Decision not submitted:").yellow());
            false
        }
    }
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
