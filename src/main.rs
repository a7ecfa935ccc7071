use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use attraction_quiz::{
    AudioCue, Config, HttpTaskApi, LocalTaskApi, Quiz, QuizError, SessionResult, Silent, TaskApi,
    TaskId, TerminalBell, telemetry,
};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Quiz task to play
    #[arg(short, long)]
    task_id: u64,

    /// Root URL of the Task API
    #[arg(long, conflicts_with = "bank")]
    base_url: Option<String>,

    /// Play against a local JSON question bank instead of the Task API
    #[arg(long)]
    bank: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable feedback sounds
    #[arg(long)]
    no_audio: bool,

    /// Exit as soon as the result has been shown
    #[arg(long)]
    exit_on_complete: bool,
}

fn load_config(args: &Args) -> Result<Config, QuizError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(url) = &args.base_url {
        config.api.base_url = Some(url.clone());
        config.api.bank = None;
    }
    if let Some(bank) = &args.bank {
        config.api.bank = Some(bank.clone());
        config.api.base_url = None;
    }
    if args.no_audio {
        config.feedback.audio = false;
    }
    Ok(config)
}

fn build_api(config: &Config) -> Result<Arc<dyn TaskApi>, QuizError> {
    if let Some(bank) = &config.api.bank {
        let api = LocalTaskApi::from_json(bank)?;
        info!(target: "attraction_quiz", bank = %bank.display(), tasks = ?api.task_ids(), "using local question bank");
        return Ok(Arc::new(api));
    }
    if let Some(url) = &config.api.base_url {
        let api = HttpTaskApi::new(url, config.api.timeout())?;
        info!(target: "attraction_quiz", base_url = api.base_url(), "using task api");
        return Ok(Arc::new(api));
    }
    Err(QuizError::NoBackend)
}

async fn run(args: Args) -> Result<(), QuizError> {
    let config = load_config(&args)?;
    telemetry::init_tracing(&config.logging)?;

    let api = build_api(&config)?;
    let audio: Arc<dyn AudioCue> = if config.feedback.audio {
        Arc::new(TerminalBell)
    } else {
        Arc::new(Silent)
    };

    let completed: Arc<Mutex<Option<SessionResult>>> = Arc::default();
    let slot = Arc::clone(&completed);

    Quiz::new(api, TaskId(args.task_id))
        .with_settings(config.controller_settings())
        .with_audio(audio)
        .exit_on_complete(args.exit_on_complete)
        .on_complete(move |result| {
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(result.clone());
            }
        })
        .run()
        .await?;

    let result = completed.lock().ok().and_then(|mut slot| slot.take());
    if let Some(result) = result {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error running quiz: {e}");
            ExitCode::FAILURE
        }
    }
}
