use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use voicechat::{
    run_mic_sync, CaptureSession, ChannelRecognizer, Config, FixedMicrophone, RecognizerConfig,
    SessionConfig, TranscriptView, Widget,
};

#[derive(Debug, Parser)]
#[command(name = "voicechat", about = "Voice chat transcript glue")]
struct Cli {
    /// Configuration file, without extension (config-crate style)
    #[arg(long, default_value = "config/voicechat")]
    config: String,

    /// Override the recognition language from the config file
    #[arg(long)]
    language: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;
    let language = cli.language.unwrap_or_else(|| cfg.speech.language.clone());

    // A failed widget stays a logged condition; the transcript loop still
    // works without it.
    let widget = match Widget::new(cfg.widget.clone()) {
        Ok(widget) => Some(widget),
        Err(err) => {
            warn!(error = %err, "continuing without voice widget");
            None
        }
    };

    let recognizer = ChannelRecognizer::new(RecognizerConfig {
        language: language.clone(),
        ..Default::default()
    });
    let driver = recognizer.driver();

    let session = Arc::new(CaptureSession::new(
        SessionConfig {
            max_restart_attempts: cfg.speech.max_restart_attempts,
            restart_delay: Duration::from_millis(cfg.speech.restart_delay_ms),
            ..Default::default()
        },
        Box::new(recognizer),
        Box::new(FixedMicrophone::default()),
    ));

    let mut view = TranscriptView::new();
    view.attach(&session, widget.as_ref());
    let _mic_sync = widget
        .as_ref()
        .map(|widget| run_mic_sync(Arc::clone(&session), widget));

    session.start().await?;
    info!(
        session = %session.session_id(),
        language = %language,
        "ready; type an utterance and press enter, ctrl-d to quit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        driver.push_final(&line).await;

        // Give the view task a beat to drain the broadcast.
        tokio::time::sleep(Duration::from_millis(20)).await;
        for rendered in view.render().await {
            println!("{rendered}");
        }
    }

    session.stop().await;
    Ok(())
}
