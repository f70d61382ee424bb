//! qrstudio command-line entrypoint

use clap::{Args, Parser, Subcommand};
use qrstudio::output::{RenderReport, empty_report, render_report};
use qrstudio::{
    ContactInfo, Error, ExportFormat, Pipeline, PreviewState, Previewer, QrContent, QrJob,
    QrStudioConfig, RenderRequest, RenderedImage, Result, StyleOptions, SymbolVerifier,
    WifiCredential, WifiEncryption, logging, metrics,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "qrstudio",
    version,
    about = "Styled QR code generator with logo compositing"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to qrstudio.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Print a JSON report instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Collect render metrics and print them on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(flatten)]
    style: StyleArgs,

    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a URL
    Url {
        /// Target URL
        url: String,
    },
    /// Encode free text
    Text {
        /// Text content
        text: String,
    },
    /// Encode a vCard contact
    Contact {
        /// Full name
        #[arg(long)]
        name: String,
        /// Phone number
        #[arg(long)]
        phone: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Organization
        #[arg(long)]
        organization: Option<String>,
        /// Job title
        #[arg(long)]
        title: Option<String>,
    },
    /// Encode WiFi credentials
    Wifi {
        /// Network name
        #[arg(long)]
        ssid: String,
        /// Network password
        #[arg(long, default_value = "")]
        password: String,
        /// Encryption mode (wpa, wep, nopass)
        #[arg(long, default_value = "wpa")]
        encryption: WifiEncryption,
        /// Network does not broadcast its SSID
        #[arg(long)]
        hidden: bool,
    },
    /// Render a saved job file (toml/yaml)
    Job {
        /// Job file path
        path: PathBuf,
        /// Re-render whenever the job file changes
        #[arg(long)]
        watch: bool,
        /// Poll interval for --watch, in milliseconds
        #[arg(long, default_value_t = 500)]
        poll_ms: u64,
    },
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// Foreground color (#RRGGBB)
    #[arg(long, value_name = "COLOR", global = true)]
    fg: Option<String>,
    /// Background color (#RRGGBB)
    #[arg(long, value_name = "COLOR", global = true)]
    bg: Option<String>,
    /// Error-correction level (l, m, q, h)
    #[arg(long, value_name = "LEVEL", global = true)]
    ec_level: Option<String>,
    /// Finder pattern style (square, dot, round)
    #[arg(long, value_name = "STYLE", global = true)]
    corner_style: Option<String>,
    /// Data module style (square, dot, round)
    #[arg(long, value_name = "STYLE", global = true)]
    pixel_style: Option<String>,
    /// Output edge length in pixels
    #[arg(long, value_name = "PX", global = true)]
    size: Option<u32>,
    /// Quiet zone width in modules
    #[arg(long, value_name = "MODULES", global = true)]
    margin: Option<u32>,
    /// Logo image path or data: URI
    #[arg(long, value_name = "PATH", global = true)]
    logo: Option<String>,
}

impl StyleArgs {
    fn to_style_options(&self) -> StyleOptions {
        StyleOptions {
            foreground: self.fg.clone(),
            background: self.bg.clone(),
            ec_level: self.ec_level.clone(),
            corner_style: self.corner_style.clone(),
            pixel_style: self.pixel_style.clone(),
            size: self.size,
            margin: self.margin,
            logo: self.logo.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Export format (png or svg)
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<ExportFormat>,
    /// Output file (defaults to <output.directory>/<output.file_stem>.<format>)
    #[arg(long, short = 'o', value_name = "PATH", global = true)]
    output: Option<PathBuf>,
    /// Decode the result and fail if it does not scan back to the payload
    #[arg(long, global = true)]
    verify: bool,
}

/// Everything needed to turn a pipeline result into files and reports
struct Session {
    config: QrStudioConfig,
    cli_style: StyleOptions,
    format: ExportFormat,
    path: PathBuf,
    verify: bool,
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = QrStudioConfig::load(cli.config.as_deref())?;
    if cli.metrics {
        config.logging.metrics = true;
    }

    logging::init(&config.logging)?;

    if config.logging.metrics {
        metrics::enable(config.logging.metrics_interval_secs);
    }

    let format = cli.output.format.unwrap_or(config.output.format);
    let path = cli
        .output
        .output
        .clone()
        .unwrap_or_else(|| config.output.path_for(format));

    let session = Session {
        cli_style: cli.style.to_style_options(),
        format,
        path,
        verify: cli.output.verify,
        json: cli.json,
        config,
    };

    let no_style = StyleOptions::default();
    let result = match cli.command {
        Command::Job {
            path,
            watch: true,
            poll_ms,
        } => watch_job(&session, &path, Duration::from_millis(poll_ms.max(50))).await,
        Command::Job { path, .. } => {
            let job = QrJob::from_file(&path)?;
            render_once(&session, job.content, &job.style).await
        }
        Command::Url { url } => render_once(&session, QrContent::Url { url }, &no_style).await,
        Command::Text { text } => {
            render_once(&session, QrContent::Text { text }, &no_style).await
        }
        Command::Contact {
            name,
            phone,
            email,
            organization,
            title,
        } => {
            let contact = ContactInfo {
                name,
                phone,
                email,
                organization,
                title,
            };
            render_once(&session, QrContent::Contact(contact), &no_style).await
        }
        Command::Wifi {
            ssid,
            password,
            encryption,
            hidden,
        } => {
            let wifi = WifiCredential {
                ssid,
                password,
                encryption,
                hidden,
            };
            render_once(&session, QrContent::Wifi(wifi), &no_style).await
        }
    };

    if session.config.logging.metrics {
        if let Some(text) = metrics::render(session.config.logging.metrics_format) {
            eprintln!("{text}");
        }
    }

    result
}

impl Session {
    /// Config defaults, then the job's style, then command-line flags.
    fn request(&self, content: QrContent, job_style: &StyleOptions) -> Result<RenderRequest> {
        let options = self
            .config
            .style
            .merged_with(job_style)
            .merged_with(&self.cli_style)
            .to_render_options()?;
        Ok(RenderRequest::new(content, options))
    }

    async fn write(&self, request: &RenderRequest, rendered: &RenderedImage) -> Result<()> {
        let bytes = rendered.export(self.format)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, &bytes).await?;
        info!(path = %self.path.display(), bytes = bytes.len(), format = %self.format, "Wrote QR code");

        let verified = if self.verify {
            let outcome = SymbolVerifier::new().verify(rendered);
            if let Err(err) = &outcome {
                warn!(error = %err, "Rendered symbol failed verification");
            }
            Some(outcome.is_ok())
        } else {
            None
        };

        self.emit(&render_report(
            rendered,
            &request.options,
            self.format,
            Some(&self.path),
            verified,
        ))?;

        if verified == Some(false) {
            return Err(Error::Verify(
                "rendered symbol does not decode to its payload; try a higher EC level or a smaller logo"
                    .to_string(),
            ));
        }
        Ok(())
    }

    fn emit(&self, report: &RenderReport) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&report.json)?);
        } else {
            for line in &report.human {
                println!("{line}");
            }
        }
        Ok(())
    }

    fn emit_error(&self, message: &str) -> Result<()> {
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "error": message }))?
            );
        } else {
            println!("Render failed: {message}");
        }
        Ok(())
    }
}

async fn render_once(session: &Session, content: QrContent, job_style: &StyleOptions) -> Result<()> {
    let request = session.request(content, job_style)?;

    match Pipeline::new().run(&request).await {
        Ok(Some(rendered)) => session.write(&request, &rendered).await,
        Ok(None) => session.emit(&empty_report()),
        Err(err) => {
            session.emit_error(&err.to_string())?;
            Err(err)
        }
    }
}

async fn watch_job(session: &Session, job_path: &Path, poll: Duration) -> Result<()> {
    let previewer = Previewer::default();
    let mut updates = previewer.subscribe();
    let mut ticker = tokio::time::interval(poll);
    let mut last_modified: Option<SystemTime> = None;
    let mut pending: BTreeMap<u64, RenderRequest> = BTreeMap::new();
    let mut seen = PreviewState::default();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    info!(path = %job_path.display(), "Watching job file for changes");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping watch");
                return Ok(());
            }
            _ = ticker.tick() => {
                let modified = tokio::fs::metadata(job_path).await.and_then(|m| m.modified()).ok();
                if modified.is_none() || modified == last_modified {
                    continue;
                }
                last_modified = modified;

                match QrJob::from_file(job_path).and_then(|job| session.request(job.content, &job.style)) {
                    Ok(request) => {
                        let _ = previewer.submit(request.clone());
                        pending.insert(previewer.current().latest_generation, request);
                    }
                    Err(err) => {
                        warn!(error = %err, "Ignoring invalid job file");
                        session.emit_error(&err.to_string())?;
                    }
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let state = updates.borrow_and_update().clone();
                let request = state.shown_generation.and_then(|generation| pending.get(&generation));
                if let Err(err) = handle_update(session, &state, &seen, request).await {
                    warn!(error = %err, "Failed to publish preview");
                    session.emit_error(&err.to_string())?;
                }
                if let Some(shown) = state.shown_generation {
                    pending.retain(|generation, _| *generation > shown);
                }
                seen = state;
            }
        }
    }
}

/// Resolves on the first Ctrl-C. Create it once and poll it by reference so
/// an interrupt delivered while the loop is busy is still observed.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Unable to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn handle_update(
    session: &Session,
    state: &PreviewState,
    seen: &PreviewState,
    request: Option<&RenderRequest>,
) -> Result<()> {
    if state.last_error != seen.last_error {
        if let Some(message) = &state.last_error {
            session.emit_error(message)?;
        }
    }

    if state.awaiting_input && !seen.awaiting_input {
        session.emit(&empty_report())?;
    }

    if state.shown_generation == seen.shown_generation {
        return Ok(());
    }

    match (&state.image, request) {
        (Some(image), Some(request)) => session.write(request, image).await,
        _ => Ok(()),
    }
}
