use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crpt_api::{CrptClient, CrptConfig, Description, Document, Product, SlidingWindowLimiter, TimeWindow};

/// Submit goods documents to the CRPT registry within a request rate limit.
#[derive(Parser, Debug)]
#[command(name = "crpt-api", version, about)]
struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Document to submit, as JSON; a sample document is used if omitted
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Detached signature of the document
    #[arg(short, long, default_value = "base64_signature_here")]
    signature: String,

    /// Product group (`pg` query parameter)
    #[arg(short = 'g', long)]
    product_group: Option<String>,

    /// How many times to submit the document, all at once
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Override the maximum submissions per window
    #[arg(long)]
    requests_per_window: Option<i64>,

    /// Override the window unit (millisecond, second, minute, hour, day)
    #[arg(long)]
    window: Option<TimeWindow>,

    /// Override the registry endpoint
    #[arg(long)]
    api_url: Option<String>,

    /// Override the bearer token
    #[arg(long)]
    token: Option<String>,

    /// Print the request that would be sent and exit
    #[arg(long)]
    dry_run: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    info!("Starting crpt-api {}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    info!(
        api_url = %config.client.api_url,
        window = %config.rate_limiting.window,
        requests_per_window = config.rate_limiting.requests_per_window,
        "Configuration loaded"
    );

    let document = match &cli.document {
        Some(path) => Document::from_file(path)?,
        None => sample_document(),
    };

    let limiter = Arc::new(SlidingWindowLimiter::new(
        config.rate_limiting.window,
        config.rate_limiting.requests_per_window,
    )?);
    let client = CrptClient::new(&config.client, limiter.clone())?;
    let product_group = cli
        .product_group
        .clone()
        .unwrap_or_else(|| client.default_product_group().to_string());

    if cli.dry_run {
        let request = client
            .build_request(&document, &cli.signature, &product_group)
            .await?;
        println!("{} {}", request.method(), request.url());
        for (name, value) in request.headers() {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
        if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
            println!();
            println!("{}", String::from_utf8_lossy(body));
        }
        return Ok(());
    }

    // Release blocked submissions on Ctrl+C / SIGTERM
    tokio::spawn(close_on_signal(limiter.clone()));

    let submissions = (0..cli.count).map(|i| {
        let client = client.clone();
        let document = &document;
        let signature = &cli.signature;
        let product_group = &product_group;
        async move {
            let result = client
                .submit_with_group(document, signature, product_group)
                .await;
            if let Err(e) = &result {
                if e.is_cancelled() {
                    warn!(submission = i, "Submission abandoned: {}", e);
                } else {
                    error!(submission = i, "Submission failed: {}", e);
                }
            }
            result
        }
    });
    let results = futures::future::join_all(submissions).await;

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(
        submitted = results.len() - failed,
        failed = failed,
        "All submissions finished"
    );

    if failed > 0 {
        anyhow::bail!("{} of {} submissions failed", failed, results.len());
    }
    Ok(())
}

/// Layer CLI overrides on top of the file/environment configuration.
fn load_config(cli: &Cli) -> anyhow::Result<CrptConfig> {
    let mut config = CrptConfig::load(cli.config.as_deref())?;

    if let Some(limit) = cli.requests_per_window {
        config.rate_limiting.requests_per_window = limit;
    }
    if let Some(window) = cli.window {
        config.rate_limiting.window = window;
    }
    if let Some(url) = &cli.api_url {
        config.client.api_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.client.token = token.clone();
    }

    config.validate()?;
    Ok(config)
}

/// A ready-made goods introduction document for trying the client out.
fn sample_document() -> Document {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    Document {
        description: Some(Description::new("1234567890")),
        doc_id: Some(format!("DOC-{}", uuid::Uuid::new_v4())),
        doc_status: Some("IN_PROGRESS".to_string()),
        doc_type: Some("LP_INTRODUCE_GOODS".to_string()),
        owner_inn: Some("1234567890".to_string()),
        participant_inn: Some("0987654321".to_string()),
        producer_inn: Some("1122334455".to_string()),
        production_date: Some(today),
        production_type: Some("LOCAL".to_string()),
        products: vec![Product {
            certificate_document: Some("CERT-001".to_string()),
            certificate_document_date: Some("2023-12-01".to_string()),
            certificate_document_number: Some("123456".to_string()),
            tnved_code: Some("0401".to_string()),
            uit_code: Some("010463003407002921wskg1E44R1qym2406401".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Close `limiter` once Ctrl+C or SIGTERM arrives.
async fn close_on_signal(limiter: Arc<SlidingWindowLimiter>) {
    match wait_for_signal().await {
        Ok(name) => {
            info!(signal = name, "Shutdown requested, cancelling pending submissions");
            limiter.close();
        }
        Err(e) => error!(error = %e, "Cannot listen for shutdown signals"),
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    tokio::select! {
        received = signal::ctrl_c() => received.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    signal::ctrl_c().await.map(|_| "Ctrl+C")
}
