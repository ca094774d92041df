use std::time::Duration;

use aidge_tryon_client::config::{ApiHost, Region};
use aidge_tryon_client::tryon::{Garment, ModelSpec, PollOutcome};
use aidge_tryon_client::{Config, PollPolicy, TryOnClient, TryOnRequest};
use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

const DEFAULT_IMAGE_URL: &str =
    "https://res.cloudinary.com/dnilsui8j/image/upload/v1751091524/tshirt-2_fvtmfy.jpg";

/// Submit a virtual try-on job and wait for its result.
///
/// Credentials come from `key_name` / `key_secret` in the environment or a `.env` file.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Public URL of the garment image (500x500 to 3000x3000 pixels)
    #[arg(long, default_value = DEFAULT_IMAGE_URL)]
    image_url: String,

    #[arg(long, default_value = "tops")]
    garment_type: String,

    #[arg(long, default_value = "General")]
    model_base: String,

    #[arg(long, default_value = "female")]
    gender: String,

    #[arg(long, default_value = "universal_1")]
    style: String,

    #[arg(long, default_value = "slim")]
    body: String,

    #[arg(long, default_value = "youngadult")]
    age: String,

    #[arg(long, default_value = "fullbody")]
    view_type: String,

    #[arg(long, default_value_t = 1)]
    generate_count: u32,

    /// Reject low quality input images
    #[arg(long)]
    input_quality_detect: bool,

    /// Site the key was purchased on (global | china)
    #[arg(long, conflicts_with = "api_domain")]
    region: Option<Region>,

    /// Explicit API host name, overrides `api_domain` from the environment
    #[arg(long)]
    api_domain: Option<String>,

    /// Use purchased calls instead of the trial quota
    #[arg(long)]
    no_trial: bool,

    /// Seconds between status queries
    #[arg(long, default_value_t = 1)]
    interval: u64,

    /// Give up after this many status queries
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Give up after this many seconds of polling
    #[arg(long)]
    timeout: Option<u64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long)]
    request_timeout: Option<u64>,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut config = Config::from_env().context("loading credentials")?;

        if let Some(region) = self.region {
            config.host = ApiHost::Region(region);
        }
        if let Some(domain) = &self.api_domain {
            config.host = ApiHost::Domain(domain.clone());
        }
        if self.no_trial {
            config.use_trial = false;
        }
        config.request_timeout = self.request_timeout.map(Duration::from_secs);
        config.poll = PollPolicy::builder()
            .interval(Duration::from_secs(self.interval))
            .maybe_max_attempts(self.max_attempts)
            .maybe_timeout(self.timeout.map(Duration::from_secs))
            .build();

        Ok(config)
    }

    fn request(&self) -> TryOnRequest {
        let model = ModelSpec::builder()
            .base(self.model_base.as_str())
            .gender(self.gender.as_str())
            .style(self.style.as_str())
            .body(self.body.as_str())
            .age(self.age.as_str())
            .build();

        TryOnRequest::builder()
            .clothes_list(vec![Garment::new(
                self.image_url.as_str(),
                self.garment_type.as_str(),
            )])
            .model(model)
            .view_type(self.view_type.as_str())
            .input_quality_detect(u8::from(self.input_quality_detect))
            .generate_count(self.generate_count)
            .build()
    }
}

#[expect(clippy::print_stdout, reason = "the final body is the program output")]
fn print_result(body: &str) {
    println!("{body}");
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env loaded"),
    }

    let args = Args::parse();
    let client = TryOnClient::new(args.config()?)?;

    let outcome = client.run(&[args.request()]).await?;
    match &outcome {
        PollOutcome::Finished(_) => tracing::info!("task finished"),
        PollOutcome::Interrupted(_) => tracing::info!("interrupted before the task finished"),
        PollOutcome::Exhausted(_) => tracing::warn!("poll bound reached before the task finished"),
        _ => {}
    }

    let body = outcome
        .into_last_response()
        .map_or_else(|| "None".to_owned(), |response| response.into_body());
    print_result(&body);

    Ok(())
}
