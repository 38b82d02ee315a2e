use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use testkit_maps::{build, fetch::HttpRowSource, Config};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configure ────────────────────────────────────────────────
    let config = Config::from_env();
    let source = HttpRowSource::new(Client::new(), config.cache_window);
    info!(out = %config.out_dir.display(), "writing tables");

    // ─── 3) fetch → validate → merge → export ────────────────────────
    match build(&source, &config, Utc::now()).await {
        Ok(report) => {
            if report.opens.rejected > 0 {
                info!("opens: {} invalid rows skipped", report.opens.rejected);
            }
            if report.stores.nhi.rejected > 0 {
                info!("nhi stores: {} invalid rows skipped", report.stores.nhi.rejected);
            }
            info!(
                "wrote {} opening-hours rows and {} stores",
                report.opens.kept, report.stores.merged
            );
            Ok(())
        }
        Err(e) => {
            error!("build failed: {:#}", e);
            Err(e)
        }
    }
}
