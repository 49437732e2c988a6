//! StablePay: desktop client for custodial stablecoin wallets

use eframe::egui;
use eyre::WrapErr;

use stablepay_wallet_adapters::{CustodyAdapterConfig, CustodyServiceAdapter};
use stablepay_wallet_core::WorkflowProfile;

mod app;
mod state;
mod ui;
mod wallet_bridge;

fn main() -> eyre::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "loaded environment file");
    }

    let config = CustodyAdapterConfig::try_from_env().wrap_err("invalid custody configuration")?;
    let profile = match std::env::var("STABLEPAY_PROFILE") {
        Ok(key) if !key.trim().is_empty() => WorkflowProfile::from_key(&key)
            .ok_or_else(|| eyre::eyre!("unknown STABLEPAY_PROFILE {key:?}"))?,
        _ => WorkflowProfile::default(),
    };
    let service = CustodyServiceAdapter::with_config(config.clone());

    tracing::info!(
        profile = profile.key,
        custody = service.mode_name(),
        "Starting StablePay"
    );

    let title = profile.title.clone();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(&title)
            .with_inner_size([760.0, 820.0])
            .with_min_inner_size([520.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        native_options,
        Box::new(move |cc| Ok(Box::new(app::App::new(cc, service, profile, &config)))),
    )
    .map_err(|e| eyre::eyre!("failed to run the UI: {e}"))
}
