use anyhow::Context;
use libris::modules::{
    self,
    books::catalog::Catalog,
    recommendations::{client::Recommender, gemini::GeminiClient},
};
use libris_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        data_dir = %settings.storage.data_dir.display(),
        "libris bootstrap starting"
    );

    // The recommendation feature cannot run without its credential.
    let api_key = settings.recommendation.resolve_api_key()?;
    let model = GeminiClient::new(&settings.recommendation, api_key)?;

    let catalog = Catalog::open(&settings.storage.data_dir).into_shared();

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, catalog, Recommender::new(model));

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("libris bootstrap complete");

    let served = libris_http::start_server(&registry, &settings).await;
    registry.stop_all().await?;
    served
}
