use pictura_core::Config;

// mimalloc as the global allocator; the service usually runs in a musl container.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = pictura_api::setup::initialize_app(config.clone()).await?;

    pictura_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
