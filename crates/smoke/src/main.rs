use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = smoke::Arguments::parse();
    smoke::tracing::initialize(&args.log_filter);
    tracing::info!("running smoke test with {:#?}", args);

    smoke::run(args).await
}
