use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = pillar_app::Args::parse();
    pillar_app::run(args).await
}
