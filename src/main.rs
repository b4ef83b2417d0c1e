use episoder::run;

fn main() -> anyhow::Result<()> {
    // Shows are refreshed one at a time.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run())
}
