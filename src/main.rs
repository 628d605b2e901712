fn main() -> anyhow::Result<()> {
    nubes::cli::run_cli()
}
