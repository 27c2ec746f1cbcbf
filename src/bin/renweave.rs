//! renweave command-line binary

fn main() -> anyhow::Result<()> {
    renweave::cli::run_cli()
}
