fn main() -> anyhow::Result<()> {
    listkeep::cli::run()
}
