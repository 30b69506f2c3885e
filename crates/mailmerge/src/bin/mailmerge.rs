fn main() -> anyhow::Result<()> {
    mailmerge::cli::run()
}
