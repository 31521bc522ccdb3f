fn main() -> anyhow::Result<()> {
    rtboard_cli::run()
}
