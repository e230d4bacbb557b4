use lumen_demos::ClearScreen;

fn main() -> anyhow::Result<()> {
    lumen_demos::run::<ClearScreen>()
}
