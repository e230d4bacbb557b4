use lumen_demos::Triangle;

fn main() -> anyhow::Result<()> {
    lumen_demos::run::<Triangle>()
}
