use renogy_modbus::options::Options;

fn main() -> anyhow::Result<()> {
    renogy_modbus::app(Options::new())
}
