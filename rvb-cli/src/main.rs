/// rvb - RVB1 raw vertex buffer exporter
///
/// Usage:
///   rvb export mesh.obj mesh.rvb [--object NAME] [--no-triangulate] [--no-y-up] [--config FILE]
///   rvb inspect mesh.rvb [--records N]

use clap::Parser;
use rvb_cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    rvb_cli::logging::init()?;
    rvb_cli::run(cli)
}
