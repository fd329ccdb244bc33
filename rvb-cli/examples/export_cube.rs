/// Example: write a unit cube as an RVB1 file and read it back
///
/// Usage: cargo run --example export_cube -- path/to/cube.rvb

use std::env;
use rvb_core::{export_scene, rvb, ExportOptions, Mesh, Scene};

fn main() -> anyhow::Result<()> {
    rvb_cli::logging::init()?;

    let path = env::args().nth(1).unwrap_or_else(|| "cube.rvb".to_string());

    let mut scene = Scene::new();
    scene.add_object("Cube", Mesh::cube(2.0));
    let summary = export_scene(&scene, &path, &ExportOptions::default())?;
    println!("Wrote {} vertices to {}", summary.vertex_count, path);

    let (header, records) = rvb::read_file(&path)?;
    let mut out = std::io::stdout();
    rvb_cli::report::print_header(&mut out, &header)?;
    for (index, record) in records.iter().enumerate().take(6) {
        rvb_cli::report::print_record(&mut out, index, record)?;
    }
    Ok(())
}
