/// Colored terminal summaries of exports and RVB1 files
use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use rvb_core::{ExportSummary, Header, VertexRecord};
use std::io::Write;
use std::path::Path;

pub fn print_summary<W: Write>(
    w: &mut W,
    summary: &ExportSummary,
    path: &Path,
) -> std::io::Result<()> {
    queue!(
        w,
        SetForegroundColor(Color::Green),
        Print("exported "),
        ResetColor,
        Print(format!(
            "{:?}: {} triangles, {} vertices -> {}\n",
            summary.object,
            summary.triangle_count,
            summary.vertex_count,
            path.display()
        ))
    )?;
    w.flush()
}

pub fn print_header<W: Write>(w: &mut W, header: &Header) -> std::io::Result<()> {
    let attributes: Vec<String> = header
        .attributes
        .iter()
        .map(|a| format!("{:?}({:#04x})", a, a.code()))
        .collect();
    queue!(
        w,
        SetForegroundColor(Color::Yellow),
        Print(format!("RVB1 version {}", header.version)),
        ResetColor,
        Print(format!(
            " | {} vertices | {} floats/vertex | {}\n",
            header.vertex_count,
            header.floats_per_record(),
            attributes.join(" ")
        ))
    )?;
    w.flush()
}

pub fn print_record<W: Write>(
    w: &mut W,
    index: usize,
    record: &VertexRecord,
) -> std::io::Result<()> {
    let p = record.position;
    let n = record.normal;
    let c = record.color;
    queue!(
        w,
        SetForegroundColor(Color::DarkGrey),
        Print(format!("{index:>6} ")),
        ResetColor,
        Print(format!(
            "pos ({:.4}, {:.4}, {:.4}) normal ({:.4}, {:.4}, {:.4}) uv ({:.4}, {:.4}) color ({}, {}, {})\n",
            p.x, p.y, p.z, n.x, n.y, n.z, record.uv.x, record.uv.y, c[0], c[1], c[2]
        ))
    )
}
