//! # 能带图生成
//!
//! 使用 `plotters` 绘制 X → Γ → Y → C → X 路径上的 E+ 与 E−。
//!
//! ## 功能
//! - 两条能带分色绘制
//! - 高对称点处竖直分隔线与标签
//! - 能带边能量水平线
//!
//! ## 依赖关系
//! - 被 `commands/band.rs` 调用
//! - 使用 `band/path.rs` 的 BandPath
//! - 使用 `plotters` 渲染 PNG

use crate::band::path::BandPath;
use crate::error::{OscreenError, Result};

use plotters::prelude::*;
use std::path::Path;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 650;

/// 生成能带图 PNG
pub fn generate_band_plot(
    path: &BandPath,
    title: &str,
    edge_energy: Option<f64>,
    output_path: &Path,
) -> Result<()> {
    let root = BitMapBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
    draw_band_chart(&root, path, title, edge_energy)?;
    root.present()
        .map_err(|e| OscreenError::Other(e.to_string()))?;
    Ok(())
}

fn draw_band_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    path: &BandPath,
    title: &str,
    edge_energy: Option<f64>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| OscreenError::Other(format!("{:?}", e)))?;

    let x_max = path.total_length().max(f64::EPSILON);
    let (e_min, e_max) = path.energy_range();
    let pad = ((e_max - e_min) * 0.08).max(1.0);
    let (y_min, y_max) = (e_min - pad, e_max + pad);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 26).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)
        .map_err(|e| OscreenError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_desc("Energy (meV)")
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| OscreenError::Other(format!("{:?}", e)))?;

    // 高对称点
    let grey = RGBColor(150, 150, 150);
    for (x, symbol) in &path.ticks {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(*x, y_min), (*x, y_max)],
                grey.stroke_width(1),
            )))
            .map_err(|e| OscreenError::Other(format!("{:?}", e)))?;

        chart
            .draw_series(std::iter::once(Text::new(
                symbol.to_string(),
                (*x, y_min),
                ("sans-serif", 18).into_font().color(&BLACK),
            )))
            .map_err(|e| OscreenError::Other(format!("{:?}", e)))?;
    }

    let plus_color = RGBColor(204, 51, 51);
    let minus_color = RGBColor(0, 102, 204);

    chart
        .draw_series(LineSeries::new(
            path.samples.iter().map(|s| (s.x, s.e_plus)),
            plus_color.stroke_width(2),
        ))
        .map_err(|e| OscreenError::Other(format!("{:?}", e)))?
        .label("E+")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], plus_color));

    chart
        .draw_series(LineSeries::new(
            path.samples.iter().map(|s| (s.x, s.e_minus)),
            minus_color.stroke_width(2),
        ))
        .map_err(|e| OscreenError::Other(format!("{:?}", e)))?
        .label("E-")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], minus_color));

    if let Some(edge) = edge_energy {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, edge), (x_max, edge)],
                BLACK.stroke_width(1),
            )))
            .map_err(|e| OscreenError::Other(format!("{:?}", e)))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| OscreenError::Other(format!("{:?}", e)))?;

    Ok(())
}
