use crate::config::RenderConfig;
use crate::error::{OptivizError, Result};
use crate::models::volatility::{VolatilitySurface, STRIKE_MAX, STRIKE_MIN, STRIKE_POINTS};
use crate::models::OptionQuotes;
use crate::utils::polars_utils::{months_range, quotes_to_dataframe};
use plotly::common::{ColorScale, ColorScaleElement, Title};
use plotly::contour::Contours;
use plotly::layout::{AspectRatio, Axis, LayoutScene};
use plotly::{Contour, Layout, Plot, Surface};
use plotters::backend::BitMapBackend;
use plotters::prelude::*;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Volatility color scale: position in [0, 1], plotly color name, RGB
pub const VOLATILITY_COLOR_STOPS: [(f64, &str, (u8, u8, u8)); 5] = [
    (0.0, "blue", (0, 0, 255)),
    (0.25, "green", (0, 128, 0)),
    (0.5, "yellow", (255, 255, 0)),
    (0.75, "orange", (255, 165, 0)),
    (1.0, "red", (255, 0, 0)),
];

const STRIKE_TICK_STEP: usize = 50;
const MONTH_TICK_STEP: usize = 3;

/// Color for a normalized position on the volatility scale
pub fn volatility_color(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    for pair in VOLATILITY_COLOR_STOPS.windows(2) {
        let (p0, _, c0) = pair[0];
        let (p1, _, c1) = pair[1];
        if t <= p1 {
            let s = (t - p0) / (p1 - p0);
            let lerp = |a: u8, b: u8| (a as f64 + s * (b as f64 - a as f64)).round() as u8;
            return RGBColor(lerp(c0.0, c1.0), lerp(c0.1, c1.1), lerp(c0.2, c1.2));
        }
    }
    let (_, _, last) = VOLATILITY_COLOR_STOPS[VOLATILITY_COLOR_STOPS.len() - 1];
    RGBColor(last.0, last.1, last.2)
}

fn plotly_color_scale() -> ColorScale {
    ColorScale::Vector(
        VOLATILITY_COLOR_STOPS
            .iter()
            .map(|&(pos, name, _)| ColorScaleElement(pos, name.to_string()))
            .collect(),
    )
}

/// Time axis ticks: every 3 months from the first observed month
pub fn month_ticks(min_months: i64, max_months: i64) -> Vec<f64> {
    (min_months..=max_months)
        .step_by(MONTH_TICK_STEP)
        .map(|m| m as f64)
        .collect()
}

/// Strike axis ticks: every $50 across the fixed range
pub fn strike_ticks() -> Vec<f64> {
    (STRIKE_MIN as usize..=STRIKE_MAX as usize)
        .step_by(STRIKE_TICK_STEP)
        .map(|s| s as f64)
        .collect()
}

/// 3D surface with a labeled contour overlay
pub fn surface_to_plot(surface: &VolatilitySurface) -> Plot {
    let x: Vec<Vec<f64>> = surface.time_grid.outer_iter().map(|r| r.to_vec()).collect();
    let y: Vec<Vec<f64>> = surface.strike_grid.outer_iter().map(|r| r.to_vec()).collect();
    let z = surface.volatility_rows();

    let surface_trace = Surface::new(z.clone())
        .x(x.clone())
        .y(y.clone())
        .color_scale(plotly_color_scale())
        .show_scale(false)
        .opacity(0.8)
        .name("Implied Volatility");

    let contour_trace = Contour::new(x, y, z)
        .contours(Contours::new().show_labels(true))
        .show_scale(false);

    let scene = LayoutScene::new()
        .x_axis(
            Axis::new()
                .title(Title::with_text("Time to Expiration (months)"))
                .tick_values(month_ticks(surface.min_months, surface.max_months))
                .tick_format(".0f")
                .show_tick_labels(true),
        )
        .y_axis(
            Axis::new()
                .title(Title::with_text("Strike Price ($)"))
                .range(vec![STRIKE_MIN, STRIKE_MAX])
                .tick_values(strike_ticks())
                .tick_format(".0f")
                .show_tick_labels(true),
        )
        .z_axis(
            Axis::new()
                .title(Title::with_text("Implied Volatility (%)"))
                .n_ticks(10)
                .range(vec![0.0, 100.0])
                .tick_format(".0f")
                .show_tick_labels(true),
        )
        .aspect_ratio(AspectRatio::new().x(1.0).y(1.0).z(0.5));

    let layout = Layout::new()
        .title(Title::with_text(format!(
            "Implied Volatility Surface for {} Options",
            surface.symbol
        )))
        .scene(scene)
        .auto_size(true);

    let mut plot = Plot::new();
    plot.add_trace(surface_trace);
    plot.add_trace(contour_trace);
    plot.set_layout(layout);
    plot
}

/// Write the interactive figure to a standalone HTML file
pub fn write_plot_html<P: AsRef<Path>>(plot: &Plot, output_path: P) -> Result<()> {
    std::fs::write(output_path.as_ref(), plot.to_html())?;
    Ok(())
}

/// Static heat map of the interpolated grid: time across, strike up
pub fn plot_surface_snapshot<P: AsRef<Path>>(surface: &VolatilitySurface, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();

    let n_times = surface.time_axis.len();
    let strike_step = (STRIKE_MAX - STRIKE_MIN) / (STRIKE_POINTS - 1) as f64;
    let (vol_min, vol_max) = surface.volatility_range().unwrap_or((0.0, 100.0));
    let vol_span = vol_max - vol_min;

    let root = BitMapBackend::new(output_path, (1000, 800)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| OptivizError::Plot(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Implied Volatility Surface for {} Options", surface.symbol),
            ("sans-serif", 30).into_font(),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            0f64..n_times as f64,
            (STRIKE_MIN - 0.5 * strike_step)..(STRIKE_MAX + 0.5 * strike_step),
        )
        .map_err(|e| OptivizError::Plot(e.to_string()))?;

    let time_axis = &surface.time_axis;
    let time_label = |x: &f64| {
        time_axis
            .get(x.floor().max(0.0) as usize)
            .map(|t| format!("{:.0}", t))
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n_times)
        .x_label_formatter(&time_label)
        .x_desc("Time to Expiration (months)")
        .y_desc("Strike Price ($)")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(|e| OptivizError::Plot(e.to_string()))?;

    let cells = surface
        .volatilities
        .indexed_iter()
        .filter(|(_, v)| v.is_finite())
        .map(|((i, j), &v)| {
            let t = if vol_span > 0.0 { (v - vol_min) / vol_span } else { 0.5 };
            let strike = surface.strike_axis[i];
            Rectangle::new(
                [
                    (j as f64, strike - 0.5 * strike_step),
                    (j as f64 + 1.0, strike + 0.5 * strike_step),
                ],
                volatility_color(t).filled(),
            )
        });

    chart
        .draw_series(cells)
        .map_err(|e| OptivizError::Plot(e.to_string()))?;

    root.present()
        .map_err(|e| OptivizError::Plot(e.to_string()))?;

    Ok(())
}

/// Interpolate the quotes and display the resulting surface.
///
/// Writes how far out the data goes to `out`, then shows and/or saves the figure per `render`.
pub fn render_volatility_surface<W: Write>(
    symbol: &str,
    quotes: &OptionQuotes,
    render: &RenderConfig,
    out: &mut W,
) -> Result<VolatilitySurface> {
    let df = quotes_to_dataframe(quotes)?;

    let (_, max_months) = months_range(&df)?;
    let max_weeks = max_months * 4;
    writeln!(
        out,
        "The chart goes out to approximately {:.1} months ({:.1} weeks) in the future.",
        max_months as f64, max_weeks as f64
    )?;

    let surface = VolatilitySurface::from_dataframe(symbol, &df)?;
    let plot = surface_to_plot(&surface);

    if let Some(path) = &render.html_output {
        write_plot_html(&plot, path)?;
        info!("Interactive plot saved to {:?}", path);
    }

    if let Some(path) = &render.snapshot_output {
        plot_surface_snapshot(&surface, path)?;
        info!("Surface snapshot saved to {:?}", path);
    }

    if render.show_plot {
        plot.show();
    }

    Ok(surface)
}
