//! Volatility surface on a regular (time × strike) grid
//!
//! Observed quotes are scattered in (months, strike) space. They are
//! triangulated (Delaunay) and linearly interpolated onto a fixed grid so the
//! renderer gets a dense matrix. Cells outside the convex hull of the observed
//! points are NaN; nothing is extrapolated.

use crate::error::{OptivizError, Result};
use crate::models::option::OptionQuotes;
use crate::utils::polars_utils::{dataframe_to_quotes, months_range};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use spade::{DelaunayTriangulation, FloatTriangulation, HasPosition, Point2, Triangulation};
use tracing::{debug, info};

/// Lower bound of the strike axis
pub const STRIKE_MIN: f64 = 450.0;
/// Upper bound of the strike axis
pub const STRIKE_MAX: f64 = 750.0;
/// Number of strike samples
pub const STRIKE_POINTS: usize = 30;
/// Number of time samples
pub const TIME_POINTS: usize = 10;

/// Fixed strike axis: 30 evenly spaced points over [450, 750]
pub fn strike_axis() -> Array1<f64> {
    Array1::linspace(STRIKE_MIN, STRIKE_MAX, STRIKE_POINTS)
}

/// Time axis in whole months: 10 evenly spaced points over [min, max], rounded half-to-even
pub fn time_axis(min_months: i64, max_months: i64) -> Array1<f64> {
    Array1::linspace(min_months as f64, max_months as f64, TIME_POINTS).mapv(f64::round_ties_even)
}

#[derive(Debug, Clone, Copy)]
struct Site {
    position: Point2<f64>,
    value: f64,
}

impl HasPosition for Site {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// Piecewise-linear interpolant over scattered 2D samples.
pub struct ScatteredInterpolator {
    triangulation: DelaunayTriangulation<Site>,
}

impl ScatteredInterpolator {
    /// Triangulate `(x, y, value)` samples.
    ///
    /// A repeated `(x, y)` site keeps the value seen first.
    pub fn new<I>(samples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        let mut triangulation: DelaunayTriangulation<Site> = DelaunayTriangulation::new();
        let mut duplicates = 0usize;

        for (x, y, value) in samples {
            let position = Point2::new(x, y);
            if triangulation.locate_vertex(position).is_some() {
                duplicates += 1;
                continue;
            }
            triangulation
                .insert(Site { position, value })
                .map_err(|e| {
                    OptivizError::Interpolation(format!(
                        "Cannot triangulate point ({}, {}): {:?}",
                        x, y, e
                    ))
                })?;
        }

        if duplicates > 0 {
            debug!("Ignored {} duplicate sites", duplicates);
        }

        Ok(Self { triangulation })
    }

    /// Number of distinct sites
    pub fn len(&self) -> usize {
        self.triangulation.num_vertices()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear interpolation at `(x, y)`; NaN outside the convex hull
    pub fn interpolate(&self, x: f64, y: f64) -> f64 {
        if !(x.is_finite() && y.is_finite()) {
            return f64::NAN;
        }
        self.triangulation
            .barycentric()
            .interpolate(|v| v.data().value, Point2::new(x, y))
            .unwrap_or(f64::NAN)
    }
}

impl std::fmt::Debug for ScatteredInterpolator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScatteredInterpolator")
            .field("sites", &self.len())
            .field("triangles", &self.triangulation.num_inner_faces())
            .finish()
    }
}

/// Interpolated implied volatility surface.
///
/// All grids are `(STRIKE_POINTS, TIME_POINTS)`: row `i` is strike
/// `strike_axis[i]`, column `j` is time `time_axis[j]`.
#[derive(Debug)]
pub struct VolatilitySurface {
    /// Underlying symbol
    pub symbol: String,
    /// Time samples in months
    pub time_axis: Array1<f64>,
    /// Strike samples
    pub strike_axis: Array1<f64>,
    /// Time coordinate of every grid cell
    pub time_grid: Array2<f64>,
    /// Strike coordinate of every grid cell
    pub strike_grid: Array2<f64>,
    /// Implied volatility in percent; NaN where unsupported
    pub volatilities: Array2<f64>,
    /// Smallest observed months-to-expiration
    pub min_months: i64,
    /// Largest observed months-to-expiration
    pub max_months: i64,
    interpolator: ScatteredInterpolator,
}

impl VolatilitySurface {
    /// Build the surface from the quote table
    pub fn from_dataframe(symbol: &str, df: &DataFrame) -> Result<Self> {
        let (min_months, max_months) = months_range(df)?;
        let quotes = dataframe_to_quotes(df)?;
        Self::build(symbol, &quotes, min_months, max_months)
    }

    /// Build the surface straight from collected quotes
    pub fn from_quotes(symbol: &str, quotes: &OptionQuotes) -> Result<Self> {
        let min_months = quotes.months().iter().copied().min();
        let max_months = quotes.months().iter().copied().max();
        match (min_months, max_months) {
            (Some(lo), Some(hi)) => Self::build(symbol, quotes, lo, hi),
            _ => Err(OptivizError::Interpolation(
                "Cannot create volatility surface from empty data".to_string(),
            )),
        }
    }

    fn build(symbol: &str, quotes: &OptionQuotes, min_months: i64, max_months: i64) -> Result<Self> {
        if quotes.is_empty() {
            return Err(OptivizError::Interpolation(
                "Cannot create volatility surface from empty data".to_string(),
            ));
        }

        let strike_axis = strike_axis();
        let time_axis = time_axis(min_months, max_months);

        let interpolator =
            ScatteredInterpolator::new(quotes.iter().map(|(s, m, v)| (m as f64, s, v)))?;

        let shape = (strike_axis.len(), time_axis.len());
        let time_grid = Array2::from_shape_fn(shape, |(_, j)| time_axis[j]);
        let strike_grid = Array2::from_shape_fn(shape, |(i, _)| strike_axis[i]);
        let volatilities = Array2::from_shape_fn(shape, |(i, j)| {
            interpolator.interpolate(time_axis[j], strike_axis[i])
        });

        let surface = Self {
            symbol: symbol.to_string(),
            time_axis,
            strike_axis,
            time_grid,
            strike_grid,
            volatilities,
            min_months,
            max_months,
            interpolator,
        };

        info!(
            "Interpolated {} quotes ({} distinct sites) onto a {}x{} grid, {} cells supported",
            quotes.len(),
            surface.interpolator.len(),
            shape.0,
            shape.1,
            surface.supported_cells()
        );

        Ok(surface)
    }

    /// Implied volatility (%) at an arbitrary point; NaN outside the observed hull
    pub fn interpolate(&self, months: f64, strike: f64) -> f64 {
        self.interpolator.interpolate(months, strike)
    }

    /// Number of grid cells with a finite volatility
    pub fn supported_cells(&self) -> usize {
        self.volatilities.iter().filter(|v| v.is_finite()).count()
    }

    /// Min and max finite volatility on the grid
    pub fn volatility_range(&self) -> Option<(f64, f64)> {
        self.volatilities
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Grid values with NaN mapped to `None`, one inner vector per strike row
    pub fn volatility_rows(&self) -> Vec<Vec<Option<f64>>> {
        self.volatilities
            .outer_iter()
            .map(|row| row.iter().map(|&v| v.is_finite().then_some(v)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plane(months: f64, strike: f64) -> f64 {
        10.0 + 2.0 * months + 0.03 * strike
    }

    fn planar_quotes() -> OptionQuotes {
        let mut quotes = OptionQuotes::new();
        for months in [1, 4, 7] {
            for strike in [400.0, 500.0, 600.0, 700.0, 800.0] {
                quotes.push(strike, months, plane(months as f64, strike));
            }
        }
        quotes
    }

    #[test]
    fn strike_axis_is_fixed() {
        let axis = strike_axis();
        assert_eq!(axis.len(), 30);
        assert_relative_eq!(axis[0], 450.0);
        assert_relative_eq!(axis[29], 750.0);
        let step = (750.0 - 450.0) / 29.0;
        for w in axis.windows(2) {
            assert_relative_eq!(w[1] - w[0], step, epsilon = 1e-9);
        }
    }

    #[test]
    fn time_axis_is_rounded_half_to_even() {
        let axis = time_axis(0, 2);
        assert_eq!(axis.to_vec(), vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);

        let axis = time_axis(1, 10);
        assert_eq!(axis.to_vec(), (1..=10).map(|m| m as f64).collect::<Vec<_>>());

        let axis = time_axis(3, 3);
        assert_eq!(axis.len(), 10);
        assert!(axis.iter().all(|&m| m == 3.0));
    }

    #[test]
    fn reproduces_planar_field_inside_hull() {
        let quotes = planar_quotes();
        let interp =
            ScatteredInterpolator::new(quotes.iter().map(|(s, m, v)| (m as f64, s, v))).unwrap();

        for &(m, s) in &[(1.0, 450.0), (2.5, 555.0), (6.9, 799.0), (4.0, 600.0)] {
            assert_relative_eq!(interp.interpolate(m, s), plane(m, s), epsilon = 1e-9);
        }
    }

    #[test]
    fn nan_outside_hull() {
        let quotes = planar_quotes();
        let interp =
            ScatteredInterpolator::new(quotes.iter().map(|(s, m, v)| (m as f64, s, v))).unwrap();

        assert!(interp.interpolate(0.0, 500.0).is_nan());
        assert!(interp.interpolate(8.0, 500.0).is_nan());
        assert!(interp.interpolate(4.0, 350.0).is_nan());
        assert!(interp.interpolate(f64::NAN, 500.0).is_nan());
    }

    #[test]
    fn collinear_points_interpolate_along_the_segment() {
        let mut quotes = OptionQuotes::new();
        quotes.push(400.0, 2, 20.0);
        quotes.push(600.0, 2, 30.0);
        quotes.push(800.0, 2, 50.0);

        let surface = VolatilitySurface::from_quotes("SPY", &quotes).unwrap();

        assert_relative_eq!(surface.interpolate(2.0, 500.0), 25.0, epsilon = 1e-9);
        assert_relative_eq!(surface.interpolate(2.0, 700.0), 40.0, epsilon = 1e-9);
        assert!(surface.interpolate(2.5, 500.0).is_nan());
        // every grid column sits on the segment
        assert_eq!(surface.supported_cells(), 30 * 10);
    }

    #[test]
    fn duplicate_site_keeps_first_value() {
        let interp = ScatteredInterpolator::new(vec![
            (1.0, 500.0, 20.0),
            (1.0, 500.0, 90.0),
            (3.0, 500.0, 40.0),
            (1.0, 600.0, 20.0),
        ])
        .unwrap();

        assert_eq!(interp.len(), 3);
        assert_relative_eq!(interp.interpolate(1.0, 500.0), 20.0);
    }

    #[test]
    fn surface_grid_shape_and_coordinates() {
        let quotes = planar_quotes();
        let surface = VolatilitySurface::from_quotes("QQQ", &quotes).unwrap();

        assert_eq!(surface.volatilities.dim(), (30, 10));
        assert_eq!(surface.time_grid.dim(), (30, 10));
        assert_eq!(surface.strike_grid.dim(), (30, 10));
        assert_eq!((surface.min_months, surface.max_months), (1, 7));

        assert_relative_eq!(surface.time_grid[[5, 0]], 1.0);
        assert_relative_eq!(surface.time_grid[[5, 9]], 7.0);
        assert_relative_eq!(surface.strike_grid[[0, 3]], 450.0);
        assert_relative_eq!(surface.strike_grid[[29, 3]], 750.0);

        // the hull covers the whole grid
        assert_eq!(surface.supported_cells(), 300);
        for ((i, j), &v) in surface.volatilities.indexed_iter() {
            let expected = plane(surface.time_axis[j], surface.strike_axis[i]);
            assert_relative_eq!(v, expected, epsilon = 1e-9);
        }

        let (lo, hi) = surface.volatility_range().unwrap();
        assert_relative_eq!(lo, plane(1.0, 450.0), epsilon = 1e-9);
        assert_relative_eq!(hi, plane(7.0, 750.0), epsilon = 1e-9);
    }

    #[test]
    fn rows_map_nan_to_none() {
        let mut quotes = OptionQuotes::new();
        quotes.push(500.0, 1, 20.0);
        quotes.push(600.0, 1, 30.0);
        quotes.push(500.0, 3, 25.0);

        let surface = VolatilitySurface::from_quotes("IWM", &quotes).unwrap();
        let rows = surface.volatility_rows();

        assert_eq!(rows.len(), 30);
        assert!(rows.iter().all(|r| r.len() == 10));
        // strike 450 lies below every observed strike
        assert!(rows[0].iter().all(Option::is_none));
        assert!(surface.supported_cells() < 300);
    }

    #[test]
    fn empty_quotes_are_rejected() {
        let err = VolatilitySurface::from_quotes("SPY", &OptionQuotes::new()).unwrap_err();
        assert!(matches!(err, OptivizError::Interpolation(_)));
    }
}
