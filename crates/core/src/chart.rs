//! Chart specification builders.
//!
//! Each builder turns a table plus a selection into a [`ChartSpec`]: a
//! serializable figure description (trace/layout field names follow the
//! Plotly JSON schema) that the front-end draws as-is. Missing values are
//! `None` and serialize as `null`, which plots as a gap.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::numeric::{parse_count, parse_value};
use crate::population::{AgeBand, PopulationTable, RegionSelection, REGION_COLUMNS};
use crate::region::{clean_label, parse_region};
use crate::table::Table;
use crate::types::is_all_sentinel;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Base colours cycled per region in the pyramid chart.
pub const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Default number of regions shown by the ranking charts.
pub const DEFAULT_TOP_N: usize = 30;
/// Smallest accepted `top_n`.
pub const MIN_TOP_N: usize = 10;
/// Largest accepted `top_n`.
pub const MAX_TOP_N: usize = 100;

/// Header suffix of the monthly population-delta column.
pub const DELTA_COLUMN_SUFFIX: &str = "인구증감_계";
/// Header suffix of the male average-age column.
pub const MALE_AVERAGE_AGE_SUFFIX: &str = "남자 평균연령";
/// Header suffix of the female average-age column.
pub const FEMALE_AVERAGE_AGE_SUFFIX: &str = "여자 평균연령";
/// Default station column of the weather statistics export.
pub const DEFAULT_STATION_COLUMN: &str = "지점";

/// Label columns for ranking charts, in lookup order.
const LABEL_COLUMNS: &[&str] = &["법정구역", "행정구역"];

// ---------------------------------------------------------------------------
// Chart specification types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pyramid,
    DeltaBar,
    Comparison,
    TimeSeries,
    AverageAge,
}

/// One axis worth of data: category labels or numeric values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Series {
    Categories(Vec<String>),
    Values(Vec<Option<f64>>),
}

impl Series {
    pub fn values(&self) -> Option<&[Option<f64>]> {
        match self {
            Series::Values(v) => Some(v),
            Series::Categories(_) => None,
        }
    }

    pub fn categories(&self) -> Option<&[String]> {
        match self {
            Series::Categories(c) => Some(c),
            Series::Values(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceType {
    Bar,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Single(String),
    /// Per-point values mapped through `colorscale`.
    PerPoint(Vec<Option<f64>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub color: ColorSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmid: Option<f64>,
}

impl MarkerStyle {
    fn solid(color: impl Into<String>) -> Self {
        Self {
            color: ColorSpec::Single(color.into()),
            colorscale: None,
            cmid: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub trace_type: TraceType,
    pub name: String,
    pub x: Series,
    pub y: Series,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legendgroup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<&'static str>,
}

impl Trace {
    fn bar(name: impl Into<String>, x: Series, y: Series) -> Self {
        Self {
            trace_type: TraceType::Bar,
            name: name.into(),
            x,
            y,
            orientation: None,
            mode: None,
            marker: None,
            legendgroup: None,
            yaxis: None,
        }
    }

    fn line(name: impl Into<String>, x: Series, y: Series) -> Self {
        Self {
            trace_type: TraceType::Scatter,
            mode: Some("lines+markers"),
            ..Self::bar(name, x, y)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickformat: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickangle: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorange: Option<&'static str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<&'static str>,
}

impl Axis {
    fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis2: Option<Axis>,
    pub height: u32,
}

/// A complete figure description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub traces: Vec<Trace>,
    pub layout: Layout,
}

// ---------------------------------------------------------------------------
// (a) Population pyramid
// ---------------------------------------------------------------------------

/// Horizontal population pyramid per selected region.
///
/// Male counts are negated so they plot left of centre. Only the first row
/// of each distinct region label is used.
pub fn pyramid(
    population: &PopulationTable,
    selection: &RegionSelection,
    bands: &[AgeBand],
) -> Result<ChartSpec, CoreError> {
    let columns = population.columns_for_bands(bands);
    if columns.is_empty() {
        return Err(CoreError::EmptySelection(
            "No age columns match the selected age bands".into(),
        ));
    }
    let rows = population.select(selection)?;
    let table = population.table();
    let labels: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();

    let mut seen = Vec::new();
    let mut traces = Vec::new();
    for row in rows {
        let raw = table.cell(row, population.region_column());
        let region = population.region(row).display_label(raw);
        if seen.contains(&region) {
            continue;
        }

        let base = PALETTE[seen.len() % PALETTE.len()];
        let light = lighten(base, 0.5);

        let male: Vec<Option<f64>> = columns
            .iter()
            .map(|c| parse_count(table.cell(row, c.male)).map(|v| -(v as f64)))
            .collect();
        let female: Vec<Option<f64>> = columns
            .iter()
            .map(|c| parse_count(table.cell(row, c.female)).map(|v| v as f64))
            .collect();

        traces.push(Trace {
            orientation: Some("h"),
            marker: Some(MarkerStyle::solid(base)),
            legendgroup: Some(region.clone()),
            ..Trace::bar(
                format!("{region} (남)"),
                Series::Values(male),
                Series::Categories(labels.clone()),
            )
        });
        traces.push(Trace {
            orientation: Some("h"),
            marker: Some(MarkerStyle::solid(light)),
            legendgroup: Some(region.clone()),
            ..Trace::bar(
                format!("{region} (여)"),
                Series::Values(female),
                Series::Categories(labels.clone()),
            )
        });
        seen.push(region);
    }

    Ok(ChartSpec {
        kind: ChartKind::Pyramid,
        title: "선택된 지역 인구 피라미드 비교".to_string(),
        traces,
        layout: Layout {
            barmode: Some("relative"),
            xaxis: Axis {
                tickformat: Some(",d"),
                ..Axis::titled("인구수")
            },
            yaxis: Axis {
                autorange: Some("reversed"),
                axis_type: Some("category"),
                ..Axis::titled("연령")
            },
            yaxis2: None,
            height: 1000,
        },
    })
}

/// Blend a `#rrggbb` colour toward white by `amount` (0.0..=1.0).
pub fn lighten(hex: &str, amount: f64) -> String {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 {
        return hex.to_string();
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => {
            let mix = |c: u8| (c as f64 + amount * (255.0 - c as f64)).round() as u8;
            format!("#{:02x}{:02x}{:02x}", mix(r), mix(g), mix(b))
        }
        _ => hex.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Ranking helpers shared by (b) and (c)
// ---------------------------------------------------------------------------

fn clamp_top_n(top_n: Option<usize>) -> usize {
    top_n.unwrap_or(DEFAULT_TOP_N).clamp(MIN_TOP_N, MAX_TOP_N)
}

/// Sort descending by key and keep the `top_n / 2` largest plus the
/// `top_n / 2` smallest entries.
fn rank_extremes<T>(mut items: Vec<T>, top_n: usize, key: impl Fn(&T) -> i64) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
    let half = top_n / 2;
    if items.len() <= half * 2 {
        return items;
    }
    let tail = items.split_off(items.len() - half);
    items.truncate(half);
    items.extend(tail);
    items
}

/// The requested column, else the first of `candidates` present.
fn resolve_label_column(
    table: &Table,
    requested: Option<&str>,
    candidates: &[&str],
) -> Result<usize, CoreError> {
    match requested {
        Some(name) => table.require_column(name),
        None => candidates
            .iter()
            .find_map(|name| table.column_index(name))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "No region label column found; expected one of: {}",
                    candidates.join(", ")
                ))
            }),
    }
}

// ---------------------------------------------------------------------------
// (b) Delta bar chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeltaOptions {
    /// Delta column; detected by [`DELTA_COLUMN_SUFFIX`] when absent.
    pub column: Option<String>,
    pub label_column: Option<String>,
    pub top_n: Option<usize>,
}

/// Signed population delta per region, largest gains and losses.
pub fn delta_bar(table: &Table, options: &DeltaOptions) -> Result<ChartSpec, CoreError> {
    let value_col = match options.column.as_deref() {
        Some(name) => table.require_column(name)?,
        None => table
            .find_column(|h| h.ends_with(DELTA_COLUMN_SUFFIX))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "No column ending with '{DELTA_COLUMN_SUFFIX}' found"
                ))
            })?,
    };
    let label_col = resolve_label_column(table, options.label_column.as_deref(), LABEL_COLUMNS)?;

    let entries: Vec<(String, i64)> = (0..table.len())
        .filter_map(|row| {
            let delta = parse_count(table.cell(row, value_col))?;
            Some((clean_label(table.cell(row, label_col)), delta))
        })
        .collect();
    if entries.is_empty() {
        return Err(CoreError::EmptySelection(
            "No rows carry a numeric population delta".into(),
        ));
    }

    let ranked = rank_extremes(entries, clamp_top_n(options.top_n), |(_, d)| *d);
    let labels: Vec<String> = ranked.iter().map(|(l, _)| l.clone()).collect();
    let values: Vec<Option<f64>> = ranked.iter().map(|(_, d)| Some(*d as f64)).collect();

    let trace = Trace {
        marker: Some(MarkerStyle {
            color: ColorSpec::PerPoint(values.clone()),
            colorscale: Some("RdBu".to_string()),
            cmid: Some(0.0),
        }),
        ..Trace::bar("증감", Series::Categories(labels), Series::Values(values))
    };

    Ok(ChartSpec {
        kind: ChartKind::DeltaBar,
        title: "지역별 인구 증감 (상위 및 하위)".to_string(),
        traces: vec![trace],
        layout: Layout {
            barmode: None,
            xaxis: Axis {
                tickangle: Some(-45),
                ..Axis::titled("지역")
            },
            yaxis: Axis::titled("인구 증감 수"),
            yaxis2: None,
            height: 600,
        },
    })
}

// ---------------------------------------------------------------------------
// (c) Dual-axis comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonOptions {
    pub label_column: Option<String>,
    pub previous: String,
    pub current: String,
    pub top_n: Option<usize>,
}

/// `current - previous`, clamped at the `i64` bounds.
fn change((_, previous, current): &(String, i64, i64)) -> i64 {
    current.saturating_sub(*previous)
}

/// Bars of `current - previous` with both absolute series as lines on a
/// secondary axis.
pub fn comparison(table: &Table, options: &ComparisonOptions) -> Result<ChartSpec, CoreError> {
    let prev_col = table.require_column(&options.previous)?;
    let curr_col = table.require_column(&options.current)?;
    let label_col = resolve_label_column(table, options.label_column.as_deref(), LABEL_COLUMNS)?;

    let entries: Vec<(String, i64, i64)> = (0..table.len())
        .filter_map(|row| {
            let previous = parse_count(table.cell(row, prev_col))?;
            let current = parse_count(table.cell(row, curr_col))?;
            Some((clean_label(table.cell(row, label_col)), previous, current))
        })
        .collect();
    if entries.is_empty() {
        return Err(CoreError::EmptySelection(
            "No rows carry both previous and current values".into(),
        ));
    }

    let ranked = rank_extremes(entries, clamp_top_n(options.top_n), change);
    let labels: Vec<String> = ranked.iter().map(|(l, _, _)| l.clone()).collect();
    let column = |f: fn(&(String, i64, i64)) -> i64| -> Series {
        Series::Values(ranked.iter().map(|e| Some(f(e) as f64)).collect())
    };

    let traces = vec![
        Trace {
            marker: Some(MarkerStyle::solid(PALETTE[0])),
            ..Trace::bar(
                "증감",
                Series::Categories(labels.clone()),
                column(change),
            )
        },
        Trace {
            yaxis: Some("y2"),
            ..Trace::line(
                options.previous.clone(),
                Series::Categories(labels.clone()),
                column(|(_, p, _)| *p),
            )
        },
        Trace {
            yaxis: Some("y2"),
            ..Trace::line(
                options.current.clone(),
                Series::Categories(labels),
                column(|(_, _, c)| *c),
            )
        },
    ];

    Ok(ChartSpec {
        kind: ChartKind::Comparison,
        title: format!("{} 대비 {} 비교", options.previous, options.current),
        traces,
        layout: Layout {
            barmode: None,
            xaxis: Axis {
                tickangle: Some(-45),
                ..Axis::titled("지역")
            },
            yaxis: Axis::titled("증감"),
            yaxis2: Some(Axis {
                overlaying: Some("y"),
                side: Some("right"),
                tickformat: Some(",d"),
                ..Axis::titled("인구수")
            }),
            height: 600,
        },
    })
}

// ---------------------------------------------------------------------------
// (d) Time series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSeriesOptions {
    pub station_column: Option<String>,
    #[serde(default)]
    pub stations: Vec<String>,
}

/// `true` for `yyyy.mm.dd`-style headers (exactly two dots).
pub fn is_date_header(header: &str) -> bool {
    header.matches('.').count() == 2
}

/// Distinct station names, in table order.
pub fn stations(table: &Table, station_column: Option<&str>) -> Result<Vec<String>, CoreError> {
    let col = table.require_column(station_column.unwrap_or(DEFAULT_STATION_COLUMN))?;
    let mut out: Vec<String> = Vec::new();
    for row in 0..table.len() {
        let name = table.cell(row, col).trim();
        if !name.is_empty() && !out.iter().any(|s| s == name) {
            out.push(name.to_string());
        }
    }
    Ok(out)
}

/// One line per station across the date columns of a wide-format table.
/// Cells that do not parse are skipped rather than plotted as zero.
pub fn time_series(table: &Table, options: &TimeSeriesOptions) -> Result<ChartSpec, CoreError> {
    if options.stations.is_empty() {
        return Err(CoreError::EmptySelection(
            "Select at least one station".into(),
        ));
    }
    let station_col = table.require_column(
        options
            .station_column
            .as_deref()
            .unwrap_or(DEFAULT_STATION_COLUMN),
    )?;
    let date_cols: Vec<usize> = table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| is_date_header(h))
        .map(|(i, _)| i)
        .collect();
    if date_cols.is_empty() {
        return Err(CoreError::Validation(
            "No date columns (yyyy.mm.dd) found".into(),
        ));
    }

    let mut traces = Vec::with_capacity(options.stations.len());
    for station in &options.stations {
        let row = (0..table.len())
            .find(|&r| table.cell(r, station_col).trim() == station)
            .ok_or_else(|| CoreError::not_found("Station", station))?;

        let (x, y): (Vec<String>, Vec<Option<f64>>) = date_cols
            .iter()
            .filter_map(|&c| {
                parse_value(table.cell(row, c)).map(|v| (table.headers()[c].clone(), Some(v)))
            })
            .unzip();

        traces.push(Trace::line(
            station.clone(),
            Series::Categories(x),
            Series::Values(y),
        ));
    }

    Ok(ChartSpec {
        kind: ChartKind::TimeSeries,
        title: "지점별 기상 통계 시계열 변화".to_string(),
        traces,
        layout: Layout {
            barmode: None,
            xaxis: Axis::titled("날짜"),
            yaxis: Axis::titled("값"),
            yaxis2: None,
            height: 600,
        },
    })
}

// ---------------------------------------------------------------------------
// (e) Average age
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AverageAgeOptions {
    pub province: String,
    pub city: String,
    /// `None`, empty, or the `전체`/`all` sentinel selects the whole city.
    pub district: Option<String>,
}

/// Grouped male/female average age per region within one city.
pub fn average_age(table: &Table, options: &AverageAgeOptions) -> Result<ChartSpec, CoreError> {
    let region_col = resolve_label_column(table, None, REGION_COLUMNS)?;
    let male_col = table
        .find_column(|h| h.ends_with(MALE_AVERAGE_AGE_SUFFIX))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "No column ending with '{MALE_AVERAGE_AGE_SUFFIX}' found"
            ))
        })?;
    let female_col = table
        .find_column(|h| h.ends_with(FEMALE_AVERAGE_AGE_SUFFIX))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "No column ending with '{FEMALE_AVERAGE_AGE_SUFFIX}' found"
            ))
        })?;

    let district = options
        .district
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty() && !is_all_sentinel(d));

    let rows: Vec<usize> = (0..table.len())
        .filter(|&row| {
            let parts = parse_region(table.cell(row, region_col));
            parts.province == options.province
                && parts.city == options.city
                && district.is_none_or(|d| parts.district == d)
        })
        .collect();
    if rows.is_empty() {
        return Err(CoreError::EmptySelection(
            "No data matches the selected region".into(),
        ));
    }

    let labels: Vec<String> = rows
        .iter()
        .map(|&r| clean_label(table.cell(r, region_col)))
        .collect();
    let series = |col: usize| -> Series {
        Series::Values(rows.iter().map(|&r| parse_value(table.cell(r, col))).collect())
    };

    let title = [options.province.as_str(), options.city.as_str(), district.unwrap_or("")]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(ChartSpec {
        kind: ChartKind::AverageAge,
        title: format!("{title} 평균 연령 비교"),
        traces: vec![
            Trace {
                marker: Some(MarkerStyle::solid(PALETTE[0])),
                ..Trace::bar(
                    "남자 평균연령",
                    Series::Categories(labels.clone()),
                    series(male_col),
                )
            },
            Trace {
                marker: Some(MarkerStyle::solid(PALETTE[3])),
                ..Trace::bar("여자 평균연령", Series::Categories(labels), series(female_col))
            },
        ],
        layout: Layout {
            barmode: Some("group"),
            xaxis: Axis {
                tickangle: Some(-45),
                ..Axis::titled("지역")
            },
            yaxis: Axis::titled("평균 연령 (세)"),
            yaxis2: None,
            height: 600,
        },
    })
}
