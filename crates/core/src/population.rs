//! Population tables: region hierarchy, gender/age columns, and selection.
//!
//! Wraps a [`Table`] from the resident-registration statistics export
//! (`행정구역`, `2025년06월_남_0세`, ..., `2025년06월_여_100세 이상`) with
//! parsed region parts per row and an index of the age/gender columns.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::region::{parse_region, RegionParts};
use crate::table::Table;

/// Region columns, in lookup order.
pub const REGION_COLUMNS: &[&str] = &["행정구역", "법정구역"];

/// Age assigned to gender columns without an explicit `N세` (`100세 이상`
/// is matched explicitly; this covers stray totals).
pub const OPEN_ENDED_AGE: u32 = 100;

const MALE_MARKER: &str = "남_";
const FEMALE_MARKER: &str = "여_";
const AGE_MARKER: &str = "세";

static AGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)세").expect("valid regex"));

// ---------------------------------------------------------------------------
// Age bands
// ---------------------------------------------------------------------------

/// A ten-year age band, or the open-ended `100세 이상` band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeBand {
    pub label: String,
    pub min_age: u32,
    pub max_age: u32,
}

impl AgeBand {
    /// `0~9세`, `10~19세`, ..., `90~99세`, `100세 이상`.
    pub fn all() -> Vec<AgeBand> {
        let mut bands: Vec<AgeBand> = (0..100)
            .step_by(10)
            .map(|start| AgeBand {
                label: format!("{start}~{}세", start + 9),
                min_age: start,
                max_age: start + 9,
            })
            .collect();
        bands.push(AgeBand {
            label: "100세 이상".to_string(),
            min_age: 100,
            max_age: 100,
        });
        bands
    }

    /// Resolve band labels; an empty list selects every band.
    pub fn resolve(labels: &[String]) -> Result<Vec<AgeBand>, CoreError> {
        let all = Self::all();
        if labels.is_empty() {
            return Ok(all);
        }
        labels
            .iter()
            .map(|label| {
                all.iter()
                    .find(|b| &b.label == label)
                    .cloned()
                    .ok_or_else(|| CoreError::Validation(format!("Unknown age band '{label}'")))
            })
            .collect()
    }

    pub fn contains(&self, age: u32) -> bool {
        (self.min_age..=self.max_age).contains(&age)
    }
}

// ---------------------------------------------------------------------------
// Gender columns
// ---------------------------------------------------------------------------

/// A male column paired with its female counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeColumn {
    pub age: u32,
    /// Category label, the header's last `_` segment (`"0세"`).
    pub label: String,
    pub male: usize,
    pub female: usize,
}

fn extract_age(header: &str) -> u32 {
    AGE_RE
        .captures(header)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(OPEN_ENDED_AGE)
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Cascading region selection.
///
/// A row is selected when its province is in `provinces`, its city is in
/// `cities`, and either `districts` is empty or its district is listed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionSelection {
    #[serde(default)]
    pub provinces: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub districts: Vec<String>,
}

impl RegionSelection {
    pub fn matches(&self, parts: &RegionParts) -> bool {
        self.provinces.contains(&parts.province)
            && self.cities.contains(&parts.city)
            && (self.districts.is_empty() || self.districts.contains(&parts.district))
    }
}

/// Cascading option lists for a selection form.
#[derive(Debug, Clone, Serialize)]
pub struct RegionOptions {
    pub provinces: Vec<String>,
    pub cities: Vec<String>,
    pub districts: Vec<String>,
}

// ---------------------------------------------------------------------------
// Population table
// ---------------------------------------------------------------------------

/// A population table with parsed regions and indexed age columns.
#[derive(Debug, Clone)]
pub struct PopulationTable {
    table: Table,
    region_column: usize,
    regions: Vec<RegionParts>,
    age_columns: Vec<AgeColumn>,
}

impl PopulationTable {
    pub fn from_table(table: Table) -> Result<Self, CoreError> {
        let region_column = REGION_COLUMNS
            .iter()
            .find_map(|name| table.column_index(name))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "No region column found; expected one of: {}",
                    REGION_COLUMNS.join(", ")
                ))
            })?;

        let regions = (0..table.len())
            .map(|row| parse_region(table.cell(row, region_column)))
            .collect();

        let age_columns = index_age_columns(&table);

        Ok(Self {
            table,
            region_column,
            regions,
            age_columns,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn region_column(&self) -> usize {
        self.region_column
    }

    pub fn region(&self, row: usize) -> &RegionParts {
        &self.regions[row]
    }

    pub fn age_columns(&self) -> &[AgeColumn] {
        &self.age_columns
    }

    /// Sorted distinct non-empty provinces.
    pub fn provinces(&self) -> Vec<String> {
        distinct(self.regions.iter().map(|r| &r.province))
    }

    /// Sorted distinct cities within the given provinces.
    pub fn cities(&self, provinces: &[String]) -> Vec<String> {
        distinct(
            self.regions
                .iter()
                .filter(|r| provinces.contains(&r.province))
                .map(|r| &r.city),
        )
    }

    /// Sorted distinct districts within the given cities.
    pub fn districts(&self, cities: &[String]) -> Vec<String> {
        distinct(
            self.regions
                .iter()
                .filter(|r| cities.contains(&r.city))
                .map(|r| &r.district),
        )
    }

    /// Option lists for a cascading form.
    pub fn options(&self, provinces: &[String], cities: &[String]) -> RegionOptions {
        RegionOptions {
            provinces: self.provinces(),
            cities: self.cities(provinces),
            districts: self.districts(cities),
        }
    }

    /// Rows matching the selection, in table order.
    ///
    /// An empty result is [`CoreError::EmptySelection`].
    pub fn select(&self, selection: &RegionSelection) -> Result<Vec<usize>, CoreError> {
        let rows: Vec<usize> = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, parts)| selection.matches(parts))
            .map(|(row, _)| row)
            .collect();
        if rows.is_empty() {
            return Err(CoreError::EmptySelection(
                "No data matches the selected region combination".into(),
            ));
        }
        Ok(rows)
    }

    /// Age columns falling into any of `bands`, in band order then column
    /// order.
    pub fn columns_for_bands(&self, bands: &[AgeBand]) -> Vec<&AgeColumn> {
        bands
            .iter()
            .flat_map(|band| self.age_columns.iter().filter(move |c| band.contains(c.age)))
            .collect()
    }
}

fn index_age_columns(table: &Table) -> Vec<AgeColumn> {
    let headers = table.headers();
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.contains(MALE_MARKER) && h.contains(AGE_MARKER))
        .filter_map(|(male, header)| {
            let female_header = header.replacen(MALE_MARKER, FEMALE_MARKER, 1);
            let female = headers.iter().position(|h| *h == female_header)?;
            Some(AgeColumn {
                age: extract_age(header),
                label: header.rsplit('_').next().unwrap_or(header).to_string(),
                male,
                female,
            })
        })
        .collect()
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{parse_csv, IngestOptions};
    use assert_matches::assert_matches;

    fn sample() -> PopulationTable {
        let csv = "\
행정구역,2025년06월_계_총인구수,2025년06월_남_0세,2025년06월_남_1세,2025년06월_남_100세 이상,2025년06월_여_0세,2025년06월_여_1세,2025년06월_여_100세 이상
서울특별시  (1100000000),\"9,411,035\",\"100\",\"110\",\"5\",\"95\",\"105\",\"20\"
서울특별시 종로구 (1111000000),\"139,417\",\"10\",\"11\",\"1\",\"9\",\"12\",\"2\"
서울특별시 종로구 청운효자동(1111051500),\"11,000\",\"1\",\"2\",\"0\",\"2\",\"1\",\"0\"
경기도 수원시 (4111000000),\"1,190,000\",\"500\",\"\",\"3\",\"480\",\"470\",\"9\"
";
        let table = parse_csv(csv, &IngestOptions::default()).unwrap();
        PopulationTable::from_table(table).unwrap()
    }

    #[test]
    fn indexes_paired_age_columns() {
        let pop = sample();
        let ages: Vec<(u32, &str)> = pop
            .age_columns()
            .iter()
            .map(|c| (c.age, c.label.as_str()))
            .collect();
        assert_eq!(ages, vec![(0, "0세"), (1, "1세"), (100, "100세 이상")]);
    }

    #[test]
    fn cascading_options() {
        let pop = sample();
        assert_eq!(pop.provinces(), vec!["경기도", "서울특별시"]);
        assert_eq!(pop.cities(&["서울특별시".to_string()]), vec!["종로구"]);
        assert_eq!(pop.districts(&["종로구".to_string()]), vec!["청운효자동"]);
    }

    #[test]
    fn selection_requires_province_and_city() {
        let pop = sample();
        let selection = RegionSelection {
            provinces: vec!["서울특별시".into()],
            cities: vec!["종로구".into()],
            districts: vec![],
        };
        assert_eq!(pop.select(&selection).unwrap(), vec![1, 2]);

        let narrowed = RegionSelection {
            districts: vec!["청운효자동".into()],
            ..selection
        };
        assert_eq!(pop.select(&narrowed).unwrap(), vec![2]);
    }

    #[test]
    fn empty_selection_is_reported() {
        let pop = sample();
        let selection = RegionSelection {
            provinces: vec!["부산광역시".into()],
            cities: vec!["해운대구".into()],
            districts: vec![],
        };
        assert_matches!(pop.select(&selection), Err(CoreError::EmptySelection(_)));
        assert_matches!(
            pop.select(&RegionSelection::default()),
            Err(CoreError::EmptySelection(_))
        );
    }

    #[test]
    fn bands_pick_columns() {
        let pop = sample();
        let first = AgeBand::resolve(&["0~9세".to_string()]).unwrap();
        let cols = pop.columns_for_bands(&first);
        assert_eq!(cols.len(), 2);

        let oldest = AgeBand::resolve(&["100세 이상".to_string()]).unwrap();
        assert_eq!(pop.columns_for_bands(&oldest)[0].label, "100세 이상");
    }

    #[test]
    fn band_catalogue() {
        let bands = AgeBand::all();
        assert_eq!(bands.len(), 11);
        assert_eq!(bands[0].label, "0~9세");
        assert_eq!(bands[9].label, "90~99세");
        assert!(AgeBand::resolve(&["200세".to_string()]).is_err());
        assert_eq!(AgeBand::resolve(&[]).unwrap().len(), 11);
    }

    #[test]
    fn missing_region_column() {
        let table = parse_csv("지역,값\n서울,1\n", &IngestOptions::default()).unwrap();
        assert_matches!(
            PopulationTable::from_table(table),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn legal_district_column_is_accepted() {
        let table = parse_csv("법정구역,값\n서울특별시 종로구 청운동,1\n", &IngestOptions::default())
            .unwrap();
        let pop = PopulationTable::from_table(table).unwrap();
        assert_eq!(pop.region(0).district, "청운동");
    }
}
