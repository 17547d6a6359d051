//! HICP sector panel: long (date, sector, geo, value) records and the two
//! pivots saved to disk.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{DateRange, ObservationSeries};

#[derive(Debug, Clone, PartialEq)]
pub struct PanelRecord {
    pub date: NaiveDate,
    pub sector: String,
    pub geo: String,
    pub value: f64,
}

/// A pivoted panel: `date | <index_label> | columns...`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable {
    pub index_label: String,
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub date: NaiveDate,
    pub index: String,
    pub cells: Vec<Option<f64>>,
}

impl PivotTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Long-format HICP records.
///
/// Pivot columns follow the declared sector/geo order; labels that were never
/// declared come after, in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HicpPanel {
    records: Vec<PanelRecord>,
    sector_order: Vec<String>,
    geo_order: Vec<String>,
    sectors: Vec<String>,
    geos: Vec<String>,
}

impl HicpPanel {
    pub fn with_order(sector_order: Vec<String>, geo_order: Vec<String>) -> Self {
        Self {
            sector_order,
            geo_order,
            ..Self::default()
        }
    }

    /// Add the present observations of one (sector, geo) series inside `range`.
    ///
    /// Missing values are dropped, so a series with nothing present adds no column.
    pub fn add_series(&mut self, sector: &str, geo: &str, series: &ObservationSeries, range: &DateRange) {
        let mut added = false;
        for obs in series.filter(range).points() {
            let Some(value) = obs.value else {
                continue;
            };
            self.records.push(PanelRecord {
                date: obs.date,
                sector: sector.to_string(),
                geo: geo.to_string(),
                value,
            });
            added = true;
        }
        if added {
            if !self.sectors.iter().any(|s| s == sector) {
                self.sectors.push(sector.to_string());
            }
            if !self.geos.iter().any(|g| g == geo) {
                self.geos.push(geo.to_string());
            }
        }
    }

    /// `date | country | <sector>...`, rows sorted by date then country.
    pub fn by_country(&self) -> PivotTable {
        let columns = ordered(&self.sector_order, &self.sectors);
        self.pivot("country", &columns, |r| (&r.geo, &r.sector))
    }

    /// `date | sector | <geo>...`, rows sorted by date then sector.
    pub fn by_sector(&self) -> PivotTable {
        let columns = ordered(&self.geo_order, &self.geos);
        self.pivot("sector", &columns, |r| (&r.sector, &r.geo))
    }

    fn pivot<'a>(
        &'a self,
        index_label: &str,
        columns: &[String],
        split: impl Fn(&'a PanelRecord) -> (&'a String, &'a String),
    ) -> PivotTable {
        let mut grouped: BTreeMap<(NaiveDate, &String), Vec<Option<f64>>> = BTreeMap::new();
        for record in &self.records {
            let (index, column) = split(record);
            let Some(col) = columns.iter().position(|c| c == column) else {
                continue;
            };
            let cells = grouped
                .entry((record.date, index))
                .or_insert_with(|| vec![None; columns.len()]);
            cells[col] = Some(record.value);
        }

        PivotTable {
            index_label: index_label.to_string(),
            columns: columns.to_vec(),
            rows: grouped
                .into_iter()
                .map(|((date, index), cells)| PivotRow {
                    date,
                    index: index.clone(),
                    cells,
                })
                .collect(),
        }
    }
}

/// Declared labels that are present, then present labels nobody declared.
fn ordered(declared: &[String], present: &[String]) -> Vec<String> {
    declared
        .iter()
        .filter(|d| present.contains(d))
        .chain(present.iter().filter(|p| !declared.contains(p)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn series(values: &[(NaiveDate, Option<f64>)]) -> ObservationSeries {
        ObservationSeries::from_observations(
            values.iter().map(|(d, v)| Observation::new(*d, *v)).collect(),
        )
    }

    fn panel() -> HicpPanel {
        let all = DateRange::unbounded();
        let mut p = HicpPanel::default();
        p.add_series("ALL_ITEMS", "U2", &series(&[(d(2024, 1), Some(2.8)), (d(2024, 2), Some(2.6))]), &all);
        p.add_series("ALL_ITEMS", "DE", &series(&[(d(2024, 1), Some(3.1))]), &all);
        p.add_series("ENERGY", "U2", &series(&[(d(2024, 1), Some(-6.3)), (d(2024, 2), None)]), &all);
        p
    }

    #[test]
    fn by_country_has_one_column_per_sector() {
        let t = panel().by_country();
        assert_eq!(t.index_label, "country");
        assert_eq!(t.columns, ["ALL_ITEMS", "ENERGY"]);
        let keys: Vec<_> = t.rows.iter().map(|r| (r.date, r.index.as_str())).collect();
        assert_eq!(keys, vec![(d(2024, 1), "DE"), (d(2024, 1), "U2"), (d(2024, 2), "U2")]);
        assert_eq!(t.rows[0].cells, vec![Some(3.1), None]);
        assert_eq!(t.rows[1].cells, vec![Some(2.8), Some(-6.3)]);
        assert_eq!(t.rows[2].cells, vec![Some(2.6), None]);
    }

    #[test]
    fn by_sector_has_one_column_per_geo() {
        let t = panel().by_sector();
        assert_eq!(t.columns, ["U2", "DE"]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.rows[0].index, "ALL_ITEMS");
        assert_eq!(t.rows[0].cells, vec![Some(2.8), Some(3.1)]);
        assert_eq!(t.rows[1].index, "ENERGY");
        assert_eq!(t.rows[1].cells, vec![Some(-6.3), None]);
    }

    #[test]
    fn missing_values_never_produce_empty_rows() {
        let all = DateRange::unbounded();
        let mut p = HicpPanel::default();
        p.add_series("ALL_ITEMS", "U2", &series(&[(d(2024, 1), Some(2.8)), (d(2024, 2), None)]), &all);
        p.add_series("ENERGY", "U2", &series(&[(d(2024, 1), None), (d(2024, 2), None)]), &all);
        p.add_series("FOOD", "DE", &series(&[(d(2024, 2), Some(1.9))]), &all);

        let country = p.by_country();
        assert_eq!(country.columns, ["ALL_ITEMS", "FOOD"]);
        let keys: Vec<_> = country.rows.iter().map(|r| (r.date, r.index.as_str())).collect();
        assert_eq!(keys, vec![(d(2024, 1), "U2"), (d(2024, 2), "DE")]);
        assert_eq!(country.rows[1].cells, vec![None, Some(1.9)]);

        let sector = p.by_sector();
        assert_eq!(sector.columns, ["U2", "DE"]);
        assert!(sector.rows.iter().all(|r| r.cells.iter().any(Option::is_some)));
        assert_eq!(sector.len(), 2);
    }

    #[test]
    fn columns_follow_declared_order_not_arrival_order() {
        let all = DateRange::unbounded();
        let strings = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut p = HicpPanel::with_order(strings(&["ALL_ITEMS", "ENERGY"]), strings(&["U2", "DE"]));
        p.add_series("ALL_ITEMS", "U2", &series(&[]), &all);
        p.add_series("ALL_ITEMS", "DE", &series(&[(d(2024, 1), Some(3.1))]), &all);
        p.add_series("ENERGY", "U2", &series(&[(d(2024, 1), Some(-6.3))]), &all);
        p.add_series("ENERGY", "DE", &series(&[(d(2024, 1), Some(-4.0))]), &all);

        assert_eq!(p.by_sector().columns, ["U2", "DE"]);
        assert_eq!(p.by_country().columns, ["ALL_ITEMS", "ENERGY"]);
        let energy = &p.by_sector().rows[1];
        assert_eq!(energy.index, "ENERGY");
        assert_eq!(energy.cells, vec![Some(-6.3), Some(-4.0)]);
    }

    #[test]
    fn series_outside_range_add_no_columns() {
        let mut p = HicpPanel::default();
        let range = DateRange::new(Some(d(2025, 1)), None).unwrap();
        p.add_series("FOOD", "FR", &series(&[(d(2024, 1), Some(1.0))]), &range);
        assert!(p.by_country().is_empty());
        assert!(p.by_country().columns.is_empty());
    }
}
