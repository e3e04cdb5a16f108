//! Culture table loading, coercion and export.
//!
//! The on-disk layout is one `data.csv` per culture directory: a first line
//! of free-form experiment metadata, then a header line, then one row per
//! sample. Rows are kept verbatim for pass-through export next to a coerced
//! view used by the analysis engines.

use crate::model::{GroupKey, KineticRecord, Sample};
use crate::units;
use anyhow::{Context, Result};
use csv::StringRecord;
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Kinetic column names appended by the interval export.
const INTERVAL_COLUMNS: [&str; 9] = [
    "mu", "IVCD_tot", "dX", "dG", "dL", "Y_XG", "Y_XL", "q_G", "q_L",
];

/// Coerced view of one table row.
///
/// Every field is parsed independently: a numeric field that is missing or
/// fails to parse becomes NaN, identifiers and timestamps become None, and
/// the feed flag defaults to false. A bad cell never rejects its row.
#[derive(Debug, Clone)]
pub struct RowData {
    pub clone_id: Option<String>,
    pub rep: Option<i64>,
    pub t_hr: Option<f64>,
    pub vol_ml: f64,
    pub vcd: f64,
    pub glc_g_l: f64,
    pub lac_g_l: f64,
    pub post_feed: bool,
}

impl RowData {
    fn coerce(record: &StringRecord, cols: &Columns) -> Self {
        Self {
            clone_id: parse_id(record.get(cols.clone_id)),
            rep: parse_int(record.get(cols.rep)),
            t_hr: parse_num(record.get(cols.t_hr)),
            vol_ml: coerce_num(record.get(cols.vol_ml)),
            vcd: coerce_num(record.get(cols.vcd)),
            glc_g_l: coerce_num(record.get(cols.glc_g_l)),
            lac_g_l: coerce_num(record.get(cols.lac_g_l)),
            post_feed: cols.post_feed.is_some_and(|idx| parse_flag(record.get(idx))),
        }
    }
}

/// One table row: the raw record for verbatim export plus its coerced view.
#[derive(Debug)]
pub struct Row {
    record: StringRecord,
    data: RowData,
}

impl Row {
    pub fn data(&self) -> &RowData {
        &self.data
    }
}

/// An in-memory culture table, sorted by (Clone, Rep, t_hr). Rows whose
/// identifiers failed to parse sort after keyed rows; ties keep file order.
#[derive(Debug)]
pub struct Table {
    header: StringRecord,
    rows: Vec<Row>,
}

impl Table {
    /// Load a table from `file`, skipping the metadata line.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not readable
    /// CSV, or if a required column is missing from the header.
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        let mut metadata = String::new();
        reader
            .read_line(&mut metadata)
            .context("failed to read metadata line")?;

        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let header = csv_reader
            .headers()
            .context("failed to read header line")?
            .clone();
        let cols = Columns::resolve(&header)?;

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.context("failed to read record")?;
            let data = RowData::coerce(&record, &cols);
            rows.push(Row { record, data });
        }

        rows.sort_by(|a, b| key_order(&a.data, &b.data));

        Ok(Self { header, rows })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Write the table with the kinetic columns appended, one output row
    /// per input row in table order. `records` must be row-aligned; rows
    /// without a record get empty kinetic fields, and ragged rows are
    /// padded or cut to the header width.
    pub fn write_with_kinetics<P: AsRef<Path>>(
        &self,
        file: P,
        records: &[Option<KineticRecord>],
    ) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = csv::Writer::from_writer(file);

        let mut header: Vec<&str> = self.header.iter().collect();
        header.extend(INTERVAL_COLUMNS);
        writer.write_record(&header)?;

        for (row, record) in self.rows.iter().zip(records) {
            let mut fields: Vec<String> = row.record.iter().map(str::to_owned).collect();
            fields.resize(self.header.len(), String::new());
            match record {
                Some(rec) => fields.extend(rec.values().map(fmt_value)),
                None => fields.extend(std::iter::repeat_n(String::new(), INTERVAL_COLUMNS.len())),
            }
            writer.write_record(&fields)?;
        }

        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}

/// Group the rows accepted by `qualify` into an ordered map of replicate
/// cultures. Rows without a complete (Clone, Rep, t_hr) key are left out.
/// The table is time-sorted, so each group's samples come out ascending in
/// `t_hr`, and substrate readings are converted to mol/mL on the way in.
pub fn group_samples<F>(table: &Table, qualify: F) -> BTreeMap<GroupKey, Vec<Sample>>
where
    F: Fn(&RowData) -> bool,
{
    let mut groups: BTreeMap<GroupKey, Vec<Sample>> = BTreeMap::new();

    for (row_idx, row) in table.rows().iter().enumerate() {
        let data = row.data();
        if !qualify(data) {
            continue;
        }
        let (Some(clone_id), Some(rep), Some(t_hr)) = (&data.clone_id, data.rep, data.t_hr)
        else {
            continue;
        };

        groups.entry((clone_id.to_owned(), rep)).or_default().push(Sample {
            row: row_idx,
            t_hr,
            vol_ml: data.vol_ml,
            vcd: data.vcd,
            glc_mol_ml: units::mol_per_ml(data.glc_g_l, units::MM_GLUCOSE),
            lac_mol_ml: units::mol_per_ml(data.lac_g_l, units::MM_LACTATE),
            post_feed: data.post_feed,
        });
    }

    groups
}

/// Format one exported value: NaN (a missing or undefined quantity) becomes
/// an empty field, everything else uses the shortest round-trip form.
pub fn fmt_value(val: f64) -> String {
    if val.is_nan() { String::new() } else { val.to_string() }
}

/// Index of every recognized column in the input header.
struct Columns {
    clone_id: usize,
    rep: usize,
    t_hr: usize,
    vol_ml: usize,
    vcd: usize,
    glc_g_l: usize,
    lac_g_l: usize,
    post_feed: Option<usize>,
}

impl Columns {
    fn resolve(header: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|col| col == name)
                .with_context(|| format!("missing required column {name:?}"))
        };

        Ok(Self {
            clone_id: find("Clone")?,
            rep: find("Rep")?,
            t_hr: find("t_hr")?,
            vol_ml: find("Vol_mL")?,
            vcd: find("VCD")?,
            glc_g_l: find("Glc_g_L")?,
            lac_g_l: find("Lac_g_L")?,
            post_feed: header.iter().position(|col| col == "is_post_feed"),
        })
    }
}

fn key_order(a: &RowData, b: &RowData) -> Ordering {
    missing_last(a.clone_id.as_deref(), b.clone_id.as_deref(), |x, y| x.cmp(y))
        .then_with(|| missing_last(a.rep, b.rep, |x, y| x.cmp(y)))
        .then_with(|| missing_last(a.t_hr, b.t_hr, f64::total_cmp))
}

fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (&a, &b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn parse_num(field: Option<&str>) -> Option<f64> {
    let text = field?.trim();
    let val: f64 = text.parse().ok()?;
    if val.is_nan() { None } else { Some(val) }
}

fn coerce_num(field: Option<&str>) -> f64 {
    parse_num(field).unwrap_or(f64::NAN)
}

fn parse_int(field: Option<&str>) -> Option<i64> {
    field?.trim().parse().ok()
}

fn parse_id(field: Option<&str>) -> Option<String> {
    let text = field?;
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

fn parse_flag(field: Option<&str>) -> bool {
    field.is_some_and(|text| {
        matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "t" | "1")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercion_defaults_to_nan() {
        assert_eq!(coerce_num(Some("2.5")), 2.5);
        assert_eq!(coerce_num(Some(" 1e6 ")), 1e6);
        assert!(coerce_num(Some("n/a")).is_nan());
        assert!(coerce_num(Some("")).is_nan());
        assert!(coerce_num(None).is_nan());
    }

    #[test]
    fn timestamps_reject_nan_text() {
        assert_eq!(parse_num(Some("24")), Some(24.0));
        assert_eq!(parse_num(Some("NaN")), None);
        assert_eq!(parse_num(Some("later")), None);
    }

    #[test]
    fn replicates_must_be_integers() {
        assert_eq!(parse_int(Some(" 2 ")), Some(2));
        assert_eq!(parse_int(Some("2.0")), None);
        assert_eq!(parse_int(Some("two")), None);
        assert_eq!(parse_int(None), None);
    }

    #[test]
    fn feed_flag_accepts_truthy_spellings() {
        for text in ["true", "TRUE", " t ", "1", "T"] {
            assert!(parse_flag(Some(text)), "{text:?} should be truthy");
        }
        for text in ["false", "0", "yes", "", "2"] {
            assert!(!parse_flag(Some(text)), "{text:?} should be falsy");
        }
        assert!(!parse_flag(None));
    }

    #[test]
    fn keyless_rows_sort_last() {
        let keyed = |clone_id: &str, rep: i64, t_hr: f64| RowData {
            clone_id: Some(clone_id.to_owned()),
            rep: Some(rep),
            t_hr: Some(t_hr),
            vol_ml: f64::NAN,
            vcd: f64::NAN,
            glc_g_l: f64::NAN,
            lac_g_l: f64::NAN,
            post_feed: false,
        };

        let mut keyless = keyed("A", 1, 0.0);
        keyless.rep = None;

        assert_eq!(key_order(&keyed("A", 1, 0.0), &keyed("A", 1, 24.0)), Ordering::Less);
        assert_eq!(key_order(&keyed("A", 2, 0.0), &keyed("B", 1, 0.0)), Ordering::Less);
        assert_eq!(key_order(&keyed("A", 9, 96.0), &keyless), Ordering::Less);
        assert_eq!(key_order(&keyless, &keyless), Ordering::Equal);
    }

    #[test]
    fn empty_fields_export_empty() {
        assert_eq!(fmt_value(f64::NAN), "");
        assert_eq!(fmt_value(30_000_000.0), "30000000");
        assert_eq!(fmt_value(0.25), "0.25");
    }
}
