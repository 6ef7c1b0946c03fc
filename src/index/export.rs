//! CSV export of the published index.

use std::io::Write;

use anyhow::Result;

use crate::types::Percentile;

use super::BenchmarkIndex;

const STAT_COLUMNS: [&str; 4] = ["Internal Min", "Internal Median", "Internal Max", "Count"];

/// Write one CSV row per index row. Absent values are blank cells.
pub fn write_csv<W: Write>(index: &BenchmarkIndex, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = vec![
        "Site",
        "Region",
        "Code",
        "Exec Family",
        "Raw Family",
        "Level",
        "Benchmark Level",
    ];
    header.extend(Percentile::ALL.iter().map(|p| p.label()));
    header.extend(STAT_COLUMNS);
    out.write_record(&header)?;

    for row in index.rows() {
        let mut record: Vec<String> = vec![
            row.site.clone(),
            row.region.clone(),
            row.code.clone(),
            row.exec_family.clone(),
            row.raw_family.clone(),
            row.level.clone(),
            row.token.clone().unwrap_or_default(),
        ];
        record.extend(Percentile::ALL.iter().map(|&p| number(row.percentiles.get(p))));
        record.push(number(row.internal.min));
        record.push(number(row.internal.median));
        record.push(number(row.internal.max));
        record.push(row.internal.count.to_string());
        out.write_record(&record)?;
    }

    out.flush()?;
    Ok(())
}

fn number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{:.0}", v),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}
