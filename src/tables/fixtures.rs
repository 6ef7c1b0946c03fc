//! Shared test tables: a small two-region survey with payroll.

use crate::config::{Config, RegionConfig};

use super::source::MemorySource;
use super::table::Table;

pub(crate) fn levels() -> Table {
    Table::from_text_rows(
        "Levels",
        &[
            vec!["Level", "Benchmark Level"],
            vec!["L3 IC", "P3"],
            vec!["L4 IC", "P4"],
            vec!["L4.5 IC", ""],
            vec!["L5 IC", "P5"],
            vec!["L5.5 IC", ""],
            vec!["L6 IC", "P6"],
            vec!["L6 Mgr", "M6"],
            vec!["L6.5 Mgr", ""],
            vec!["L7 Mgr", "E1"],
            vec!["L8 Mgr", "E3"],
        ],
    )
}

pub(crate) fn aliases() -> Table {
    Table::from_text_rows(
        "Aliases",
        &[
            vec!["From", "To"],
            vec!["DEV", "SWE"],
            vec!["ACCT", "FIN"],
        ],
    )
}

pub(crate) fn exec_families() -> Table {
    Table::from_text_rows(
        "Exec Families",
        &[
            vec!["Code", "Exec Family"],
            vec!["SWE", "Software Engineering"],
            vec!["DATA", "Data Science"],
            vec!["FIN", "Finance"],
            vec!["MKT", "Marketing"],
            vec!["EXE", "Executive"],
        ],
    )
}

pub(crate) fn benchmarks_us() -> Table {
    Table::from_text_rows(
        "Benchmarks US",
        &[
            vec!["Job Code", "Job Family", "Job Family Name", "P40", "P50", "P62.5", "P75", "P90"],
            vec!["SWE.P4", "SWE", "Software Eng", "100000", "110000", "120000", "130000", "150000"],
            vec!["SWE.P5", "SWE", "Software Eng", "130000", "140000", "150000", "165000", "190000"],
            vec!["SWE.P6", "SWE", "Software Eng", "160000", "175000", "190000", "205000", "240000"],
            vec!["SWE.M6", "SWE", "Software Eng", "170000", "185000", "200000", "220000", "260000"],
            vec!["SWE.E1", "SWE", "Software Eng", "250000", "280000", "310000", "340000", "400000"],
            vec!["FIN.F4", "FIN", "Finance", "90000", "95000", "100000", "110000", "120000"],
            vec!["FIN.P5", "FIN", "Finance", "110000", "120000", "130000", "140000", "160000"],
            vec!["MKT.P4", "MKT", "Marketing", "80000", "85000", "90000", "100000", "115000"],
            vec!["MKT.P5", "MKT", "Marketing", "95000", "n/a", "105000", "115000", "130000"],
            vec!["EXE.EA", "EXE", "Executive", "300000", "330000", "360000", "400000", "480000"],
            vec!["EXE.EB", "EXE", "Executive", "220000", "240000", "260000", "290000", "340000"],
            vec!["OPS.P5", "OPS", "Operations", "70000", "75000", "80000", "85000", "95000"],
            // Later duplicates never beat an earlier match
            vec!["SWE.P5", "SWE", "Software Eng", "1", "1", "1", "1", "1"],
            vec!["MKT.P5", "MKT", "Marketing", "1", "100000", "1", "1", "1"],
        ],
    )
}

pub(crate) fn benchmarks_uk() -> Table {
    Table::from_text_rows(
        "Benchmarks UK",
        &[
            vec![
                "Job Code",
                "Job Family",
                "CFY Fixed Pay: 40th Percentile",
                "CFY Fixed Pay: 50th Percentile",
                "CFY Fixed Pay: 62.5th Percentile",
                "CFY Fixed Pay: 75th Percentile",
                "CFY Fixed Pay: 90th Percentile",
            ],
            vec!["SWE.P5", "SWE", "80000", "85000", "90000", "99950", "120049"],
            vec!["SWE.P6", "SWE", "", "", "", "", ""],
        ],
    )
}

pub(crate) fn internal_pay() -> Table {
    Table::from_text_rows(
        "Internal Pay",
        &[
            vec!["Site", "Job Family", "Exec Family", "Level", "Active", "Pay"],
            vec!["US", "SWE", "Software Engineering", "L5 IC", "TRUE", "50000"],
            vec!["us", "SWE", "Software Engineering", "L5 IC", "TRUE", "60000"],
            vec!["US", "DEV", "", "L5 IC", "TRUE", "70000"],
            vec!["US", "SWE", "Software Engineering", "L5 IC", "TRUE", "80000"],
            vec!["US", "SWE", "Software Engineering", "L5 IC", "FALSE", "999999"],
            vec!["UK", "SWE", "Software Engineering", "L5 IC", "TRUE", "40000.4"],
            vec!["US", "MKT", "Marketing", "L4 IC", "TRUE", "60000"],
            vec!["US", "MKT", "Marketing", "L4 IC", "TRUE", "70000"],
            vec!["US", "MKT", "Marketing", "L4 IC", "TRUE", "80000"],
            vec!["US", "MKT", "Marketing", "L4 IC", "TRUE", "not a number"],
        ],
    )
}

pub(crate) fn source() -> MemorySource {
    MemorySource::new()
        .with_table(levels())
        .with_table(aliases())
        .with_table(exec_families())
        .with_table(benchmarks_us())
        .with_table(benchmarks_uk())
        .with_table(internal_pay())
}

pub(crate) fn config() -> Config {
    Config {
        regions: vec![
            RegionConfig::new("US", "Benchmarks US"),
            RegionConfig::new("UK", "Benchmarks UK"),
        ],
        ..Default::default()
    }
}
