use std::{
    fs::{OpenOptions, create_dir_all},
    io::{self, prelude::*},
    path::PathBuf,
};

use anyhow::{Context, Result};
use chrono::Local;
use vigil_common::Category;

use crate::aggregator::Aggregator;

/// Writes the aggregated series to `~/vigil/series-<date>` and returns the
/// file path.
pub fn export(aggregator: &Aggregator) -> Result<PathBuf> {
    let local_date = Local::now().format("%Y-%m-%d_%H-%M");

    let vigil_export_dir = dirs::home_dir()
        .context("Can not locate the home directory")?
        .join("vigil");

    if !vigil_export_dir.exists() {
        create_dir_all(&vigil_export_dir)
            .with_context(|| format!("Failed to create {}", vigil_export_dir.display()))?;
    }

    let vigil_export_file = vigil_export_dir.join(format!("series-{local_date}"));

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&vigil_export_file)
        .with_context(|| format!("Failed to open {}", vigil_export_file.display()))?;

    write_series(&mut file, aggregator)?;

    Ok(vigil_export_file)
}

pub fn write_series(out: &mut impl Write, aggregator: &Aggregator) -> io::Result<()> {
    let headers = ("Bucket", "Width", "Pass", "Blocked", "Other", "Total");
    writeln!(
        out,
        "{:19}  {:5}  {:>8}  {:>8}  {:>8}  {:>8}\n",
        headers.0, headers.1, headers.2, headers.3, headers.4, headers.5
    )?;

    let width = aggregator.width();
    for point in aggregator.series() {
        writeln!(
            out,
            "{:19}  {:5}  {:>8}  {:>8}  {:>8}  {:>8}",
            point.key.to_string(),
            width.to_string(),
            point.counters.get(Category::Pass),
            point.counters.get(Category::Blocked),
            point.counters.get(Category::Other),
            point.counters.total(),
        )?;
    }

    Ok(())
}
