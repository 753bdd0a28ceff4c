//! CSV serialisation of the scraped datasets
//!
//! Rows are written with `,` as separator. Fields containing the separator,
//! quotes or line breaks are quoted with doubled inner quotes. Missing
//! values are empty cells, numbers use Rust's locale-independent `Display`.

use crate::output::OutputResult;
use crate::pipeline::{GameRecord, StatRecord};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const SEPARATOR: char = ',';

/// A type that can be written as one CSV row
pub trait CsvRow {
    /// Column names, in row order
    fn header() -> &'static [&'static str];

    /// Cell values, one per header column
    fn to_row(&self) -> Vec<String>;
}

pub const STAT_COLUMNS: &[&str] = &[
    "match_id",
    "team",
    "starter",
    "number",
    "name",
    "seconds_played",
    "points",
    "two_pt_made",
    "two_pt_attempted",
    "two_pt_pct",
    "three_pt_made",
    "three_pt_attempted",
    "three_pt_pct",
    "free_throws_made",
    "free_throws_attempted",
    "free_throw_pct",
    "total_rebounds",
    "defensive_rebounds",
    "offensive_rebounds",
    "assists",
    "steals",
    "turnovers",
    "fast_breaks",
    "blocks",
    "blocks_received",
    "dunks",
    "fouls_committed",
    "fouls_received",
    "plus_minus",
    "efficiency",
];

pub const GAME_COLUMNS: &[&str] = &[
    "match_id",
    "home_team",
    "away_team",
    "home_players",
    "away_players",
    "home_points",
    "away_points",
];

fn cell<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvRow for StatRecord {
    fn header() -> &'static [&'static str] {
        STAT_COLUMNS
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.match_id.to_string(),
            self.team.clone(),
            if self.starter { "1" } else { "0" }.to_string(),
            self.number.clone(),
            self.name.clone(),
            cell(self.seconds_played),
            cell(self.points),
            cell(self.two_pt_made),
            cell(self.two_pt_attempted),
            cell(self.two_pt_pct),
            cell(self.three_pt_made),
            cell(self.three_pt_attempted),
            cell(self.three_pt_pct),
            cell(self.free_throws_made),
            cell(self.free_throws_attempted),
            cell(self.free_throw_pct),
            cell(self.total_rebounds),
            cell(self.defensive_rebounds),
            cell(self.offensive_rebounds),
            cell(self.assists),
            cell(self.steals),
            cell(self.turnovers),
            cell(self.fast_breaks),
            cell(self.blocks),
            cell(self.blocks_received),
            cell(self.dunks),
            cell(self.fouls_committed),
            cell(self.fouls_received),
            cell(self.plus_minus),
            cell(self.efficiency),
        ]
    }
}

impl CsvRow for GameRecord {
    fn header() -> &'static [&'static str] {
        GAME_COLUMNS
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.match_id.to_string(),
            self.home_team.clone(),
            self.away_team.clone(),
            self.home_players.to_string(),
            self.away_players.to_string(),
            cell(self.home_points),
            cell(self.away_points),
        ]
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer
pub fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> std::io::Result<()> {
    for (i, field) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", SEPARATOR)?;
        }
        let field = field.as_ref();
        if needs_quotes(field) {
            write!(w, "\"{}\"", field.replace('"', "\"\""))?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Writes a header row followed by every record
pub fn write_records<'a, W, R, I>(w: &mut W, records: I) -> std::io::Result<usize>
where
    W: Write,
    R: CsvRow + 'a,
    I: IntoIterator<Item = &'a R>,
{
    write_row(w, R::header())?;
    let mut written = 0;
    for record in records {
        write_row(w, &record.to_row())?;
        written += 1;
    }
    Ok(written)
}

/// Creates (or truncates) `path` and writes the dataset to it
pub fn write_csv_file<'a, R, I>(path: &Path, records: I) -> OutputResult<usize>
where
    R: CsvRow + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let file = File::create(path).map_err(|source| crate::output::OutputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let written = write_records(&mut writer, records)
        .and_then(|written| writer.flush().map(|_| written))
        .map_err(|source| crate::output::OutputError::Io {
            path: path.display().to_string(),
            source,
        })?;

    Ok(written)
}
