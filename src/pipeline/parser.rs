//! Box-score parser for match statistics pages
//!
//! A match sheet is recognised by two team headings and two statistics
//! tables, one per team. Anything else (a "match not found" page, a
//! fixture that has not been played yet, a redesigned page) yields `None`,
//! which callers treat as a match without data rather than an error.
//!
//! The parser is pure: no I/O, no shared state, same output for the same
//! input.

use scraper::{ElementRef, Html, Selector};

/// Team name headings, home team first
const TEAM_HEADER_SELECTOR: &str = "div.cabecera_partido h4";

/// Per-team statistics tables, home team first
const STATS_TABLE_SELECTOR: &str = r#"table[data-toggle="table-estadisticas"]"#;

/// Header rows at the top of each statistics table
const HEADER_ROWS: usize = 2;

/// Team, totals, quarter and coach rows at the bottom of each table
const FOOTER_ROWS: usize = 4;

/// Cells a player row must carry
const PLAYER_CELLS: usize = 23;

// Cell positions within a player row
const COL_NUMBER: usize = 0;
const COL_NAME: usize = 1;
const COL_MINUTES: usize = 2;
const COL_POINTS: usize = 3;
const COL_TWO_POINTERS: usize = 4;
const COL_TWO_PCT: usize = 5;
const COL_THREE_POINTERS: usize = 6;
const COL_THREE_PCT: usize = 7;
const COL_FREE_THROWS: usize = 8;
const COL_FREE_THROW_PCT: usize = 9;
const COL_TOTAL_REBOUNDS: usize = 10;
const COL_SPLIT_REBOUNDS: usize = 11;
const COL_ASSISTS: usize = 12;
const COL_STEALS: usize = 13;
const COL_TURNOVERS: usize = 14;
const COL_FAST_BREAKS: usize = 15;
const COL_BLOCKS: usize = 16;
const COL_BLOCKS_RECEIVED: usize = 17;
const COL_DUNKS: usize = 18;
const COL_FOULS_COMMITTED: usize = 19;
const COL_FOULS_RECEIVED: usize = 20;
const COL_PLUS_MINUS: usize = 21;
const COL_EFFICIENCY: usize = 22;

/// One player's line in a match box score
///
/// Numeric fields are `None` when the page left the cell blank or the
/// value could not be read; the rest of the record is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRecord {
    pub match_id: u32,
    pub team: String,
    /// Marked with a leading `*` on the page
    pub starter: bool,
    /// Jersey number as printed ("00" and "0" are different players)
    pub number: String,
    pub name: String,
    pub seconds_played: Option<u32>,
    pub points: Option<u32>,
    pub two_pt_made: Option<u32>,
    pub two_pt_attempted: Option<u32>,
    pub two_pt_pct: Option<f64>,
    pub three_pt_made: Option<u32>,
    pub three_pt_attempted: Option<u32>,
    pub three_pt_pct: Option<f64>,
    pub free_throws_made: Option<u32>,
    pub free_throws_attempted: Option<u32>,
    pub free_throw_pct: Option<f64>,
    pub total_rebounds: Option<u32>,
    pub defensive_rebounds: Option<u32>,
    pub offensive_rebounds: Option<u32>,
    pub assists: Option<u32>,
    pub steals: Option<u32>,
    pub turnovers: Option<u32>,
    pub fast_breaks: Option<u32>,
    pub blocks: Option<u32>,
    pub blocks_received: Option<u32>,
    pub dunks: Option<u32>,
    pub fouls_committed: Option<u32>,
    pub fouls_received: Option<u32>,
    pub plus_minus: Option<i32>,
    pub efficiency: Option<i32>,
}

/// One row per match in the game dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub match_id: u32,
    pub home_team: String,
    pub away_team: String,
    pub home_players: usize,
    pub away_players: usize,
    /// Sum of the home players' points, `None` if no player had a value
    /// or the sum overflows
    pub home_points: Option<u32>,
    pub away_points: Option<u32>,
}

/// Everything extracted from one match page
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSheet {
    pub match_id: u32,
    pub home_team: String,
    pub away_team: String,
    /// Home players first, then away players, in page order
    pub records: Vec<StatRecord>,
    /// Number of leading records that belong to the home team
    pub home_players: usize,
}

impl MatchSheet {
    /// Builds the per-match summary row
    pub fn game_record(&self) -> GameRecord {
        let (home, away) = self.records.split_at(self.home_players.min(self.records.len()));

        GameRecord {
            match_id: self.match_id,
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            home_players: home.len(),
            away_players: away.len(),
            home_points: sum_points(home),
            away_points: sum_points(away),
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// `None` when no player has a value or the total does not fit
fn sum_points(records: &[StatRecord]) -> Option<u32> {
    let mut points = records.iter().filter_map(|r| r.points).peekable();
    points.peek()?;
    points.try_fold(0u32, |total, points| total.checked_add(points))
}

impl IntoIterator for MatchSheet {
    type Item = StatRecord;
    type IntoIter = std::vec::IntoIter<StatRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Parses a match statistics page
///
/// # Arguments
///
/// * `html` - The page body
/// * `match_id` - The identifier the page was fetched for
///
/// # Returns
///
/// * `Some(MatchSheet)` - The page is a match sheet (it may still hold zero
///   player rows)
/// * `None` - The page has no match sheet structure
///
/// # Example
///
/// ```
/// use courtside::pipeline::parse_match;
///
/// let html = "<html><body><p>Partido no encontrado</p></body></html>";
/// assert!(parse_match(html, 42).is_none());
/// ```
pub fn parse_match(html: &str, match_id: u32) -> Option<MatchSheet> {
    let document = Html::parse_document(html);

    let header_selector = Selector::parse(TEAM_HEADER_SELECTOR).ok()?;
    let table_selector = Selector::parse(STATS_TABLE_SELECTOR).ok()?;

    let teams: Vec<String> = document
        .select(&header_selector)
        .map(cell_text)
        .take(2)
        .collect();
    if teams.len() < 2 {
        return None;
    }

    let tables: Vec<ElementRef> = document.select(&table_selector).take(2).collect();
    if tables.len() < 2 {
        return None;
    }

    let mut records = parse_table(tables[0], &teams[0], match_id);
    let home_players = records.len();
    records.extend(parse_table(tables[1], &teams[1], match_id));

    Some(MatchSheet {
        match_id,
        home_team: teams[0].clone(),
        away_team: teams[1].clone(),
        records,
        home_players,
    })
}

/// Parses a page straight into its player records
///
/// Pages without a match sheet produce an empty iterator.
pub fn parse_stats(html: &str, match_id: u32) -> impl Iterator<Item = StatRecord> {
    parse_match(html, match_id).into_iter().flatten()
}

/// Extracts the player rows of one team table
fn parse_table(table: ElementRef, team: &str, match_id: u32) -> Vec<StatRecord> {
    let (row_selector, cell_selector) = match (Selector::parse("tr"), Selector::parse("td")) {
        (Ok(row), Ok(cell)) => (row, cell),
        _ => return Vec::new(),
    };

    let rows: Vec<ElementRef> = table.select(&row_selector).collect();
    if rows.len() <= HEADER_ROWS + FOOTER_ROWS {
        return Vec::new();
    }

    rows[HEADER_ROWS..rows.len() - FOOTER_ROWS]
        .iter()
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&cell_selector).map(cell_text).collect();
            parse_player_row(&cells, team, match_id)
        })
        .collect()
}

/// Builds a record from the text of one row, `None` for non-player rows
fn parse_player_row(cells: &[String], team: &str, match_id: u32) -> Option<StatRecord> {
    if cells.len() < PLAYER_CELLS {
        return None;
    }

    let raw_number = cells[COL_NUMBER].as_str();
    let (two_pt_made, two_pt_attempted) = parse_fraction(&cells[COL_TWO_POINTERS]);
    let (three_pt_made, three_pt_attempted) = parse_fraction(&cells[COL_THREE_POINTERS]);
    let (free_throws_made, free_throws_attempted) = parse_fraction(&cells[COL_FREE_THROWS]);
    let (defensive_rebounds, offensive_rebounds) = parse_rebounds(&cells[COL_SPLIT_REBOUNDS]);

    Some(StatRecord {
        match_id,
        team: team.to_string(),
        starter: raw_number.starts_with('*'),
        number: raw_number.trim_matches('*').trim().to_string(),
        name: cells[COL_NAME].clone(),
        seconds_played: parse_seconds(&cells[COL_MINUTES]),
        points: parse_count(&cells[COL_POINTS]),
        two_pt_made,
        two_pt_attempted,
        two_pt_pct: parse_percentage(&cells[COL_TWO_PCT]),
        three_pt_made,
        three_pt_attempted,
        three_pt_pct: parse_percentage(&cells[COL_THREE_PCT]),
        free_throws_made,
        free_throws_attempted,
        free_throw_pct: parse_percentage(&cells[COL_FREE_THROW_PCT]),
        total_rebounds: parse_count(&cells[COL_TOTAL_REBOUNDS]),
        defensive_rebounds,
        offensive_rebounds,
        assists: parse_count(&cells[COL_ASSISTS]),
        steals: parse_count(&cells[COL_STEALS]),
        turnovers: parse_count(&cells[COL_TURNOVERS]),
        fast_breaks: parse_count(&cells[COL_FAST_BREAKS]),
        blocks: parse_count(&cells[COL_BLOCKS]),
        blocks_received: parse_count(&cells[COL_BLOCKS_RECEIVED]),
        dunks: parse_count(&cells[COL_DUNKS]),
        fouls_committed: parse_count(&cells[COL_FOULS_COMMITTED]),
        fouls_received: parse_count(&cells[COL_FOULS_RECEIVED]),
        plus_minus: parse_signed(&cells[COL_PLUS_MINUS]),
        efficiency: parse_signed(&cells[COL_EFFICIENCY]),
    })
}

/// Text content of an element with whitespace collapsed
fn cell_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_count(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}

/// Signed integer, accepting a leading `+` and the unicode minus sign
fn parse_signed(value: &str) -> Option<i32> {
    let value = value.trim().replace('\u{2212}', "-");
    value.strip_prefix('+').unwrap_or(value.as_str()).parse().ok()
}

/// `made/attempted`
fn parse_fraction(value: &str) -> (Option<u32>, Option<u32>) {
    match value.split_once('/') {
        Some((made, attempted)) => (parse_count(made), parse_count(attempted)),
        None => (None, None),
    }
}

/// `defensive+offensive`
fn parse_rebounds(value: &str) -> (Option<u32>, Option<u32>) {
    match value.split_once('+') {
        Some((defensive, offensive)) => (parse_count(defensive), parse_count(offensive)),
        None => (parse_count(value), None),
    }
}

/// `66%` or `66,7%`
fn parse_percentage(value: &str) -> Option<f64> {
    let value = value.trim().trim_end_matches('%').trim().replace(',', ".");
    value.parse::<f64>().ok().filter(|pct| pct.is_finite())
}

/// `MM:SS`, or whole minutes
fn parse_seconds(value: &str) -> Option<u32> {
    let value = value.trim();
    match value.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes.trim().parse().ok()?;
            let seconds: u32 = seconds.trim().parse().ok()?;
            if seconds >= 60 {
                return None;
            }
            minutes.checked_mul(60)?.checked_add(seconds)
        }
        None => value.parse::<u32>().ok()?.checked_mul(60),
    }
}
