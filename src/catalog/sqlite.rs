// Loads catalog terms from the SQLite course database produced by the scraper.
//
// Connections are short-lived: every load opens the file, reads, and closes,
// which keeps the catalog free of connection state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use super::TermCatalog;
use crate::error::CatalogError;
use crate::models::{CourseKey, MeetingTime, Section};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sections (
    crn             TEXT NOT NULL,
    term            TEXT NOT NULL,
    subject         TEXT NOT NULL,
    course_number   TEXT NOT NULL,
    title           TEXT,
    credits         INTEGER,
    instructor      TEXT,
    enrollment      INTEGER,
    max_enrollment  INTEGER,
    seats_available INTEGER,
    wait_count      INTEGER,
    is_open         INTEGER,
    PRIMARY KEY (term, crn)
);
CREATE TABLE IF NOT EXISTS meeting_times (
    term       TEXT NOT NULL,
    crn        TEXT NOT NULL,
    sunday     INTEGER,
    monday     INTEGER,
    tuesday    INTEGER,
    wednesday  INTEGER,
    thursday   INTEGER,
    friday     INTEGER,
    saturday   INTEGER,
    start_time TEXT,
    end_time   TEXT,
    building   TEXT,
    room       TEXT
);
";

/// File-backed source of course data.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SqliteSource { path: path.as_ref().to_path_buf() }
    }

    fn open(&self) -> Result<Connection, CatalogError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Reads every section of `term` and installs it in `catalog`.
    pub fn load_term(&self, catalog: &TermCatalog, term: &str) -> Result<usize, CatalogError> {
        let conn = self.open()?;
        let sections = read_term(&conn, term)?;
        Ok(catalog.insert_term(term, sections))
    }

    pub fn load_term_if_needed(&self, catalog: &TermCatalog, term: &str) -> Result<(), CatalogError> {
        if catalog.is_term_loaded(term) {
            return Ok(());
        }
        self.load_term(catalog, term).map(|_| ())
    }

    /// Registers every course key present in any term, for the existence probe.
    pub fn load_course_index(&self, catalog: &TermCatalog) -> Result<usize, CatalogError> {
        let conn = self.open()?;
        let keys = read_course_index(&conn)?;
        let n = keys.len();
        catalog.register_known_courses(keys);
        info!(courses = n, "loaded course index");
        Ok(n)
    }
}

/// CRNs are stored as text or integers depending on the importer; the
/// catalog always works with strings.
fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get::<_, Value>(idx)? {
        Value::Text(s) => s,
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Null | Value::Blob(_) => String::new(),
    })
}

fn int_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<i64> {
    Ok(row.get::<_, Option<i64>>(idx)?.unwrap_or(0))
}

pub fn read_term(conn: &Connection, term: &str) -> Result<Vec<Section>, CatalogError> {
    let mut stmt = conn.prepare(
        "SELECT crn, term, subject, course_number, title, credits, instructor,
                enrollment, max_enrollment, seats_available, wait_count, is_open
         FROM sections WHERE term = ?1 ORDER BY subject, course_number, crn",
    )?;
    let sections: Vec<Section> = stmt
        .query_map(params![term], |row| {
            Ok(Section {
                crn: text_column(row, 0)?,
                term: text_column(row, 1)?,
                subject: text_column(row, 2)?,
                course_number: text_column(row, 3)?,
                title: text_column(row, 4)?,
                credits: int_column(row, 5)?.max(0) as u32,
                instructor: text_column(row, 6)?,
                enrollment: int_column(row, 7)? as i32,
                max_enrollment: int_column(row, 8)? as i32,
                seats_available: int_column(row, 9)? as i32,
                wait_count: int_column(row, 10)? as i32,
                is_open: int_column(row, 11)? == 1,
                ..Default::default()
            })
        })?
        .collect::<Result<_, _>>()?;

    if sections.is_empty() {
        return Err(CatalogError::UnknownTerm(term.to_string()));
    }

    // index meeting rows by CRN to avoid one query per section
    let mut meetings: HashMap<String, Vec<MeetingTime>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT crn, sunday, monday, tuesday, wednesday, thursday, friday, saturday,
                start_time, end_time, building, room
         FROM meeting_times WHERE term = ?1",
    )?;
    let rows = stmt.query_map(params![term], |row| {
        let mut days = [false; 7];
        for (i, day) in days.iter_mut().enumerate() {
            *day = int_column(row, i + 1)? == 1;
        }
        Ok((
            text_column(row, 0)?,
            MeetingTime {
                days,
                start_time: text_column(row, 8)?,
                end_time: text_column(row, 9)?,
                building: text_column(row, 10)?,
                room: text_column(row, 11)?,
            },
        ))
    })?;
    for row in rows {
        let (crn, mt) = row?;
        meetings.entry(crn).or_default().push(mt);
    }

    debug!(term, sections = sections.len(), meeting_rows = meetings.len(), "read term from sqlite");

    Ok(sections
        .into_iter()
        .map(|mut s| {
            s.meeting_times = meetings.remove(&s.crn).unwrap_or_default();
            s
        })
        .collect())
}

pub fn read_course_index(conn: &Connection) -> Result<Vec<CourseKey>, CatalogError> {
    let mut stmt = conn.prepare("SELECT DISTINCT subject, course_number FROM sections")?;
    let keys = stmt
        .query_map([], |row| Ok(CourseKey::new(&text_column(row, 0)?, &text_column(row, 1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(keys)
}
