//! In-memory course catalog used for schedule generation.
//!
//! Only "active" terms are kept in memory; each term is indexed by CRN and by
//! course key so the generator can fetch all sections of a course in one
//! lookup. The generator only reads through [`CourseCatalog`], so a term that
//! gets unloaded while a request is running simply yields no sections.

pub mod sqlite;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::models::{CourseKey, Section};

pub use sqlite::SqliteSource;

/// Read-only view of course data consumed by the generator.
pub trait CourseCatalog: Send + Sync {
    /// All sections of `key` offered in `term`. Empty when the term is not
    /// loaded or the course is not offered; never an error.
    fn sections_for_course(&self, term: &str, key: &CourseKey) -> Vec<Arc<Section>>;

    /// Whether the course has ever been offered in any known term.
    fn course_exists_any_term(&self, key: &CourseKey) -> bool;
}

struct TermData {
    loaded_at: DateTime<Utc>,
    by_crn: HashMap<String, Arc<Section>>,
    by_course: HashMap<CourseKey, Vec<Arc<Section>>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermSummary {
    pub term: String,
    pub loaded_at: DateTime<Utc>,
    pub sections: usize,
    pub courses: usize,
}

/// Thread-safe store of loaded terms.
#[derive(Default)]
pub struct TermCatalog {
    terms: RwLock<HashMap<String, Arc<TermData>>>,
    known_courses: RwLock<HashSet<CourseKey>>,
}

impl TermCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents of `term` with `sections`. Returns the number of
    /// sections indexed.
    pub fn insert_term(&self, term: &str, sections: Vec<Section>) -> usize {
        let mut by_crn = HashMap::with_capacity(sections.len());
        let mut by_course: HashMap<CourseKey, Vec<Arc<Section>>> = HashMap::new();
        for section in sections {
            let section = Arc::new(section);
            by_course.entry(section.course_key()).or_default().push(Arc::clone(&section));
            by_crn.insert(section.crn.clone(), section);
        }

        let count = by_crn.len();
        let courses = by_course.len();
        self.known_courses.write().extend(by_course.keys().cloned());

        let data = TermData { loaded_at: Utc::now(), by_crn, by_course };
        self.terms.write().insert(term.to_string(), Arc::new(data));

        info!(term, sections = count, courses, "loaded term into catalog");
        count
    }

    pub fn unload_term(&self, term: &str) -> bool {
        let removed = self.terms.write().remove(term).is_some();
        if removed {
            info!(term, "unloaded term from catalog");
        }
        removed
    }

    pub fn is_term_loaded(&self, term: &str) -> bool {
        self.terms.read().contains_key(term)
    }

    /// Registers course keys seen in historical terms so the existence probe
    /// can tell "not offered this term" from "no such course".
    pub fn register_known_courses<I: IntoIterator<Item = CourseKey>>(&self, keys: I) {
        self.known_courses.write().extend(keys);
    }

    pub fn section(&self, term: &str, crn: &str) -> Option<Arc<Section>> {
        let data = self.terms.read().get(term).cloned()?;
        data.by_crn.get(crn).cloned()
    }

    pub fn loaded_terms(&self) -> Vec<TermSummary> {
        let mut out: Vec<TermSummary> = self
            .terms
            .read()
            .iter()
            .map(|(term, data)| TermSummary {
                term: term.clone(),
                loaded_at: data.loaded_at,
                sections: data.by_crn.len(),
                courses: data.by_course.len(),
            })
            .collect();
        out.sort_by(|a, b| b.term.cmp(&a.term));
        out
    }
}

impl CourseCatalog for TermCatalog {
    fn sections_for_course(&self, term: &str, key: &CourseKey) -> Vec<Arc<Section>> {
        // clone the term handle and drop the lock before touching the index
        let data = match self.terms.read().get(term) {
            Some(d) => Arc::clone(d),
            None => return Vec::new(),
        };
        data.by_course.get(key).cloned().unwrap_or_default()
    }

    fn course_exists_any_term(&self, key: &CourseKey) -> bool {
        if self.known_courses.read().contains(key) {
            return true;
        }
        self.terms.read().values().any(|d| d.by_course.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(crn: &str, subject: &str, number: &str) -> Section {
        Section {
            crn: crn.to_string(),
            term: "202510".to_string(),
            subject: subject.to_string(),
            course_number: number.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn indexes_sections_by_course_and_crn() {
        let catalog = TermCatalog::new();
        let n = catalog.insert_term(
            "202510",
            vec![section("1", "CSCI", "241"), section("2", "CSCI", "241"), section("3", "MATH", "204")],
        );
        assert_eq!(n, 3);

        let csci = catalog.sections_for_course("202510", &CourseKey::new("CSCI", "241"));
        assert_eq!(csci.len(), 2);
        assert_eq!(catalog.section("202510", "3").map(|s| s.subject.clone()), Some("MATH".to_string()));
        assert!(catalog.section("202510", "99").is_none());
    }

    #[test]
    fn unknown_term_yields_no_sections() {
        let catalog = TermCatalog::new();
        assert!(catalog.sections_for_course("199910", &CourseKey::new("CSCI", "241")).is_empty());
    }

    #[test]
    fn unloaded_term_still_counts_for_existence() {
        let catalog = TermCatalog::new();
        catalog.insert_term("202510", vec![section("1", "CSCI", "241")]);
        assert!(catalog.unload_term("202510"));
        assert!(!catalog.is_term_loaded("202510"));

        let key = CourseKey::new("CSCI", "241");
        assert!(catalog.sections_for_course("202510", &key).is_empty());
        assert!(catalog.course_exists_any_term(&key));
        assert!(!catalog.course_exists_any_term(&CourseKey::new("CSCI", "999")));
    }

    #[test]
    fn registered_courses_satisfy_existence_probe() {
        let catalog = TermCatalog::new();
        catalog.register_known_courses(vec![CourseKey::new("HIST", "101")]);
        assert!(catalog.course_exists_any_term(&CourseKey::new("hist", "101")));
    }

    #[test]
    fn loaded_terms_are_listed_newest_first() {
        let catalog = TermCatalog::new();
        catalog.insert_term("202420", vec![section("1", "CSCI", "241")]);
        catalog.insert_term("202510", vec![]);
        let terms: Vec<String> = catalog.loaded_terms().into_iter().map(|t| t.term).collect();
        assert_eq!(terms, vec!["202510".to_string(), "202420".to_string()]);
    }
}
