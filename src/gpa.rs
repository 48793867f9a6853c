// Boundary to the external grade-distribution data. Computing GPAs is not this
// crate's job; the generator only asks for per-section annotations.

use std::collections::HashMap;

use crate::models::{CourseKey, Section};

#[derive(Debug, Clone, PartialEq)]
pub struct GpaRecord {
    pub gpa: f64,
    pub source: String,
    pub pass_rate: Option<f64>,
}

pub trait GpaLookup: Send + Sync {
    fn lookup(&self, section: &Section) -> Option<GpaRecord>;
}

/// Used when no grade data is configured: sections keep their own annotations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGpaData;

impl GpaLookup for NoGpaData {
    fn lookup(&self, _section: &Section) -> Option<GpaRecord> {
        None
    }
}

/// Fixed table keyed by course, then optionally narrowed by instructor.
/// Handy for tests and small deployments that ship a pre-computed file.
#[derive(Debug, Default, Clone)]
pub struct StaticGpaTable {
    by_course: HashMap<CourseKey, f64>,
    by_instructor: HashMap<(CourseKey, String), f64>,
}

impl StaticGpaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_course(mut self, key: CourseKey, gpa: f64) -> Self {
        self.by_course.insert(key, gpa);
        self
    }

    pub fn with_instructor(mut self, key: CourseKey, instructor: &str, gpa: f64) -> Self {
        self.by_instructor.insert((key, instructor.to_string()), gpa);
        self
    }
}

impl GpaLookup for StaticGpaTable {
    fn lookup(&self, section: &Section) -> Option<GpaRecord> {
        let key = section.course_key();
        if let Some(gpa) = self.by_instructor.get(&(key.clone(), section.instructor.clone())) {
            return Some(GpaRecord { gpa: *gpa, source: "instructor".to_string(), pass_rate: None });
        }
        self.by_course
            .get(&key)
            .map(|gpa| GpaRecord { gpa: *gpa, source: "course".to_string(), pass_rate: None })
    }
}
