// Wire format for generation results.
//
// Sections repeat heavily across schedules, so each course and section is sent
// once in a dictionary and schedules only carry CRN references.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{CourseResult, GenerateOutcome, GenerateStats, Weight};
use crate::gpa::GpaLookup;
use crate::models::{MeetingTime, Section};

/// Course-level data, sent once per course key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInfo {
    pub subject: String,
    pub course_number: String,
    pub title: String,
    pub credits: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub gpa: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_rate: Option<f64>,
}

/// Section-level data, sent once per CRN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInfo {
    pub crn: String,
    pub term: String,
    pub course_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instructor: String,
    pub enrollment: i32,
    pub max_enrollment: i32,
    pub seats_available: i32,
    pub wait_count: i32,
    pub is_open: bool,
    pub meeting_times: Vec<MeetingTime>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub gpa: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRef {
    pub crns: Vec<String>,
    pub score: f64,
    pub weights: Vec<Weight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub courses: BTreeMap<String, CourseInfo>,
    pub sections: BTreeMap<String, SectionInfo>,
    pub schedules: Vec<ScheduleRef>,
    pub asyncs: Vec<String>,
    pub course_results: Vec<CourseResult>,
    pub stats: GenerateStats,
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

#[derive(Default)]
struct Acc {
    total: f64,
    count: usize,
}

impl Acc {
    fn add(&mut self, v: f64) {
        self.total += v;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

struct Dedup<'a> {
    gpa: &'a dyn GpaLookup,
    courses: BTreeMap<String, CourseInfo>,
    sections: BTreeMap<String, SectionInfo>,
}

impl Dedup<'_> {
    /// Records `section` (and its course) unless already present; returns its CRN.
    fn add(&mut self, section: &Section) -> String {
        let course_key = section.course_key().to_string();
        self.courses.entry(course_key.clone()).or_insert_with(|| CourseInfo {
            subject: section.subject.clone(),
            course_number: section.course_number.clone(),
            title: section.title.clone(),
            credits: section.credits,
            gpa: 0.0,
            pass_rate: None,
        });

        if !self.sections.contains_key(&section.crn) {
            let (gpa, gpa_source, pass_rate) = match self.gpa.lookup(section) {
                Some(rec) => (rec.gpa, Some(rec.source), rec.pass_rate.or(section.pass_rate)),
                None => (section.gpa, section.gpa_source.clone(), section.pass_rate),
            };
            self.sections.insert(
                section.crn.clone(),
                SectionInfo {
                    crn: section.crn.clone(),
                    term: section.term.clone(),
                    course_key,
                    instructor: section.instructor.clone(),
                    enrollment: section.enrollment,
                    max_enrollment: section.max_enrollment,
                    seats_available: section.seats_available,
                    wait_count: section.wait_count,
                    is_open: section.is_open,
                    meeting_times: section.meeting_times.clone(),
                    gpa,
                    gpa_source,
                    pass_rate,
                },
            );
        }
        section.crn.clone()
    }

    /// Course GPA = mean of the non-zero section GPAs. Courses without any GPA
    /// fall back to the mean pass rate of their sections.
    fn fill_course_averages(&mut self) {
        let mut gpas: BTreeMap<&str, Acc> = BTreeMap::new();
        let mut pass_rates: BTreeMap<&str, Acc> = BTreeMap::new();
        for sec in self.sections.values() {
            if sec.gpa > 0.0 {
                gpas.entry(sec.course_key.as_str()).or_default().add(sec.gpa);
            } else if let Some(pr) = sec.pass_rate {
                pass_rates.entry(sec.course_key.as_str()).or_default().add(pr);
            }
        }

        for (key, course) in self.courses.iter_mut() {
            if let Some(gpa) = gpas.get(key.as_str()).and_then(Acc::mean) {
                course.gpa = gpa;
            } else if let Some(pr) = pass_rates.get(key.as_str()).and_then(Acc::mean) {
                course.pass_rate = Some(pr);
            }
        }
    }
}

impl ScheduleResponse {
    /// Truncates `outcome.schedules` to `response_cap` and deduplicates the
    /// sections they reference. `stats.total_generated` keeps the
    /// pre-truncation count.
    pub fn assemble(outcome: GenerateOutcome, response_cap: usize, gpa: &dyn GpaLookup) -> Self {
        let mut dedup = Dedup { gpa, courses: BTreeMap::new(), sections: BTreeMap::new() };

        let returned = outcome.schedules.len().min(response_cap);
        let mut schedules = Vec::with_capacity(returned);
        for sched in outcome.schedules.into_iter().take(response_cap) {
            let crns = sched.sections.iter().map(|s| dedup.add(s)).collect();
            schedules.push(ScheduleRef { crns, score: sched.score, weights: sched.weights });
        }

        let asyncs: Vec<String> = outcome.asyncs.iter().map(|s: &Arc<Section>| dedup.add(s)).collect();
        dedup.fill_course_averages();

        ScheduleResponse {
            courses: dedup.courses,
            sections: dedup.sections,
            schedules,
            asyncs,
            course_results: outcome.course_results,
            stats: outcome.stats,
        }
    }
}
