// Resolves requested courses to candidate sections and filters them before
// the search: allowed-CRN lists, async detection, blocked times.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::mask::TimeMask;
use super::{CourseResult, CourseSpec, CourseStatus};
use crate::catalog::CourseCatalog;
use crate::models::{CourseKey, Section};

/// A section paired with its precomputed weekly mask.
#[derive(Debug, Clone)]
pub struct SectionData {
    pub section: Arc<Section>,
    pub mask: TimeMask,
}

impl SectionData {
    pub fn new(section: Arc<Section>) -> Self {
        let mask = TimeMask::from_meetings(&section.meeting_times);
        SectionData { section, mask }
    }
}

/// All schedulable sections of one course.
#[derive(Debug, Clone)]
pub struct CourseGroup {
    pub key: CourseKey,
    pub sections: Vec<SectionData>,
}

#[derive(Debug, Default)]
pub struct GroupedCourses {
    /// Required groups first, then optional ones; each part sorted by section count.
    pub groups: Vec<CourseGroup>,
    /// How many leading entries of `groups` are required.
    pub required: usize,
    /// Some required course produced no group, so no schedule can exist.
    pub missing_required: bool,
    pub asyncs: Vec<Arc<Section>>,
    pub results: Vec<CourseResult>,
}

#[derive(Default)]
struct Tally {
    asyncs: usize,
    blocked: usize,
    filtered: usize,
}

impl Tally {
    fn status(&self, schedulable: usize) -> CourseStatus {
        if schedulable > 0 {
            CourseStatus::Found
        } else if self.asyncs > 0 {
            CourseStatus::AsyncOnly
        } else if self.blocked > 0 {
            CourseStatus::Blocked
        } else if self.filtered > 0 {
            CourseStatus::CrnFiltered
        } else {
            CourseStatus::NotOffered
        }
    }
}

/// Builds the course groups for `specs` in `term`. Duplicate course keys are
/// processed once (first entry wins), so `results` holds one entry per
/// distinct course.
pub fn build_groups(
    catalog: &dyn CourseCatalog,
    term: &str,
    specs: &[CourseSpec],
    blocked: &TimeMask,
) -> GroupedCourses {
    let mut out = GroupedCourses::default();
    let mut required: Vec<CourseGroup> = Vec::new();
    let mut optional: Vec<CourseGroup> = Vec::new();
    let mut seen: HashSet<CourseKey> = HashSet::new();

    if !blocked.is_empty() {
        debug!(slots = blocked.count_slots(), "filtering against blocked times");
    }

    for spec in specs {
        let Some(key) = spec.course_key() else {
            out.results.push(CourseResult {
                name: spec.subject.trim().to_uppercase(),
                status: CourseStatus::Unknown,
                count: None,
            });
            out.missing_required |= spec.required;
            continue;
        };
        if !seen.insert(key.clone()) {
            continue;
        }

        let candidates = catalog.sections_for_course(term, &key);
        if candidates.is_empty() {
            let status = if catalog.course_exists_any_term(&key) {
                CourseStatus::NotOffered
            } else {
                CourseStatus::Unknown
            };
            out.results.push(CourseResult { name: key.to_string(), status, count: None });
            out.missing_required |= spec.required;
            continue;
        }

        let allowed: Option<HashSet<&str>> = spec
            .allowed_section_ids
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.trim()).collect());

        let mut tally = Tally::default();
        let mut sections = Vec::new();
        for section in candidates {
            if let Some(allowed) = &allowed {
                if !allowed.contains(section.crn.as_str()) {
                    tally.filtered += 1;
                    continue;
                }
            }
            if section.is_async() {
                tally.asyncs += 1;
                out.asyncs.push(section);
                continue;
            }
            let data = SectionData::new(section);
            if blocked.conflicts(&data.mask) {
                tally.blocked += 1;
                continue;
            }
            sections.push(data);
        }

        let status = tally.status(sections.len());
        debug!(
            course = %key,
            schedulable = sections.len(),
            asyncs = tally.asyncs,
            blocked = tally.blocked,
            filtered = tally.filtered,
            "grouped course"
        );
        out.results.push(CourseResult {
            name: key.to_string(),
            status,
            count: (status == CourseStatus::Found).then_some(sections.len()),
        });

        if sections.is_empty() {
            out.missing_required |= spec.required;
            continue;
        }
        let group = CourseGroup { key, sections };
        if spec.required {
            required.push(group);
        } else {
            optional.push(group);
        }
    }

    // most constrained course first: fewer branches near the root
    required.sort_by_key(|g| g.sections.len());
    optional.sort_by_key(|g| g.sections.len());

    out.required = required.len();
    out.groups = required;
    out.groups.extend(optional);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TermCatalog;
    use crate::models::{BlockedTime, MeetingTime};

    const TERM: &str = "202510";

    fn sec(crn: &str, subject: &str, number: &str, start: &str, end: &str) -> Section {
        Section {
            crn: crn.into(),
            term: TERM.into(),
            subject: subject.into(),
            course_number: number.into(),
            meeting_times: vec![MeetingTime {
                days: [false, true, false, true, false, false, false],
                start_time: start.into(),
                end_time: end.into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn spec(subject: &str, number: &str, required: bool) -> CourseSpec {
        CourseSpec { subject: subject.into(), course_number: number.into(), required, allowed_section_ids: None }
    }

    fn catalog() -> TermCatalog {
        let c = TermCatalog::new();
        c.insert_term(
            TERM,
            vec![
                sec("1", "CSCI", "241", "0800", "0850"),
                sec("2", "CSCI", "241", "1000", "1050"),
                sec("3", "CSCI", "241", "", ""),
                sec("4", "MATH", "204", "0800", "0850"),
                sec("5", "ONLN", "100", "", ""),
                sec("6", "PHYS", "161", "1300", "1350"),
            ],
        );
        c.register_known_courses(vec![CourseKey::new("HIST", "101")]);
        c
    }

    fn status_of(g: &GroupedCourses, name: &str) -> CourseStatus {
        g.results.iter().find(|r| r.name == name).map(|r| r.status).expect("course result")
    }

    #[test]
    fn splits_async_sections_from_schedulable_ones() {
        let c = catalog();
        let g = build_groups(&c, TERM, &[spec("CSCI", "241", true)], &TimeMask::EMPTY);
        assert_eq!(g.groups.len(), 1);
        assert_eq!(g.groups[0].sections.len(), 2);
        assert_eq!(g.asyncs.len(), 1);
        assert_eq!(g.asyncs[0].crn, "3");
        assert_eq!(g.results[0].count, Some(2));
        assert_eq!(status_of(&g, "CSCI:241"), CourseStatus::Found);
    }

    #[test]
    fn classifies_missing_courses() {
        let c = catalog();
        let g = build_groups(
            &c,
            TERM,
            &[spec("HIST", "101", false), spec("XXXX", "999", false), spec("ONLN", "100", false)],
            &TimeMask::EMPTY,
        );
        assert!(g.groups.is_empty());
        assert_eq!(status_of(&g, "HIST:101"), CourseStatus::NotOffered);
        assert_eq!(status_of(&g, "XXXX:999"), CourseStatus::Unknown);
        assert_eq!(status_of(&g, "ONLN:100"), CourseStatus::AsyncOnly);
        assert!(!g.missing_required);
    }

    #[test]
    fn blocked_times_remove_sections() {
        let c = catalog();
        let blocked = TimeMask::from_blocked_times(&[BlockedTime {
            day: 0,
            start_time: "0800".into(),
            end_time: "0900".into(),
        }]);
        let g = build_groups(&c, TERM, &[spec("MATH", "204", true), spec("CSCI", "241", false)], &blocked);
        assert_eq!(status_of(&g, "MATH:204"), CourseStatus::Blocked);
        assert!(g.missing_required);
        assert_eq!(g.required, 0);
        assert_eq!(g.groups.len(), 1);
        assert_eq!(g.groups[0].sections.len(), 1);
        assert_eq!(g.groups[0].sections[0].section.crn, "2");
    }

    #[test]
    fn allowed_sections_filter_before_async_check() {
        let c = catalog();
        let mut s = spec("CSCI", "241", false);
        s.allowed_section_ids = Some(vec!["2".into()]);
        let g = build_groups(&c, TERM, &[s], &TimeMask::EMPTY);
        assert_eq!(g.groups[0].sections.len(), 1);
        assert!(g.asyncs.is_empty());

        let mut none = spec("MATH", "204", false);
        none.allowed_section_ids = Some(vec!["999".into()]);
        let g = build_groups(&c, TERM, &[none], &TimeMask::EMPTY);
        assert_eq!(status_of(&g, "MATH:204"), CourseStatus::CrnFiltered);
    }

    #[test]
    fn required_groups_lead_and_each_half_is_sorted() {
        let c = catalog();
        let g = build_groups(
            &c,
            TERM,
            &[spec("CSCI", "241", false), spec("PHYS", "161", false), spec("CSCI", "241", true), spec("MATH", "204", true)],
            &TimeMask::EMPTY,
        );
        // the duplicate CSCI entry is ignored, so CSCI stays optional
        assert_eq!(g.required, 1);
        let order: Vec<String> = g.groups.iter().map(|gr| gr.key.to_string()).collect();
        assert_eq!(order, vec!["MATH:204", "PHYS:161", "CSCI:241"]);
    }

    #[test]
    fn combined_codes_resolve_to_the_same_course() {
        let c = catalog();
        let g = build_groups(
            &c,
            TERM,
            &[spec("csci 241", "", true), spec("CSCI", "241", false), spec("PHYS", "", false)],
            &TimeMask::EMPTY,
        );
        assert_eq!(g.results.len(), 2);
        assert_eq!(status_of(&g, "CSCI:241"), CourseStatus::Found);
        assert_eq!(status_of(&g, "PHYS"), CourseStatus::Unknown);
        assert_eq!(g.required, 1);
        assert!(!g.missing_required);
    }
}
