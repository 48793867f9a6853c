use std::collections::BTreeSet;
use std::sync::Arc;

use schedule_planner::catalog::{CourseCatalog, TermCatalog};
use schedule_planner::generator::{
    CancelToken, CourseSpec, CourseStatus, GenerateRequest, GeneratorLimits, GeneratorService, TimeMask,
};
use schedule_planner::gpa::NoGpaData;
use schedule_planner::models::{BlockedTime, CourseKey, MeetingTime, Section};

const TERM: &str = "202510";
const MON: [bool; 7] = [false, true, false, false, false, false, false];
const WED: [bool; 7] = [false, false, false, true, false, false, false];

fn section(crn: &str, subject: &str, number: &str, days: [bool; 7], start: &str, end: &str) -> Section {
    Section {
        crn: crn.into(),
        term: TERM.into(),
        subject: subject.into(),
        course_number: number.into(),
        title: format!("{} {}", subject, number),
        credits: 4,
        meeting_times: vec![MeetingTime {
            days,
            start_time: start.into(),
            end_time: end.into(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn spec(subject: &str, number: &str, required: bool) -> CourseSpec {
    CourseSpec {
        subject: subject.into(),
        course_number: number.into(),
        required,
        allowed_section_ids: None,
    }
}

fn request(courses: Vec<CourseSpec>, min: usize, max: usize) -> GenerateRequest {
    GenerateRequest {
        term: TERM.into(),
        courses,
        blocked_times: Vec::new(),
        min_courses: min,
        max_courses: max,
    }
}

fn service(sections: Vec<Section>) -> (Arc<TermCatalog>, GeneratorService) {
    let catalog = Arc::new(TermCatalog::new());
    catalog.insert_term(TERM, sections);
    let svc = GeneratorService::new(catalog.clone(), Arc::new(NoGpaData), GeneratorLimits::default());
    (catalog, svc)
}

fn crn_sets(svc: &GeneratorService, req: &GenerateRequest) -> BTreeSet<BTreeSet<String>> {
    svc.generate(req, &CancelToken::new())
        .schedules
        .iter()
        .map(|s| s.crns().into_iter().map(String::from).collect())
        .collect()
}

fn set(crns: &[&str]) -> BTreeSet<String> {
    crns.iter().map(|c| c.to_string()).collect()
}

#[test]
fn required_with_compatible_optional() {
    let (_, svc) = service(vec![
        section("R1", "CSCI", "241", MON, "0800", "0900"),
        section("O1", "MATH", "204", MON, "0900", "1000"),
    ]);
    let req = request(vec![spec("CSCI", "241", true), spec("MATH", "204", false)], 1, 2);
    let expected: BTreeSet<_> = [set(&["R1"]), set(&["R1", "O1"])].into_iter().collect();
    assert_eq!(crn_sets(&svc, &req), expected);
}

#[test]
fn overlapping_optional_is_left_out() {
    let (_, svc) = service(vec![
        section("R1", "CSCI", "241", MON, "0800", "0900"),
        section("O1", "MATH", "204", MON, "0830", "0930"),
    ]);
    let req = request(vec![spec("CSCI", "241", true), spec("MATH", "204", false)], 1, 2);
    let expected: BTreeSet<_> = [set(&["R1"])].into_iter().collect();
    assert_eq!(crn_sets(&svc, &req), expected);
}

#[test]
fn blocked_time_covering_required_course() {
    let (_, svc) = service(vec![
        section("R1", "CSCI", "241", MON, "0800", "0900"),
        section("O1", "MATH", "204", WED, "0900", "1000"),
    ]);
    let mut req = request(vec![spec("CSCI", "241", true), spec("MATH", "204", false)], 1, 2);
    req.blocked_times.push(BlockedTime { day: 0, start_time: "0800".into(), end_time: "0900".into() });

    let outcome = svc.generate(&req, &CancelToken::new());
    assert!(outcome.schedules.is_empty());
    assert_eq!(outcome.stats.total_generated, 0);
    let r = &outcome.course_results[0];
    assert_eq!(r.name, "CSCI:241");
    assert_eq!(r.status, CourseStatus::Blocked);
    assert_eq!(r.count, None);
}

#[test]
fn async_section_is_listed_but_never_scheduled() {
    let mut online = section("A1", "CSCI", "241", MON, "", "");
    online.title = "Online".into();
    let (_, svc) = service(vec![
        online,
        section("R1", "CSCI", "241", MON, "0800", "0900"),
        section("O1", "MATH", "204", WED, "0900", "1000"),
    ]);
    let req = request(vec![spec("CSCI", "241", false), spec("MATH", "204", false)], 1, 2);

    let resp = svc.generate_response(&req, &CancelToken::new());
    assert_eq!(resp.asyncs, vec!["A1"]);
    assert!(resp.schedules.iter().all(|s| !s.crns.iter().any(|c| c == "A1")));
    assert_eq!(resp.schedules.len(), 3);
    assert!(resp.sections.contains_key("A1"));
}

#[test]
fn missing_required_course_short_circuits() {
    let (catalog, svc) = service(vec![section("O1", "MATH", "204", WED, "0900", "1000")]);
    catalog.register_known_courses([CourseKey::new("PHYS", "161")]);

    let req = request(
        vec![spec("PHYS", "161", true), spec("MATH", "204", false), spec("XXXX", "999", false)],
        1,
        3,
    );
    let outcome = svc.generate(&req, &CancelToken::new());
    assert!(outcome.schedules.is_empty());

    let statuses: Vec<CourseStatus> = outcome.course_results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![CourseStatus::NotOffered, CourseStatus::Found, CourseStatus::Unknown]);
}

#[test]
fn schedules_come_back_best_first_and_conflict_free() {
    let (catalog, svc) = service(vec![
        section("A1", "CSCI", "241", MON, "0800", "0900"),
        section("A2", "CSCI", "241", MON, "1300", "1400"),
        section("B1", "MATH", "204", MON, "0830", "0930"),
        section("B2", "MATH", "204", MON, "1400", "1500"),
        section("C1", "HIST", "101", WED, "1000", "1100"),
    ]);
    let req = request(
        vec![spec("CSCI", "241", false), spec("MATH", "204", false), spec("HIST", "101", false)],
        1,
        3,
    );
    let outcome = svc.generate(&req, &CancelToken::new());
    assert!(!outcome.schedules.is_empty());

    for pair in outcome.schedules.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for sched in &outcome.schedules {
        let mut mask = TimeMask::EMPTY;
        for crn in sched.crns() {
            let sec = catalog.section(TERM, crn).expect("section in catalog");
            let m = TimeMask::from_meetings(&sec.meeting_times);
            assert!(!mask.conflicts(&m), "conflict in {:?}", sched.crns());
            mask = mask.merge(&m);
        }
    }
}

#[test]
fn response_cap_truncates_but_reports_total() {
    let sections: Vec<Section> = (0..6)
        .map(|i| {
            let start = format!("{:02}00", 8 + i);
            let end = format!("{:02}50", 8 + i);
            section(&format!("S{}", i), "CSCI", "241", MON, &start, &end)
        })
        .collect();
    let catalog = Arc::new(TermCatalog::new());
    catalog.insert_term(TERM, sections);
    let limits = GeneratorLimits { response_cap: 2, ..GeneratorLimits::default() };
    let svc = GeneratorService::new(catalog.clone(), Arc::new(NoGpaData), limits);

    let resp = svc.generate_response(&request(vec![spec("CSCI", "241", false)], 0, 0), &CancelToken::new());
    assert_eq!(resp.schedules.len(), 2);
    assert_eq!(resp.stats.total_generated, 6);
    assert_eq!(resp.sections.len(), 2);
    assert_eq!(resp.courses.len(), 1);
}

#[test]
fn cancelled_request_returns_empty_outcome() {
    let (_, svc) = service(vec![section("R1", "CSCI", "241", MON, "0800", "0900")]);
    let token = CancelToken::new();
    token.cancel();
    let outcome = svc.generate(&request(vec![spec("CSCI", "241", false)], 0, 0), &token);
    assert!(outcome.schedules.is_empty());
    assert_eq!(outcome.course_results[0].status, CourseStatus::Found);
}

#[test]
fn catalog_is_shared_through_the_trait() {
    let (catalog, _) = service(vec![section("R1", "CSCI", "241", MON, "0800", "0900")]);
    let dyn_catalog: Arc<dyn CourseCatalog> = catalog;
    assert_eq!(dyn_catalog.sections_for_course(TERM, &CourseKey::new("csci", "241")).len(), 1);
    assert!(dyn_catalog.sections_for_course("199910", &CourseKey::new("CSCI", "241")).is_empty());
}

#[test]
fn repeated_course_counts_once_toward_default_bounds() {
    let (_, svc) = service(vec![section("R1", "CSCI", "241", MON, "0800", "0900")]);

    let single = svc.generate(&request(vec![spec("CSCI", "241", true)], 0, 0), &CancelToken::new());
    let repeated = svc.generate(
        &request(vec![spec("CSCI", "241", true), spec("csci", "241", false)], 0, 0),
        &CancelToken::new(),
    );

    assert_eq!(single.schedules.len(), 1);
    assert_eq!(repeated.schedules.len(), single.schedules.len());
    assert_eq!(repeated.course_results.len(), 1);
    assert_eq!(repeated.course_results[0].status, CourseStatus::Found);
}

#[test]
fn course_code_in_subject_field_is_resolved() {
    let (_, svc) = service(vec![section("R1", "CSCI", "241", MON, "0800", "0900")]);
    let outcome = svc.generate(&request(vec![spec("csci241", "", true)], 0, 0), &CancelToken::new());
    assert_eq!(outcome.schedules.len(), 1);
    assert_eq!(outcome.course_results[0].name, "CSCI:241");
}
