use chrono::NaiveDate;

use super::common::*;
use crate::portal::domain::{Grade, GradeBand, NewSubject, Subject, SubjectId};
use crate::portal::enrollment::domain::StudentEnrollmentRequest;
use crate::portal::enrollment::guard::{EnrollmentGuard, EnrollmentViolation};
use crate::portal::enrollment::policy::EnrollmentPolicy;
use crate::portal::memory::InMemoryPortalGateway;
use crate::portal::gateway::PortalGateway;

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
}

fn guard() -> EnrollmentGuard {
    EnrollmentGuard::with_policy(EnrollmentPolicy::default())
}

fn pool() -> Vec<Subject> {
    let gateway = InMemoryPortalGateway::new();
    let mut subjects = senior_pool(&gateway);
    subjects.extend(seed_subjects(&gateway, Grade::Grade7, &["General Science"]));
    subjects
}

#[test]
fn senior_accepts_exactly_four_known_subjects() {
    let subjects = pool();
    let request = student_request(
        11,
        NaiveDate::from_ymd_opt(2008, 6, 1).expect("valid dob"),
        &subjects[..4],
    );

    let normalized = guard()
        .validate_student(&request, &subjects, fixed_today())
        .expect("four known subjects validate");

    assert_eq!(normalized.grade, Grade::Grade11);
    assert_eq!(normalized.subject_ids.len(), 4);
    assert!(normalized.can_join_subject_channels, "a 17 year old may join");
}

#[test]
fn senior_rejects_wrong_subject_count() {
    let subjects = pool();
    let request = student_request(
        11,
        NaiveDate::from_ymd_opt(2008, 6, 1).expect("valid dob"),
        &subjects[..3],
    );

    match guard().validate_student(&request, &subjects, fixed_today()) {
        Err(EnrollmentViolation::SubjectCountMismatch { expected, actual }) => {
            assert_eq!(expected, 4);
            assert_eq!(actual, 3);
        }
        other => panic!("expected count mismatch, got {other:?}"),
    }
}

#[test]
fn senior_duplicates_collapse_before_counting() {
    let subjects = pool();
    let mut request = student_request(
        11,
        NaiveDate::from_ymd_opt(2008, 6, 1).expect("valid dob"),
        &subjects[..4],
    );
    request.selected_subject_ids[3] = request.selected_subject_ids[0];

    match guard().validate_student(&request, &subjects, fixed_today()) {
        Err(EnrollmentViolation::SubjectCountMismatch { actual, .. }) => assert_eq!(actual, 3),
        other => panic!("expected count mismatch, got {other:?}"),
    }
}

#[test]
fn senior_rejects_unknown_subject() {
    let subjects = pool();
    let mut request = student_request(
        11,
        NaiveDate::from_ymd_opt(2008, 6, 1).expect("valid dob"),
        &subjects[..4],
    );
    request.selected_subject_ids[0] = SubjectId(9999);

    match guard().validate_student(&request, &subjects, fixed_today()) {
        Err(EnrollmentViolation::UnknownSubject(id)) => assert_eq!(id, SubjectId(9999)),
        other => panic!("expected unknown subject, got {other:?}"),
    }
}

#[test]
fn senior_rejects_subject_from_another_grade() {
    let subjects = pool();
    let junior = subjects
        .iter()
        .find(|subject| subject.grade == Grade::Grade7)
        .expect("junior subject seeded");
    let mut request = student_request(
        11,
        NaiveDate::from_ymd_opt(2008, 6, 1).expect("valid dob"),
        &subjects[..4],
    );
    request.selected_subject_ids[0] = junior.id;

    match guard().validate_student(&request, &subjects, fixed_today()) {
        Err(EnrollmentViolation::UnknownSubject(id)) => assert_eq!(id, junior.id),
        other => panic!("expected unknown subject, got {other:?}"),
    }
}

#[test]
fn junior_receives_full_pool_regardless_of_selection() {
    let gateway = InMemoryPortalGateway::new();
    let junior_pool = seed_subjects(
        &gateway,
        Grade::Grade6,
        &["Mathematics", "Science", "Reading", "Art", "Music", "History"],
    );
    let senior = seed_subjects(&gateway, Grade::Grade11, &["Physics"]);

    let mut all = junior_pool.clone();
    all.extend(senior);

    // Client tries to hand-pick a single subject; the policy overrules it.
    let request = student_request(
        6,
        NaiveDate::from_ymd_opt(2015, 1, 20).expect("valid dob"),
        &junior_pool[..1],
    );

    let normalized = guard()
        .validate_student(&request, &all, fixed_today())
        .expect("junior enrollment validates");

    assert_eq!(normalized.subject_ids.len(), junior_pool.len());
    for subject in &junior_pool {
        assert!(normalized.subject_ids.contains(&subject.id));
    }
}

#[test]
fn grades_outside_range_are_rejected() {
    let subjects = pool();
    for bad_grade in [0u8, 3, 13, 255] {
        let request = student_request(
            bad_grade,
            NaiveDate::from_ymd_opt(2010, 1, 1).expect("valid dob"),
            &subjects[..4],
        );
        match guard().validate_student(&request, &subjects, fixed_today()) {
            Err(EnrollmentViolation::InvalidGrade { grade }) => assert_eq!(grade, bad_grade),
            other => panic!("expected invalid grade for {bad_grade}, got {other:?}"),
        }
    }
}

#[test]
fn channel_flag_flips_exactly_on_the_twelfth_birthday() {
    let gateway = InMemoryPortalGateway::new();
    let junior_pool = seed_subjects(&gateway, Grade::Grade6, &["Mathematics", "Science"]);
    let today = fixed_today();

    // Twelve years old today: the birthday counts.
    let on_birthday = StudentEnrollmentRequest {
        grade: 6,
        date_of_birth: NaiveDate::from_ymd_opt(2014, 3, 14).expect("valid dob"),
        selected_subject_ids: Vec::new(),
    };
    let normalized = guard()
        .validate_student(&on_birthday, &junior_pool, today)
        .expect("validates");
    assert!(normalized.can_join_subject_channels);

    // Birthday tomorrow: still eleven.
    let day_short = StudentEnrollmentRequest {
        grade: 6,
        date_of_birth: NaiveDate::from_ymd_opt(2014, 3, 15).expect("valid dob"),
        selected_subject_ids: Vec::new(),
    };
    let normalized = guard()
        .validate_student(&day_short, &junior_pool, today)
        .expect("validates");
    assert!(!normalized.can_join_subject_channels);
}

#[test]
fn tutor_requires_at_least_one_subject() {
    let subjects = pool();
    let request = tutor_request(GradeBand::Senior, &[]);

    match guard().validate_tutor(&request, &subjects) {
        Err(EnrollmentViolation::NoSubjectsSelected) => {}
        other => panic!("expected no subjects selected, got {other:?}"),
    }
}

#[test]
fn tutor_selection_is_capped() {
    let gateway = InMemoryPortalGateway::new();
    let subjects = seed_subjects(
        &gateway,
        Grade::Grade10,
        &["Mathematics", "Physics", "Chemistry", "Biology", "English"],
    );
    let request = tutor_request(GradeBand::Senior, &subjects);

    match guard().validate_tutor(&request, &subjects) {
        Err(EnrollmentViolation::SubjectCountMismatch { expected, actual }) => {
            assert_eq!(expected, 4);
            assert_eq!(actual, 5);
        }
        other => panic!("expected cap violation, got {other:?}"),
    }
}

#[test]
fn tutor_cap_is_configurable() {
    let gateway = InMemoryPortalGateway::new();
    let subjects = seed_subjects(
        &gateway,
        Grade::Grade10,
        &["Mathematics", "Physics", "Chemistry", "Biology", "English"],
    );
    let permissive = EnrollmentGuard::with_policy(EnrollmentPolicy::new(4, 6, 12));
    let request = tutor_request(GradeBand::Senior, &subjects);

    let normalized = permissive
        .validate_tutor(&request, &subjects)
        .expect("five subjects fit the raised cap");
    assert_eq!(normalized.subject_ids.len(), 5);
}

#[test]
fn tutor_rejects_subject_outside_band() {
    let gateway = InMemoryPortalGateway::new();
    let mut subjects = seed_subjects(&gateway, Grade::Grade10, &["Mathematics"]);
    subjects.extend(seed_subjects(&gateway, Grade::Grade5, &["Reading"]));

    let request = tutor_request(GradeBand::Senior, &subjects);
    match guard().validate_tutor(&request, &subjects) {
        Err(EnrollmentViolation::UnknownSubject(id)) => {
            assert_eq!(id, subjects[1].id);
        }
        other => panic!("expected unknown subject, got {other:?}"),
    }
}

#[test]
fn junior_pool_filter_only_covers_the_requested_grade() {
    let gateway = InMemoryPortalGateway::new();
    let sixth = seed_subjects(&gateway, Grade::Grade6, &["Mathematics", "Science"]);
    let seventh = seed_subjects(&gateway, Grade::Grade7, &["Mathematics", "Science"]);

    let mut all = sixth.clone();
    all.extend(seventh.clone());

    let request = StudentEnrollmentRequest {
        grade: 6,
        date_of_birth: NaiveDate::from_ymd_opt(2014, 1, 1).expect("valid dob"),
        selected_subject_ids: Vec::new(),
    };
    let normalized = guard()
        .validate_student(&request, &all, fixed_today())
        .expect("validates");

    assert_eq!(normalized.subject_ids.len(), sixth.len());
    for subject in &seventh {
        assert!(!normalized.subject_ids.contains(&subject.id));
    }
}

#[test]
fn subject_seeding_helper_respects_uniqueness() {
    let gateway = InMemoryPortalGateway::new();
    seed_subjects(&gateway, Grade::Grade9, &["Algebra"]);
    let duplicate = gateway.insert_subject(NewSubject {
        name: "algebra".to_string(),
        grade: Grade::Grade9,
    });
    assert!(duplicate.is_err(), "same name within a grade conflicts");
}
