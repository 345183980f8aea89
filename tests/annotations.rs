use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use promdetect::annotations::{
    read_annotation, AnnotationKind, AnnotationTable, Gender, SpeakerRegistry, StartPolicy,
};
use promdetect::PromError;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn read(name: &str) -> AnnotationTable {
    read_annotation(&fixture(&format!("annotations/{name}")), &StartPolicy::default()).unwrap()
}

#[test]
fn accents_are_point_events() {
    let table = read("test.accents");
    assert_eq!(table.kind(), AnnotationKind::Accents);
    let points = table.into_points().unwrap();
    assert_eq!(points.len(), 2);
    assert_abs_diff_eq!(points.rows()[0].time, 17.748754, epsilon = 1e-9);
    assert_eq!(points.rows()[0].label, "H*L");
    assert_eq!(points.rows()[1].label, "H*");
}

#[test]
fn words_get_estimated_starts_and_plain_umlauts() {
    let words = read("test.words").into_intervals().unwrap();
    assert_eq!(words.len(), 3);
    assert_eq!(
        words.labels().collect::<Vec<_>>(),
        ["das", "könnte", "Außenminister"]
    );
    let rows = words.rows();
    assert_eq!(rows[0].start_est, Some(0.0));
    assert_abs_diff_eq!(rows[1].start_est.unwrap(), 0.351, epsilon = 1e-9);
    assert_abs_diff_eq!(rows[2].end, 1.3, epsilon = 1e-9);
}

#[test]
fn phones_read_as_intervals() {
    let phones = read("test.phones").into_intervals().unwrap();
    assert_eq!(phones.len(), 5);
    assert_eq!(phones.kind(), AnnotationKind::Phones);
    let legacy = read_annotation(
        &fixture("annotations/test.phones"),
        &StartPolicy::legacy(),
    )
    .unwrap()
    .into_intervals()
    .unwrap();
    assert_eq!(legacy.rows()[0].start_est, None);
    assert_abs_diff_eq!(legacy.rows()[1].start_est.unwrap(), 0.13, epsilon = 1e-9);
}

#[test]
fn tones_are_points_not_intervals() {
    let table = read("test.tones");
    assert!(matches!(
        table.clone().into_intervals(),
        Err(PromError::Schema { .. })
    ));
    assert_eq!(table.into_points().unwrap().rows()[1].label, "L%");
}

#[test]
fn phrase_files_are_unsupported() {
    let result = read_annotation(
        &fixture("annotations/test.phrases"),
        &StartPolicy::default(),
    );
    assert!(matches!(result, Err(PromError::UnsupportedAnnotation(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = read_annotation(Path::new("does/not/exist.accents"), &StartPolicy::default());
    assert!(matches!(result, Err(PromError::Io { .. })));
}

#[test]
fn speaker_lookup_reads_id_and_gender() {
    let registry = SpeakerRegistry::load(&fixture("speakers.txt")).unwrap();
    let speaker = registry.lookup("200703260600").unwrap();
    assert_eq!(speaker.speaker_id, "2");
    assert_eq!(speaker.gender, Gender::Female);
    assert_eq!(registry.lookup("200703271500").unwrap().gender, Gender::Male);
    assert!(matches!(
        registry.lookup("notarealid2005-08-20-1500"),
        Err(PromError::Input { .. })
    ));
}
