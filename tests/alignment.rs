use approx::assert_abs_diff_eq;
use promdetect::alignment::IntervalAligner;
use promdetect::annotations::{
    filter_labels, AnnotationKind, Interval, IntervalTable, LabelInventory, PointEvent, PointTable,
    StartPolicy,
};

fn phones() -> IntervalTable {
    let rows = [
        (26.13, "h", 25.8701),
        (26.16, "E", 26.1301),
        (26.27, "_6", 26.1601),
        (26.36, "k", 26.2701),
        (26.42, "l", 26.3601),
        (26.49, "E:", 26.4201),
        (26.54, "_6", 26.4901),
        (26.62, "t", 26.5401),
        (26.74, "@", 26.6201),
    ];
    IntervalTable::new(
        AnnotationKind::Phones,
        rows.iter()
            .map(|&(end, label, start)| Interval::new(Some(start), end, label))
            .collect(),
    )
}

fn words() -> IntervalTable {
    let rows = [
        (25.87, "bewirken", 25.3501),
        (26.13, "[h]", 25.8701),
        (26.74, "erklärte", 26.1301),
        (27.46, "Außenminister", 26.7401),
    ];
    IntervalTable::new(
        AnnotationKind::Words,
        rows.iter()
            .map(|&(end, label, start)| Interval::new(Some(start), end, label))
            .collect(),
    )
}

const NUCLEI: [f64; 4] = [26.15, 26.29, 26.46, 26.6201];

#[test]
fn vowel_filter_keeps_nucleus_phones() {
    let filtered = filter_labels(&phones()).unwrap();
    assert_eq!(filtered.labels().collect::<Vec<_>>(), ["E", "_6", "E:", "_6", "@"]);
}

#[test]
fn breathing_is_dropped_from_words() {
    let filtered = filter_labels(&words()).unwrap();
    assert_eq!(
        filtered.labels().collect::<Vec<_>>(),
        ["bewirken", "erklärte", "Außenminister"]
    );
}

#[test]
fn nuclei_pick_up_their_phone_and_word() {
    let aligned = IntervalAligner::new(LabelInventory::default())
        .with_phones(&phones())
        .unwrap()
        .with_words(&words())
        .unwrap()
        .align(&NUCLEI);

    let labels: Vec<_> = aligned.iter().map(|n| n.phone.as_deref()).collect();
    assert_eq!(labels, [Some("E"), None, Some("E:"), Some("@")]);
    assert!(aligned.iter().all(|n| n.word.as_deref() == Some("erklärte")));

    let ends: Vec<_> = aligned.iter().map(|n| n.end).collect();
    assert_eq!(ends, [Some(26.16), None, Some(26.49), Some(26.74)]);
    let starts = [26.1301, 26.4201, 26.6201];
    for (nucleus, expected) in [&aligned[0], &aligned[2], &aligned[3]].iter().zip(starts) {
        assert_abs_diff_eq!(nucleus.start_est.unwrap(), expected, epsilon = 1e-9);
    }
    assert_eq!(aligned[1].start_est, None);
    assert_abs_diff_eq!(aligned[0].duration_est.unwrap(), 0.0299, epsilon = 1e-9);
}

#[test]
fn phrases_close_at_boundary_tones() {
    let tones = PointTable::new(
        AnnotationKind::Tones,
        vec![PointEvent::new(25.87, "H-"), PointEvent::new(26.74, "L%")],
    );
    let aligned = IntervalAligner::new(LabelInventory::default())
        .with_tones(&tones, &StartPolicy::default())
        .unwrap()
        .align(&[25.5, 26.46, 27.0]);

    assert_eq!(aligned[0].ip_tone.as_deref(), Some("H-"));
    assert_eq!(aligned[0].ip_start, Some(0.0));
    assert_eq!(aligned[1].ip_tone.as_deref(), Some("L%"));
    assert_abs_diff_eq!(aligned[1].ip_start.unwrap(), 25.871, epsilon = 1e-9);
    assert_eq!(aligned[1].ip_end, Some(26.74));
    assert_eq!(aligned[2].ip_tone, None);
}

#[test]
fn accents_attach_to_the_phone_they_fall_in() {
    let accents = PointTable::new(
        AnnotationKind::Accents,
        vec![PointEvent::new(26.44, "H*"), PointEvent::new(26.7, "L*")],
    );
    let aligned = IntervalAligner::new(LabelInventory::default())
        .with_phones(&phones())
        .unwrap()
        .with_accents(accents)
        .unwrap()
        .align(&NUCLEI);

    assert_eq!(aligned[2].accent.as_deref(), Some("H*"));
    assert_eq!(aligned[2].accent_time, Some(26.44));
    // the L* comes after the last nucleus
    assert_eq!(aligned[3].accent, None);
    assert_eq!(aligned[0].accent, None);
}
