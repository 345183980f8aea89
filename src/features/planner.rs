use super::Feature;

/// Orders `requested` so every feature follows its dependencies.
///
/// Request order is kept otherwise; duplicates collapse to one stage.
pub fn plan(requested: &[Feature]) -> Vec<Feature> {
    let mut ordered = Vec::new();
    for &feature in requested {
        visit(feature, &mut ordered);
    }
    ordered
}

fn visit(feature: Feature, ordered: &mut Vec<Feature>) {
    if ordered.contains(&feature) {
        return;
    }
    for &dependency in feature.dependencies() {
        visit(dependency, ordered);
    }
    ordered.push(feature);
}
