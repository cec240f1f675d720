/// Probability threshold for category assignment.
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Convert per-category probabilities into a category set: every category at
/// or above the threshold, in label-space order. If none qualifies, fall back
/// to the single highest-scoring category (ties broken by first occurrence),
/// so no classified article ends up without a label. Over-labeling at the
/// margin is preferred to articles with zero discoverable category.
pub fn assign(scores: &[(String, f32)], threshold: f32) -> Vec<String> {
    let selected: Vec<String> = scores
        .iter()
        .filter(|(_, probability)| *probability >= threshold)
        .map(|(category, _)| category.clone())
        .collect();
    if !selected.is_empty() {
        return selected;
    }

    let mut best = match scores.first() {
        Some(_) => 0,
        None => return Vec::new(),
    };
    for (index, (_, probability)) in scores.iter().enumerate().skip(1) {
        if *probability > scores[best].1 {
            best = index;
        }
    }
    vec![scores[best].0.clone()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(probabilities: &[f32]) -> Vec<(String, f32)> {
        ["A", "B", "C"]
            .iter()
            .zip(probabilities)
            .map(|(category, p)| (category.to_string(), *p))
            .collect()
    }

    #[test]
    fn test_assign_selects_all_above_threshold_in_order() {
        assert_eq!(
            assign(&scores(&[0.9, 0.2, 0.4]), DEFAULT_THRESHOLD),
            vec!["A", "C"]
        );
    }

    #[test]
    fn test_assign_threshold_is_inclusive() {
        assert_eq!(assign(&scores(&[0.1, 0.3, 0.1]), DEFAULT_THRESHOLD), vec!["B"]);
    }

    #[test]
    fn test_assign_falls_back_to_argmax() {
        assert_eq!(assign(&scores(&[0.1, 0.05, 0.02]), DEFAULT_THRESHOLD), vec!["A"]);
        assert_eq!(assign(&scores(&[0.02, 0.05, 0.1]), DEFAULT_THRESHOLD), vec!["C"]);
    }

    #[test]
    fn test_assign_breaks_ties_by_first_occurrence() {
        assert_eq!(assign(&scores(&[0.1, 0.1, 0.1]), DEFAULT_THRESHOLD), vec!["A"]);
        assert_eq!(assign(&scores(&[0.05, 0.1, 0.1]), DEFAULT_THRESHOLD), vec!["B"]);
    }

    #[test]
    fn test_assign_never_returns_empty_for_nonempty_scores() {
        for probabilities in [[0.0, 0.0, 0.0], [0.29, 0.29, 0.29], [1.0, 1.0, 1.0]] {
            assert!(!assign(&scores(&probabilities), DEFAULT_THRESHOLD).is_empty());
        }
    }
}
