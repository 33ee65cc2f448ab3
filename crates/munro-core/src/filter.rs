use crate::types::Munro;

/// Whether `munro` matches an already lower-cased needle on name or SMC section.
fn matches(munro: &Munro, needle: &str) -> bool {
    munro.name.to_lowercase().contains(needle) || munro.smc_section.to_lowercase().contains(needle)
}

/// Indices into `points` of every record matching `term`, in source order.
///
/// A blank term (empty or whitespace only) matches everything. Otherwise the
/// term is compared case-insensitively as a plain substring.
pub fn filter_indices(points: &[Munro], term: &str) -> Vec<usize> {
    if term.trim().is_empty() {
        return (0..points.len()).collect();
    }
    let needle = term.to_lowercase();
    points
        .iter()
        .enumerate()
        .filter(|(_, m)| matches(m, &needle))
        .map(|(i, _)| i)
        .collect()
}

/// Records of `points` matching `term`, in source order.
pub fn filter<'a>(points: &'a [Munro], term: &str) -> Vec<&'a Munro> {
    filter_indices(points, term)
        .into_iter()
        .map(|i| &points[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hill(no: u32, name: &str, section: &str) -> Munro {
        Munro {
            running_no: no,
            name: name.to_string(),
            smc_section: section.to_string(),
            ..Munro::default()
        }
    }

    fn sample() -> Vec<Munro> {
        vec![
            hill(1, "Ben Nevis", "04: Loch Linnhe to Loch Ericht"),
            hill(2, "Ben Lomond", "01: Loch Lomond to Loch Tay"),
            hill(3, "Schiehallion", "05: Loch Ericht to Drumochter"),
        ]
    }

    fn numbers(found: &[&Munro]) -> Vec<u32> {
        found.iter().map(|m| m.running_no).collect()
    }

    #[test]
    fn test_blank_term_returns_everything() {
        let points = sample();
        assert_eq!(numbers(&filter(&points, "")), vec![1, 2, 3]);
        assert_eq!(numbers(&filter(&points, "   ")), vec![1, 2, 3]);
    }

    #[test]
    fn test_ben_scenario() {
        let points = sample();
        let found = filter(&points, "ben");
        assert_eq!(numbers(&found), vec![1, 2]);
    }

    #[test]
    fn test_case_insensitive() {
        let points = sample();
        assert_eq!(
            numbers(&filter(&points, "ben")),
            numbers(&filter(&points, "BEN"))
        );
        assert_eq!(
            numbers(&filter(&points, "bEn")),
            numbers(&filter(&points, "Ben"))
        );
    }

    #[test]
    fn test_matches_section() {
        let points = sample();
        // "Lomond" is in both a name and a section; "ericht" only in sections.
        assert_eq!(numbers(&filter(&points, "ericht")), vec![1, 3]);
        assert_eq!(numbers(&filter(&points, "lomond")), vec![2]);
    }

    #[test]
    fn test_subset_and_order() {
        let points = sample();
        for term in ["", "b", "loch", "e", "zzz", "N"] {
            let idx = filter_indices(&points, term);
            assert!(idx.windows(2).all(|w| w[0] < w[1]), "order kept for {term:?}");
            assert!(idx.iter().all(|&i| i < points.len()));
        }
    }

    #[test]
    fn test_idempotent() {
        let points = sample();
        for term in ["ben", "loch", "", "hall"] {
            let once: Vec<Munro> = filter(&points, term).into_iter().cloned().collect();
            let twice = filter(&once, term);
            assert_eq!(numbers(&once.iter().collect::<Vec<_>>()), numbers(&twice));
        }
    }

    #[test]
    fn test_empty_source() {
        assert!(filter(&[], "ben").is_empty());
        assert!(filter(&[], "").is_empty());
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let points = sample();
        assert!(filter(&points, "bn nevis").is_empty());
        assert!(filter(&points, "nevis ben").is_empty());
    }
}
