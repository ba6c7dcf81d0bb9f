//! All-to-all source pairs and relative astrometry.
//!
//! Relative astrometric accuracy is judged on pairs of matched sources: the
//! separation measured between two detections is compared with the
//! separation of their reference counterparts. Only pairs whose reference
//! separation falls inside a [`SeparationBand`] contribute, so small- and
//! large-scale distortions can be checked independently.

use crate::algo::crossmatch::MatchedPair;
use crate::sky::{radians_to_mas, Equatorial};
use crate::units::{Angle, AngleExt};
use log::warn;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Annulus of pair separations: `center ± half_width`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeparationBand {
    pub center: Angle,
    pub half_width: Angle,
}

impl SeparationBand {
    pub fn new(center: Angle, half_width: Angle) -> Result<Self, String> {
        let c = center.as_radians();
        let w = half_width.as_radians();
        if !(c.is_finite() && w.is_finite()) || c <= 0.0 {
            return Err("Band center must be positive".to_string());
        }
        if w < 0.0 || w > c {
            return Err("Band half width must lie in [0, center]".to_string());
        }
        Ok(Self { center, half_width })
    }

    pub fn inner(&self) -> Angle {
        self.center - self.half_width
    }

    pub fn outer(&self) -> Angle {
        self.center + self.half_width
    }

    pub fn contains(&self, separation: Angle) -> bool {
        separation >= self.inner() && separation <= self.outer()
    }

    /// Short label such as "5pm1arcmin" (5 ± 1 arcmin)
    pub fn label(&self) -> String {
        format!(
            "{}pm{}arcmin",
            self.center.as_arcminutes(),
            self.half_width.as_arcminutes()
        )
    }
}

/// Every combination `(i, j)` with `i < j < n`
pub fn all_pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

/// Number of combinations of `n` items taken two at a time
pub fn pair_count(n: usize) -> usize {
    n.saturating_sub(1) * n / 2
}

/// Separation between two entries of a position list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSeparation {
    pub first: usize,
    pub second: usize,
    pub separation: Angle,
}

/// Pairwise great-circle separations for all combinations of `positions`
pub fn pair_separations(positions: &[Equatorial]) -> Vec<PairSeparation> {
    all_pairs(positions.len())
        .map(|(i, j)| PairSeparation {
            first: i,
            second: j,
            separation: positions[i].angular_distance(&positions[j]),
        })
        .collect()
}

/// Pair separation residuals for one band
#[derive(Debug, Clone, PartialEq)]
pub struct PairErrors {
    /// measured separation minus reference separation, in mas
    pub errors_mas: Vec<f64>,
    /// Number of matched sources that took part after any subsampling
    pub sources_used: usize,
    /// True when the matched set was subsampled to respect `max_pairs`
    pub subsampled: bool,
}

/// Largest `k` with `k * (k - 1) / 2 <= max_pairs`
fn max_sources_for_pairs(max_pairs: usize) -> usize {
    let k = ((1.0 + (1.0 + 8.0 * max_pairs as f64).sqrt()) / 2.0).floor() as usize;
    // Guard against floating point overshoot
    if pair_count(k) > max_pairs {
        k - 1
    } else {
        k
    }
}

/// Compare measured and reference pair separations inside `band`.
///
/// `matches` indexes into `measured` and `reference`. When the matched set
/// would produce more than `max_pairs` combinations, a seeded random subset
/// of sources is used so the result stays reproducible.
pub fn pair_separation_errors(
    matches: &[MatchedPair],
    measured: &[Equatorial],
    reference: &[Equatorial],
    band: &SeparationBand,
    max_pairs: usize,
    seed: u64,
) -> PairErrors {
    let mut selected: Vec<&MatchedPair> = matches.iter().collect();
    let mut subsampled = false;

    if pair_count(selected.len()) > max_pairs {
        let keep = max_sources_for_pairs(max_pairs);
        warn!(
            "{} matched sources give {} pairs (limit {max_pairs}); subsampling to {keep} sources",
            selected.len(),
            pair_count(selected.len())
        );
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut chosen = rand::seq::index::sample(&mut rng, selected.len(), keep).into_vec();
        chosen.sort_unstable();
        selected = chosen.into_iter().map(|i| &matches[i]).collect();
        subsampled = true;
    }

    let inner = band.inner().as_radians();
    let outer = band.outer().as_radians();

    let errors_mas = all_pairs(selected.len())
        .filter_map(|(a, b)| {
            let (pa, pb) = (selected[a], selected[b]);
            let reference_sep =
                reference[pa.reference_index].angular_distance_radians(&reference[pb.reference_index]);
            if reference_sep < inner || reference_sep > outer {
                return None;
            }
            let measured_sep =
                measured[pa.measured_index].angular_distance_radians(&measured[pb.measured_index]);
            Some(radians_to_mas(measured_sep - reference_sep))
        })
        .collect();

    PairErrors {
        errors_mas,
        sources_used: selected.len(),
        subsampled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::crossmatch::mutual_matches;
    use approx::assert_relative_eq;

    #[test]
    fn test_all_pairs_combinations() {
        let pairs: Vec<_> = all_pairs(4).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert_eq!(all_pairs(1).count(), 0);
        assert_eq!(all_pairs(0).count(), 0);
        assert_eq!(pair_count(4), 6);
        assert_eq!(pair_count(0), 0);
    }

    #[test]
    fn test_max_sources_for_pairs() {
        assert_eq!(max_sources_for_pairs(6), 4);
        assert_eq!(max_sources_for_pairs(5), 3);
        assert_eq!(max_sources_for_pairs(0), 1);
        assert_eq!(max_sources_for_pairs(4950), 100);
    }

    #[test]
    fn test_pair_separations() {
        let a = Equatorial::from_degrees(10.0, 0.0);
        let positions = vec![a, Equatorial::from_degrees(11.0, 0.0), Equatorial::from_degrees(13.0, 0.0)];
        let seps = pair_separations(&positions);
        assert_eq!(seps.len(), 3);
        assert_relative_eq!(seps[0].separation.as_degrees(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(seps[1].separation.as_degrees(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(seps[2].separation.as_degrees(), 2.0, epsilon = 1e-9);
        assert_eq!((seps[2].first, seps[2].second), (1, 2));
    }

    #[test]
    fn test_band_membership() {
        let band = SeparationBand::new(Angle::from_arcminutes(5.0), Angle::from_arcminutes(1.0)).unwrap();
        assert!(band.contains(Angle::from_arcminutes(4.0)));
        assert!(band.contains(Angle::from_arcminutes(5.5)));
        assert!(!band.contains(Angle::from_arcminutes(6.5)));
        assert!(!band.contains(Angle::from_arcminutes(3.9)));
        assert_eq!(band.label(), "5pm1arcmin");

        let wide = SeparationBand::new(Angle::from_arcminutes(5.0), Angle::from_arcminutes(3.0)).unwrap();
        assert_ne!(wide.label(), band.label());
    }

    #[test]
    fn test_band_validation() {
        assert!(SeparationBand::new(Angle::from_arcminutes(0.0), Angle::from_arcminutes(0.0)).is_err());
        assert!(SeparationBand::new(Angle::from_arcminutes(2.0), Angle::from_arcminutes(3.0)).is_err());
        assert!(SeparationBand::new(Angle::from_arcminutes(2.0), Angle::from_arcminutes(-1.0)).is_err());
        assert!(SeparationBand::new(Angle::from_arcminutes(2.0), Angle::from_arcminutes(2.0)).is_ok());
    }

    /// Reference stars on a line, measured copies stretched by `scale`
    fn stretched_field(n: usize, spacing_arcmin: f64, scale: f64) -> (Vec<Equatorial>, Vec<Equatorial>) {
        let origin = Equatorial::from_degrees(60.0, -30.0);
        let east = Angle::from_degrees(90.0);
        let reference = (0..n)
            .map(|i| origin.offset_by(east, Angle::from_arcminutes(i as f64 * spacing_arcmin)))
            .collect();
        let measured = (0..n)
            .map(|i| origin.offset_by(east, Angle::from_arcminutes(i as f64 * spacing_arcmin * scale)))
            .collect();
        (measured, reference)
    }

    #[test]
    fn test_pair_errors_detect_scale_error() {
        // 1 ppm stretch: a 5 arcmin pair is measured 0.3 mas too long
        let (measured, reference) = stretched_field(6, 5.0, 1.0 + 1e-6);
        let matches = mutual_matches(&measured, &reference, Angle::from_arcseconds(1.0));
        assert_eq!(matches.len(), 6);

        let band = SeparationBand::new(Angle::from_arcminutes(5.0), Angle::from_arcminutes(1.0)).unwrap();
        let result = pair_separation_errors(&matches.pairs, &measured, &reference, &band, 1000, 0);

        // Five adjacent pairs fall in the band
        assert_eq!(result.errors_mas.len(), 5);
        assert!(!result.subsampled);
        assert_eq!(result.sources_used, 6);
        for err in &result.errors_mas {
            assert_relative_eq!(*err, 0.3, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_pair_errors_zero_for_identical_positions() {
        let (measured, reference) = stretched_field(5, 5.0, 1.0);
        let matches = mutual_matches(&measured, &reference, Angle::from_arcseconds(1.0));
        let band = SeparationBand::new(Angle::from_arcminutes(10.0), Angle::from_arcminutes(1.0)).unwrap();
        let result = pair_separation_errors(&matches.pairs, &measured, &reference, &band, 1000, 0);
        assert_eq!(result.errors_mas.len(), 3);
        assert!(result.errors_mas.iter().all(|e| e.abs() < 1e-6));
    }

    #[test]
    fn test_pair_errors_subsample_is_reproducible() {
        let (measured, reference) = stretched_field(40, 0.5, 1.0);
        let matches = mutual_matches(&measured, &reference, Angle::from_arcseconds(1.0));
        let band = SeparationBand::new(Angle::from_arcminutes(5.0), Angle::from_arcminutes(5.0)).unwrap();

        let first = pair_separation_errors(&matches.pairs, &measured, &reference, &band, 100, 42);
        let second = pair_separation_errors(&matches.pairs, &measured, &reference, &band, 100, 42);
        assert!(first.subsampled);
        assert_eq!(first.sources_used, 14);
        assert_eq!(first, second);
    }

    #[test]
    fn test_pair_errors_empty_matches() {
        let band = SeparationBand::new(Angle::from_arcminutes(5.0), Angle::from_arcminutes(1.0)).unwrap();
        let result = pair_separation_errors(&[], &[], &[], &band, 10, 0);
        assert!(result.errors_mas.is_empty());
        assert_eq!(result.sources_used, 0);
    }
}
