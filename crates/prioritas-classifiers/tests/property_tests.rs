//! Property tests over generated complaint batches

#![cfg(feature = "synthetic")]

use prioritas_classifiers::stats::chi_square_p_value;
use prioritas_classifiers::{
    extract, predict, select_features, train, FeatureConfig, FeatureExtractor, SyntheticGenerator,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn extraction_is_deterministic(seed in any::<u64>()) {
        let batch = SyntheticGenerator::new(seed).generate(5);
        let extractor = FeatureExtractor::new(FeatureConfig::default()).unwrap();
        for complaint in &batch {
            let first = extractor.extract(complaint).unwrap();
            let second = extractor.extract(complaint).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first, extract(complaint).unwrap());
        }
    }

    #[test]
    fn p_values_are_bounded_and_monotone(
        statistic in 0.0f64..200.0,
        delta in 0.001f64..50.0,
        df in 1usize..12,
    ) {
        let p = chi_square_p_value(statistic, df);
        let q = chi_square_p_value(statistic + delta, df);
        prop_assert!((0.0..=1.0).contains(&p));
        prop_assert!(q <= p + 1e-12, "p({}) = {} < p({}) = {}", statistic, p, statistic + delta, q);
    }

    #[test]
    fn selection_scores_are_ordered(seed in any::<u64>(), count in 30usize..120) {
        let batch = SyntheticGenerator::new(seed).generate(count);
        let selection = select_features(&batch, 0.05).unwrap();

        prop_assert_eq!(selection.record_count, count);
        for score in &selection.features {
            prop_assert!(score.p_value < 0.05);
        }
        for score in &selection.rejected {
            prop_assert!(score.p_value >= 0.05);
        }
        for pair in selection.features.windows(2) {
            prop_assert!(pair[0].statistic >= pair[1].statistic);
        }
    }

    #[test]
    fn posteriors_are_normalized_and_nonzero(seed in any::<u64>()) {
        let mut generator = SyntheticGenerator::new(seed).with_noise(0.05);
        let batch = generator.generate(80);
        let selection = select_features(&batch, 0.05).unwrap();
        prop_assume!(!selection.is_empty());

        let model = train(&batch, &selection).unwrap();
        for complaint in generator.generate(10) {
            let result = predict(&model, &complaint).unwrap();
            let sum: f64 = result.posteriors.values().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9, "sum = {}", sum);
            for posterior in result.posteriors.values() {
                prop_assert!(*posterior > 0.0);
            }
            prop_assert_eq!(Some(result.confidence), result.posterior(result.label));
        }
    }
}
