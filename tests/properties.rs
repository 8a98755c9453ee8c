use clinrisk::breast_cancer::guard::{self, ImageStats, Rejection};
use clinrisk::inference::service::align;
use clinrisk::inference::{
    EngineeredRecord, FeatureSchema, FeatureValue, FillPolicy, RiskTier, Threshold,
};
use clinrisk::{anemia, osteoporosis, pcos};
use image::{Rgb, RgbImage};
use proptest::prelude::*;

fn tier_rank(tier: RiskTier) -> u8 {
    match tier {
        RiskTier::Low => 0,
        RiskTier::Borderline => 1,
        RiskTier::High => 2,
        RiskTier::InvalidInput => u8::MAX,
    }
}

// ── Decision rule ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn positive_exactly_when_probability_reaches_threshold(
        t in 0.0f64..=1.0,
        p in 0.0f64..=1.0,
    ) {
        let threshold = Threshold::new(t).unwrap();
        prop_assert_eq!(threshold.is_positive(p), p >= t);
        prop_assert!(threshold.is_positive(t));
    }

    #[test]
    fn thresholds_outside_unit_interval_are_refused(
        t in prop_oneof![-1e6f64..-1e-9, 1.0f64 + 1e-9..1e6],
    ) {
        prop_assert!(Threshold::new(t).is_none());
    }

    #[test]
    fn tiers_never_decrease_with_probability(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            tier_rank(anemia::service::risk_tier(lo)) <= tier_rank(anemia::service::risk_tier(hi))
        );
        prop_assert!(
            tier_rank(pcos::service::risk_tier(lo)) <= tier_rank(pcos::service::risk_tier(hi))
        );

        let t = Threshold::new(0.42).unwrap();
        prop_assert!(
            tier_rank(osteoporosis::service::risk_tier(lo, t))
                <= tier_rank(osteoporosis::service::risk_tier(hi, t))
        );
    }
}

// ── Schema alignment ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn aligned_vector_follows_schema(
        present in proptest::collection::btree_map("[a-z]{1,6}", -1e3f64..1e3, 0..8),
        extra in proptest::collection::btree_set("[A-Z]{1,6}", 0..4),
        zero_fill in any::<bool>(),
    ) {
        let mut record = EngineeredRecord::new();
        for (column, value) in &present {
            record.insert(column, *value);
        }
        // schema holds the record's columns in reverse plus some it lacks
        let mut columns: Vec<String> = present.keys().rev().cloned().collect();
        columns.extend(extra.iter().cloned());
        let schema = FeatureSchema::new(columns.clone());

        let fill = if zero_fill { FillPolicy::Zero } else { FillPolicy::Missing };
        let x = align(&record, &schema, fill);

        prop_assert_eq!(x.columns(), columns.as_slice());
        prop_assert_eq!(x.len(), schema.len());
        for (column, value) in x.columns().iter().zip(x.values()) {
            match present.get(column) {
                Some(v) => prop_assert_eq!(value, &FeatureValue::Number(*v)),
                None => prop_assert_eq!(value, &fill.value()),
            }
        }
    }
}

// ── Image guard ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn grayscale_images_have_no_color_variance(
        w in 1u32..24,
        h in 1u32..24,
        seed in any::<u64>(),
    ) {
        let img = RgbImage::from_fn(w, h, |x, y| {
            let v = (seed.wrapping_mul(u64::from(x * 31 + y * 17 + 1)) >> 56) as u8;
            Rgb([v, v, v])
        });
        let stats = ImageStats::measure(&img);
        prop_assert_eq!(stats.color_variance, 0.0);
        prop_assert!(stats.mean_intensity <= 255.0);
        if let Err(reason) = guard::inspect(&img) {
            let non_medical = matches!(reason, Rejection::NonMedical { .. });
            prop_assert!(!non_medical);
        }
    }
}
