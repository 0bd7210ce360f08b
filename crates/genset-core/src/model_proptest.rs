#[cfg(test)]
mod proptest_model {
    use crate::model::{GeneratorConfig, GeneratorModel, Status};
    use crate::noise::test_support::Silent;
    use crate::noise::SeededNoise;
    use proptest::prelude::*;

    fn running_model() -> GeneratorModel {
        let mut model = GeneratorModel::new(GeneratorConfig::default());
        model.mark_running();
        model
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        // Property: with noise disabled, rpm always moves toward the
        // setpoint and never crosses it, from any starting speed.
        #[test]
        fn relaxation_never_overshoots(start_rpm in 0.0f64..=5000.0) {
            let mut model = running_model();
            model.force_rpm(start_rpm);
            let target = model.target_rpm();

            for _ in 0..200 {
                let before = model.rpm();
                model.update(&mut Silent);
                let after = model.rpm();
                if before < target {
                    prop_assert!(after >= before && after <= target);
                } else if before > target {
                    prop_assert!(after <= before && after >= target);
                }
            }
        }

        // Property: current is exactly zero at or below the excitation
        // threshold, for any seed and any prior wear.
        #[test]
        fn no_load_below_excitation(seed in any::<u64>(), start_rpm in 0.0f64..=980.0) {
            let mut model = running_model();
            model.force_rpm(start_rpm);
            let mut noise = SeededNoise::new(seed);
            model.update(&mut noise);
            if model.rpm() <= 1000.0 {
                prop_assert_eq!(model.current_l1_a(), 0.0);
                prop_assert_eq!(model.power_kw(), 0.0);
            }
        }

        // Property: health never increases, and every decrement is
        // exactly one wear step.
        #[test]
        fn health_is_monotone_nonincreasing(seed in any::<u64>()) {
            let mut model = running_model();
            let mut noise = SeededNoise::new(seed);
            let mut previous = model.health_pct();
            for _ in 0..1000 {
                model.update(&mut noise);
                let health = model.health_pct();
                prop_assert!(health <= previous);
                let drop = previous - health;
                prop_assert!(drop.abs() < 1e-9 || (drop - 0.2).abs() < 1e-9);
                previous = health;
            }
        }

        // Property: once braked, the unit stays braked and coasts toward
        // zero for any seed and any brake instant.
        #[test]
        fn brake_is_terminal(seed in any::<u64>(), brake_after in 1usize..200) {
            let mut model = running_model();
            let mut noise = SeededNoise::new(seed);
            for _ in 0..brake_after {
                model.update(&mut noise);
            }
            model.emergency_brake();
            let mut previous = model.rpm();
            for _ in 0..200 {
                model.update(&mut noise);
                prop_assert_eq!(model.status(), Status::EmergencyStop);
                prop_assert_eq!(model.target_rpm(), 0.0);
                prop_assert!(model.rpm() <= previous);
                previous = model.rpm();
            }
        }
    }
}
