//! Multi-resolution level sets: level matching and kernel blending
//!
//! Run tests with: cargo test --test `multilevel`

use levelset_core::{
    level_set::{Level, LevelSetConfig, MultiLevel},
    Ball, BoundingBox, LevelSetProbe, Shape, SphAdaptation, Vec2d,
};
use approx::assert_relative_eq;
use std::sync::Arc;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Unit circle at spacings 0.1 and 0.05, resolution ratios 1 and 2
fn two_level_circle() -> MultiLevel<2> {
    let shape: Arc<dyn Shape<2>> = Arc::new(Ball::new(Vec2d::zeros(), 1.0));
    let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.1).unwrap());
    MultiLevel::new(
        &BoundingBox::centered(1.2),
        0.1,
        2,
        shape,
        adaptation,
        LevelSetConfig::default(),
    )
    .unwrap()
}

fn surface_positions() -> Vec<Vec2d> {
    (0..12)
        .map(|i| {
            let angle = 0.3 + f64::from(i) * 0.5;
            Vec2d::new(angle.cos(), angle.sin()) * (0.98 + 0.005 * f64::from(i))
        })
        .collect()
}

#[test]
fn test_kernel_integral_halfway_is_mean_of_levels() {
    let levels = two_level_circle();
    assert_relative_eq!(levels.coarsest().resolution_ratio(), 1.0);
    assert_relative_eq!(levels.finest().resolution_ratio(), 2.0);

    for position in surface_positions() {
        let coarse = levels.coarsest().probe_kernel_integral(&position);
        let fine = levels.finest().probe_kernel_integral(&position);
        assert_relative_eq!(
            levels.probe_kernel_integral(&position, 1.5),
            0.5 * (coarse + fine),
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_blend_is_continuous_at_level_ratios() {
    let levels = two_level_circle();
    let position = Vec2d::new(0.6, 0.81);
    let fine = levels.finest().probe_kernel_gradient_integral(&position);
    let coarse = levels.coarsest().probe_kernel_gradient_integral(&position);

    // Approaching the fine ratio from below converges to the fine level
    let below_fine = levels.probe_kernel_gradient_integral(&position, 2.0 - 1e-9);
    assert_relative_eq!(below_fine, fine, epsilon = 1e-6);
    assert_eq!(levels.probe_kernel_gradient_integral(&position, 2.0), fine);
    assert_relative_eq!(levels.probe_kernel_gradient_integral(&position, 1.0), coarse, epsilon = 1e-12);

    // Past the finest ratio the finest level answers unblended
    assert_eq!(levels.probe_kernel_gradient_integral(&position, 3.5), fine);
}

#[test]
fn test_level_matching_is_monotone_and_exact() {
    let levels = two_level_circle();
    for (index, level) in levels.levels().iter().enumerate() {
        assert_eq!(levels.level_for_ratio(level.resolution_ratio()), index);
    }
    let matched: Vec<usize> = (0..30)
        .map(|k| levels.level_for_ratio(1.0 + 0.1 * f64::from(k)))
        .collect();
    assert!(matched.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(levels.try_level_for_ratio(0.9), None);
}

#[test]
fn test_geometry_probes_use_finest_covering_level() {
    let levels = two_level_circle();
    let near = Vec2d::new(0.0, -1.01);
    assert_eq!(
        levels.probe_signed_distance(&near),
        levels.finest().probe_signed_distance(&near)
    );
    let normal = levels.probe_normal_direction(&near);
    assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
    assert!(normal[1] < -0.99);

    // Halo package next to the coarse core band: exact distances, no sentinel
    let inside = Vec2d::new(0.05, 0.0);
    assert!(!levels.coarsest().package_at(&inside).is_singular());
    assert!(!levels.finest().is_within_core_package(&inside));
    assert_eq!(
        levels.probe_signed_distance(&inside),
        levels.coarsest().probe_signed_distance(&inside)
    );
    assert_relative_eq!(levels.probe_signed_distance(&inside), -0.95, epsilon = 0.05);
}

#[test]
fn test_far_inside_falls_back_to_coarse_sentinel() {
    let shape: Arc<dyn Shape<2>> = Arc::new(Ball::new(Vec2d::zeros(), 2.0));
    let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.1).unwrap());
    let levels = MultiLevel::new(
        &BoundingBox::centered(2.5),
        0.1,
        2,
        shape,
        adaptation,
        LevelSetConfig::default(),
    )
    .unwrap();
    let center = Vec2d::new(0.05, 0.0);
    assert!(levels.coarsest().package_at(&center).is_singular());
    assert_eq!(
        levels.probe_signed_distance(&center),
        -levels.coarsest().far_field_distance()
    );
}

#[test]
fn test_mesh_bound_requires_every_level() {
    let levels = two_level_circle();
    let fine = levels.finest();
    assert!(levels.probe_is_within_mesh_bound(&Vec2d::zeros()));

    // Two fine cells in from the fine lower corner, but the coarse level starts further out
    let edge = fine.mesh().lower_bound().add_scalar(1.5 * fine.grid_spacing());
    assert!(!fine.probe_is_within_mesh_bound(&edge));
    assert!(!levels.probe_is_within_mesh_bound(&edge));
}

#[test]
fn test_stack_from_prebuilt_levels() {
    let shape: Arc<dyn Shape<2>> = Arc::new(Ball::new(Vec2d::zeros(), 1.0));
    let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.1).unwrap());
    let coarse = Level::new(
        &BoundingBox::centered(1.2),
        0.1,
        shape,
        adaptation,
        LevelSetConfig::default(),
    )
    .unwrap();
    let fine = Level::refine_from(&coarse).unwrap();
    let levels = MultiLevel::from_levels(vec![coarse, fine]).unwrap();
    let reference = two_level_circle();

    let probe: &dyn LevelSetProbe<2> = &levels;
    for position in surface_positions() {
        assert_eq!(
            probe.probe_kernel_integral(&position, 1.7),
            reference.probe_kernel_integral(&position, 1.7)
        );
    }
}
