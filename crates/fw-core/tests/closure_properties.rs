use fw_core::{
    closure, closure_packed, reference, run_closure, ClosureError, Dense, DenseMatrix,
    EngineConfig, Geometry, Layout, Matrix, MaxMin, PackedBits, PackedBoolMatrix,
    PackedReachability, Reachability, Semiring, SemiringKind, ShortestPath, Variant,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const INF: f32 = f32::INFINITY;

/// Integer weights in `1..=max_w` with probability `density`, zero diagonal.
fn random_weights(n: usize, density: f64, max_w: u32, seed: u64) -> DenseMatrix<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut m = DenseMatrix::filled(n, INF).unwrap();
    for i in 0..n {
        for j in 0..n {
            if i == j {
                m.set(i, j, 0.0);
            } else if rng.gen_bool(density) {
                m.set(i, j, rng.gen_range(1..=max_w) as f32);
            }
        }
    }
    m
}

/// Same edge pattern as [`random_weights`] as capacities: -∞ where absent.
fn random_capacities(n: usize, density: f64, max_w: u32, seed: u64) -> DenseMatrix<f32> {
    let w = random_weights(n, density, max_w, seed);
    let cells = w
        .as_slice()
        .iter()
        .map(|&v| if v == INF || v == 0.0 { f32::NEG_INFINITY } else { v })
        .collect();
    DenseMatrix::from_vec(n, cells).unwrap()
}

fn random_relation(n: usize, density: f64, seed: u64) -> DenseMatrix<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    let cells = (0..n * n).map(|_| rng.gen_bool(density)).collect();
    DenseMatrix::from_vec(n, cells).unwrap()
}

fn reference_closure<S: Semiring>(m: &DenseMatrix<S::Elem>) -> DenseMatrix<S::Elem> {
    let mut out = m.try_clone().unwrap();
    reference::compute::<S>(out.as_mut_slice(), m.n()).unwrap();
    out
}

#[test]
fn test_scenario_shortest_path_chain() {
    let mut m = DenseMatrix::from_rows(&[
        vec![0.0, 1.0, INF, INF],
        vec![INF, 0.0, 1.0, INF],
        vec![INF, INF, 0.0, 2.0],
        vec![INF, INF, INF, 0.0],
    ])
    .unwrap();
    let cfg = EngineConfig::default().with_tile_size(2);
    closure::<ShortestPath<f32>>(&mut m, Variant::Tiled, &cfg).unwrap();
    assert_eq!(m.get(0, 3), 4.0);
    assert_eq!(m.get(1, 3), 3.0);
    assert_eq!(m.get(3, 0), INF);
}

#[test]
fn test_scenario_max_min_bottleneck() {
    let ninf = f32::NEG_INFINITY;
    let mut m = DenseMatrix::from_rows(&[
        vec![ninf, 5.0, 1.0],
        vec![ninf, ninf, 3.0],
        vec![ninf, ninf, ninf],
    ])
    .unwrap();
    closure::<MaxMin<f32>>(&mut m, Variant::LaneBatched, &EngineConfig::default()).unwrap();
    assert_eq!(m.get(0, 2), 3.0);
}

#[test]
fn test_scenario_reachability() {
    let mut m = DenseMatrix::from_rows(&[
        vec![false, true, false],
        vec![false, false, true],
        vec![false, false, false],
    ])
    .unwrap();
    closure::<Reachability>(&mut m, Variant::Unrolled, &EngineConfig::default()).unwrap();
    assert!(m.get(0, 2));
    assert!(!m.get(2, 0));
}

/// Every variant, untiled where that is allowed and with `tile`.
fn variant_configs(tile: usize) -> Vec<(Variant, EngineConfig)> {
    let mut out = Vec::new();
    for variant in Variant::ALL {
        if variant != Variant::Tiled {
            out.push((variant, EngineConfig::default()));
        }
        out.push((variant, EngineConfig::default().with_tile_size(tile)));
    }
    out
}

fn assert_idempotent(base: &Matrix, kind: SemiringKind, tile: usize) {
    for (variant, cfg) in variant_configs(tile) {
        let mut once = base.try_clone().unwrap();
        run_closure(&mut once, kind, variant, &cfg).unwrap();
        let mut twice = once.try_clone().unwrap();
        run_closure(&mut twice, kind, variant, &cfg).unwrap();
        assert_eq!(twice, once, "{kind} variant={variant} tile={:?}", cfg.tile_size);
    }
}

#[test]
fn test_idempotence() {
    let m = random_weights(24, 0.2, 9, 1);
    let once = reference_closure::<ShortestPath<f32>>(&m);
    let twice = reference_closure::<ShortestPath<f32>>(&once);
    assert_eq!(once, twice);

    let r = random_relation(24, 0.08, 2);
    let once = reference_closure::<Reachability>(&r);
    assert_eq!(reference_closure::<Reachability>(&once), once);
}

#[test]
fn test_idempotence_every_variant() {
    assert_idempotent(&random_weights(24, 0.2, 9, 1).into(), SemiringKind::ShortestPath, 4);
    assert_idempotent(&random_capacities(24, 0.2, 9, 10).into(), SemiringKind::MaxMin, 6);
    assert_idempotent(&random_relation(24, 0.08, 2).into(), SemiringKind::TransitiveClosure, 8);

    let packed = PackedBoolMatrix::from_dense(&random_relation(24, 0.08, 11)).unwrap();
    assert_idempotent(&packed.into(), SemiringKind::TransitiveClosure, 8);
}

/// Runs the reference steps one `k` at a time; no cell may get worse.
fn assert_monotone<S, L>(buf: &mut [S::Elem], geom: Geometry)
where
    S: Semiring,
    L: Layout<S::Elem>,
{
    for k in 0..geom.n {
        let before = buf.to_vec();
        reference::step::<S, L>(buf, geom, k);
        for (idx, (new, old)) in buf.iter().zip(&before).enumerate() {
            assert!(S::no_worse(*new, *old), "step {k} cell {idx}: {new:?} worse than {old:?}");
        }
    }
}

#[test]
fn test_monotone_per_step() {
    let n = 20;
    let geom = Geometry::dense(n).unwrap();

    let mut m = random_weights(n, 0.25, 50, 3);
    assert_monotone::<ShortestPath<f32>, Dense>(m.as_mut_slice(), geom);

    let mut c = random_capacities(n, 0.25, 50, 12);
    assert_monotone::<MaxMin<f32>, Dense>(c.as_mut_slice(), geom);

    let mut r = random_relation(n, 0.1, 13);
    assert_monotone::<Reachability, Dense>(r.as_mut_slice(), geom);

    let mut packed = PackedBoolMatrix::from_dense(&random_relation(n, 0.1, 14)).unwrap();
    let packed_geom = Geometry::packed(n).unwrap();
    assert_monotone::<PackedReachability, PackedBits>(packed.as_bytes_mut(), packed_geom);
    assert!(packed.padding_is_clear());
}

#[test]
fn test_tile_size_independence() {
    let m = random_weights(64, 0.1, 20, 4);
    let expected = reference_closure::<ShortestPath<f32>>(&m);
    for tile in [4, 8, 16, 32] {
        for variant in [Variant::Tiled, Variant::LaneBatched] {
            let mut got = m.try_clone().unwrap();
            let cfg = EngineConfig::default().with_tile_size(tile);
            closure::<ShortestPath<f32>>(&mut got, variant, &cfg).unwrap();
            assert_eq!(got, expected, "tile={tile} variant={variant}");
        }
    }
}

#[test]
fn test_remainder_paths_n7() {
    let m = random_weights(7, 0.4, 9, 5);
    let expected = reference_closure::<ShortestPath<f32>>(&m);
    for rows in [1, 2, 4, 8, 16] {
        let cfg = EngineConfig::default().with_unroll_rows(rows).with_tile_size(7);
        for variant in [Variant::Unrolled, Variant::Tiled, Variant::LaneBatched] {
            let mut got = m.try_clone().unwrap();
            closure::<ShortestPath<f32>>(&mut got, variant, &cfg).unwrap();
            assert_eq!(got, expected, "rows={rows} variant={variant}");
        }
    }
}

#[test]
fn test_packed_vs_bool_n9() {
    let dense = random_relation(9, 0.15, 6);
    let expected = reference_closure::<Reachability>(&dense);
    for variant in [Variant::Reference, Variant::Unrolled, Variant::LaneBatched] {
        let mut packed = PackedBoolMatrix::from_dense(&dense).unwrap();
        assert_eq!(packed.as_bytes().len(), 9 * 2);
        closure_packed(&mut packed, variant, &EngineConfig::default()).unwrap();
        assert!(packed.padding_is_clear());
        assert_eq!(packed.to_dense().unwrap(), expected, "variant={variant}");
    }
}

#[test]
fn test_packed_tile_must_cover_bytes() {
    let mut packed = PackedBoolMatrix::new(16).unwrap();
    let cfg = EngineConfig::default().with_tile_size(4);
    assert!(matches!(
        closure_packed(&mut packed, Variant::Tiled, &cfg),
        Err(ClosureError::TileSize { tile: 4, .. })
    ));
}

#[test]
fn test_padding_preserves_original_cells() {
    let m = random_weights(10, 0.3, 9, 7);
    let expected = reference_closure::<ShortestPath<f32>>(&m);

    let padded_n = DenseMatrix::<f32>::padded_size(10, 8);
    let mut padded = m.padded(padded_n, ShortestPath::<f32>::identity()).unwrap();
    let cfg = EngineConfig::default().with_tile_size(8);
    closure::<ShortestPath<f32>>(&mut padded, Variant::Tiled, &cfg).unwrap();
    assert_eq!(padded.cropped(10).unwrap(), expected);
}

#[test]
fn test_non_dividing_tile_is_rejected_without_writes() {
    let mut m = random_weights(10, 0.3, 9, 8);
    let before = m.to_vec();
    let cfg = EngineConfig::default().with_tile_size(4);
    for variant in [Variant::Tiled, Variant::LaneBatched] {
        let err = closure::<ShortestPath<f32>>(&mut m, variant, &cfg);
        assert!(matches!(err, Err(ClosureError::TileSize { .. })));
        assert_eq!(m.to_vec(), before);
    }
}

#[test]
fn test_f16_and_f64_dispatch() {
    let base = random_weights(12, 0.3, 9, 9);
    let expected = reference_closure::<ShortestPath<f32>>(&base);

    let wide: Vec<f64> = base.as_slice().iter().map(|&v| f64::from(v)).collect();
    let mut m64: Matrix = DenseMatrix::from_vec(12, wide).unwrap().into();
    let cfg = EngineConfig::default().with_tile_size(4);
    run_closure(&mut m64, SemiringKind::ShortestPath, Variant::LaneBatched, &cfg).unwrap();

    let narrow: Vec<half::f16> = base.as_slice().iter().map(|&v| half::f16::from_f32(v)).collect();
    let mut m16: Matrix = DenseMatrix::from_vec(12, narrow).unwrap().into();
    run_closure(&mut m16, SemiringKind::ShortestPath, Variant::Tiled, &cfg).unwrap();

    match (m64, m16) {
        (Matrix::F64(a), Matrix::F16(b)) => {
            for i in 0..12 {
                for j in 0..12 {
                    let e = expected.get(i, j);
                    assert_eq!(a.get(i, j), f64::from(e));
                    assert_eq!(b.get(i, j).to_f32(), e);
                }
            }
        }
        _ => panic!("storage form changed"),
    }
}
