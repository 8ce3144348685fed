//! End-to-end engine scenarios through the public API.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use broadside::board::grid::{Board, CellState, Coord};
use broadside::board::placement::{all_placements, is_valid_fleet, Occupancy};
use broadside::board::FleetLedger;
use broadside::config::EngineConfig;
use broadside::engine::{Engine, EngineError, Outcome};
use broadside::eval::deduction::find_guaranteed_hit;
use broadside::eval::ensemble::Ensemble;
use broadside::targeting::TargetMode;

const STANDARD: [usize; 5] = [5, 4, 3, 3, 2];

fn quick_engine(seed: u64) -> Engine {
    let mut config = EngineConfig {
        seed,
        ensemble_size: 300,
        mcts_iterations: Some(150),
        ..EngineConfig::default()
    };
    config.genetic.population = 10;
    config.genetic.generations = 3;
    let mut engine = Engine::new(config);
    engine.new_match(10, &STANDARD).expect("standard fleet fits");
    engine
}

#[test]
fn sequential_and_combined_no_touch_checks_agree() {
    let size = 6;
    for a in all_placements(size, 3) {
        let mut occ = Occupancy::new(size);
        occ.place(&a);
        for b in all_placements(size, 2) {
            assert_eq!(
                occ.fits_apart(&b),
                is_valid_fleet(size, &[a, b]),
                "{:?} then {:?}",
                a,
                b
            );
        }
    }
}

#[test]
fn last_pocket_with_unique_tiling_yields_a_guaranteed_hit() {
    let pocket = [
        Coord::new(2, 6),
        Coord::new(3, 6),
        Coord::new(4, 6),
        Coord::new(3, 7),
        Coord::new(3, 8),
    ];
    let mut board = Board::new(10);
    for c in board.coords().collect::<Vec<_>>() {
        if !pocket.contains(&c) {
            board.set(c, CellState::Miss);
        }
    }
    let mut ledger = FleetLedger::new(&STANDARD);
    ledger.confirm_sunk(5).unwrap();
    ledger.confirm_sunk(4).unwrap();
    ledger.confirm_sunk(3).unwrap();
    assert_eq!(ledger.remaining_lengths(), vec![3, 2]);

    let hit = find_guaranteed_hit(&board, &ledger).expect("pocket is forced");
    assert!(pocket.contains(&hit));
}

#[test]
fn ensemble_filtering_never_grows_and_stays_consistent() {
    let mut rng = SmallRng::seed_from_u64(99);
    let mut ensemble = Ensemble::generate(10, &STANDARD, 500, 10_000, &mut rng);
    let truth = ensemble.layouts()[0].clone();
    for idx in [0usize, 11, 22, 33, 44, 55, 66, 77, 88, 99, 45, 54] {
        let c = Coord::from_index(idx, 10);
        let before = ensemble.len();
        ensemble.apply(c, truth.contains(c));
        assert!(ensemble.len() <= before);
        // The layout the outcomes were drawn from always survives.
        assert!(ensemble.layouts().contains(&truth));
    }
    for layout in ensemble.layouts() {
        for &(c, hit) in ensemble.evidence() {
            assert_eq!(layout.contains(c), hit);
        }
    }
}

#[test]
fn planner_moves_are_deterministic_under_iteration_budgets() {
    let mut a = quick_engine(77);
    let mut b = quick_engine(77);
    for (x, y) in [(4, 4), (0, 0), (9, 9)] {
        a.apply_outcome(x, y, Outcome::Miss).unwrap();
        b.apply_outcome(x, y, Outcome::Miss).unwrap();
        assert_eq!(a.next_move().unwrap(), b.next_move().unwrap());
    }
}

#[test]
fn own_layouts_are_always_complete_and_apart() {
    for seed in 1..6 {
        let engine = quick_engine(seed);
        let own = engine.own_fleet().unwrap();
        let mut lengths: Vec<usize> = own.ships().iter().map(|s| s.length).collect();
        lengths.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(lengths, STANDARD.to_vec());
        for (i, a) in own.ships().iter().enumerate() {
            for b in &own.ships()[i + 1..] {
                for ca in &a.cells {
                    for cb in &b.cells {
                        assert!(ca.chebyshev(*cb) > 1, "ships {} and {} touch", a.id, b.id);
                    }
                }
            }
        }
    }
}

/// Hit at the opening move, then sink a length-2 ship on a neighbor.
fn sink_two_at_opening(engine: &mut Engine) -> (Coord, Coord) {
    let opening = engine.next_move().unwrap();
    let hit = Coord::new(opening.x, opening.y);
    engine.apply_outcome(hit.x, hit.y, Outcome::Hit).unwrap();

    let follow = engine.next_move().unwrap();
    let second = Coord::new(follow.x, follow.y);
    assert_eq!(hit.chebyshev(second), 1);
    assert!(hit.x == second.x || hit.y == second.y);
    engine.apply_outcome(second.x, second.y, Outcome::Sunk).unwrap();
    (hit, second)
}

#[test]
fn sinking_a_two_ship_next_to_the_opening_hit() {
    let mut engine = quick_engine(3);
    let (hit, second) = sink_two_at_opening(&mut engine);

    assert_eq!(engine.ledger().unwrap().remaining(2), 0);
    assert_eq!(engine.ledger().unwrap().ships_left(), 4);
    assert_eq!(engine.targeting().unwrap().mode(), TargetMode::Hunt);
    assert!(engine.targeting().unwrap().queue().is_empty());

    let board = engine.opponent_board().unwrap();
    assert_eq!(board.get(hit), CellState::Sunk);
    assert_eq!(board.get(second), CellState::Sunk);
    for ship_cell in [hit, second] {
        for n in ship_cell.surrounding(10) {
            if n != hit && n != second {
                assert_eq!(board.get(n), CellState::Miss, "{:?} not cleared", n);
            }
        }
    }
}

#[test]
fn sunk_report_with_exhausted_length_is_rejected() {
    let mut engine = quick_engine(4);
    sink_two_at_opening(&mut engine);
    let ledger_before = engine.ledger().unwrap().clone();

    engine.apply_outcome(0, 0, Outcome::Hit).unwrap();
    let err = engine.apply_outcome(1, 0, Outcome::Sunk).unwrap_err();
    match err {
        EngineError::InconsistentSunk { length, ref cells } => {
            assert_eq!(length, 2);
            assert_eq!(cells, &vec![Coord::new(0, 0), Coord::new(1, 0)]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("undo"));

    assert_eq!(engine.ledger().unwrap(), &ledger_before);
    assert_eq!(engine.targeting().unwrap().mode(), TargetMode::Target);
    let board = engine.opponent_board().unwrap();
    assert_eq!(board.get(Coord::new(0, 0)), CellState::Hit);
    assert_eq!(board.get(Coord::new(1, 0)), CellState::Hit);
}

#[test]
fn snapshot_then_restore_changes_nothing() {
    let mut engine = quick_engine(5);
    engine.apply_outcome(2, 2, Outcome::Miss).unwrap();
    engine.apply_outcome(7, 3, Outcome::Miss).unwrap();
    let expected = engine.next_move().unwrap();
    let board = engine.opponent_board().unwrap().clone();

    let snapshot = engine.snapshot();
    engine.restore(snapshot);

    assert_eq!(engine.next_move().unwrap(), expected);
    assert_eq!(engine.opponent_board().unwrap(), &board);
}

#[test]
fn guaranteed_hits_are_flagged_in_suggestions() {
    let mut config = EngineConfig {
        seed: 8,
        ensemble_size: 100,
        mcts_iterations: Some(50),
        ..EngineConfig::default()
    };
    config.genetic.population = 6;
    config.genetic.generations = 1;
    let mut engine = Engine::new(config);
    engine.new_match(5, &[2]).unwrap();

    // Leave one vertical domino at (0,0)-(0,1) open; everything else misses.
    let open = [Coord::new(0, 0), Coord::new(0, 1)];
    let cells: Vec<Coord> = Board::new(5).coords().collect();
    for c in cells {
        if open.contains(&c) || engine.opponent_board().unwrap().get(c) != CellState::Unknown {
            continue;
        }
        engine.apply_outcome(c.x, c.y, Outcome::Miss).unwrap();
    }
    let mv = engine.next_move().unwrap();
    assert!(mv.is_guaranteed);
    assert_eq!(Coord::new(mv.x, mv.y), Coord::new(0, 0));
}
