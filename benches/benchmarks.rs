criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        resetting_a_large_board,
        opening_a_single_cell_on_a_large_board,
        flood_filling_from_one_action,
        kdtree_inserting_a_thousand_points,
        kdtree_popping_closest_under_churn,
        solving_a_board_with_one_agent,
}

use minefield::engine::{Action, ActionKind, Engine};
use minefield::geometry::Point;
use minefield::solver::{Solver, Strategy};
use minefield::spatial::{KdTree, Value};

fn resetting_a_large_board(c: &mut criterion::Criterion) {
    c.bench_function("reset a 1000x1000 board", |b| {
        b.iter(|| Engine::new(Point::new(1000, 1000), 0.16, 1).reset());
    });
}

fn opening_a_single_cell_on_a_large_board(c: &mut criterion::Criterion) {
    let mut engine = Engine::new(Point::new(500, 500), 0.16, 1);
    engine.reset();
    c.bench_function("open a single hidden cell", |b| {
        b.iter(|| engine.apply(Action::new(ActionKind::Open, Point::new(1, 1), 1)));
    });
}

fn flood_filling_from_one_action(c: &mut criterion::Criterion) {
    c.bench_function("flood-fill a sparse 300x300 board", |b| {
        b.iter(|| {
            let mut engine = Engine::new(Point::new(300, 300), 0.02, 1);
            let updates = engine.reset();
            updates.len()
        });
    });
}

fn kdtree_inserting_a_thousand_points(c: &mut criterion::Criterion) {
    c.bench_function("insert 1000 points into a k-d tree", |b| {
        b.iter(|| {
            let mut tree = KdTree::new();
            for i in 0..1000 {
                tree.insert(Value::new(0, Point::new(i % 50, i / 50)));
            }
            tree
        });
    });
}

fn kdtree_popping_closest_under_churn(c: &mut criterion::Criterion) {
    let mut tree = KdTree::new();
    for i in 0..2000 {
        tree.insert(Value::new(0, Point::new(i % 50, i / 50)));
    }
    c.bench_function("pop-closest then reinsert under churn", |b| {
        b.iter(|| {
            if let Some(v) = tree.pop_closest(Point::new(25, 20)) {
                tree.insert(v);
            }
        });
    });
}

fn solving_a_board_with_one_agent(c: &mut criterion::Criterion) {
    c.bench_function("one solver clears (or stalls on) a 100x60 board", |b| {
        b.iter(|| {
            let mut engine = Engine::new(Point::new(100, 60), 0.12, 1);
            let mut solver = Solver::new(Point::new(100, 60), 1, Strategy::Nearest, 1);
            let mut updates = engine.reset();
            for _ in 0..20_000 {
                let action = solver.step(&updates, false);
                if action.kind == ActionKind::Pass {
                    break;
                }
                updates = engine.apply(action);
            }
        });
    });
}
