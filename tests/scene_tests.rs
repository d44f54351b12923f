mod common;

use common::{block_room, room_grid, room_settings, size};
use crowd_sim::adapters::outbound::{init_noop_logger, MemoryGridCache};
use crowd_sim::domains::geometry::Point;
use crowd_sim::domains::obstacles::{Obstacle, ObstacleKind, ObstacleLayout};
use crowd_sim::domains::planning::PlannerKind;
use crowd_sim::domains::scene::{AgentView, Pedestrian, Scene, SceneStatus};
use crowd_sim::DomainError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn scene_with(positions: Vec<Point>) -> Scene {
    let layout = block_room();
    let grid = room_grid(&layout);
    Scene::with_positions(room_settings(positions.len()), layout, grid, positions, init_noop_logger()).unwrap()
}

fn run_until_done(scene: &mut Scene, max_ticks: u64) {
    while scene.status() == SceneStatus::Running && scene.ticks() < max_ticks {
        scene.step();
    }
}

#[test]
fn minimum_distance_pushes_close_agents_apart_symmetrically() {
    let mut scene = scene_with(vec![Point::new(1.0, 2.0), Point::new(1.3, 2.0)]);
    let corrections = scene.minimum_distance_corrections();
    assert!((corrections[0].x + corrections[1].x).abs() < 1e-12);
    assert!((corrections[0].y + corrections[1].y).abs() < 1e-12);
    assert!(corrections[0].x < 0.0 && corrections[1].x > 0.0);

    scene.enforce_minimum_distance();
    let store = scene.store();
    let separation = store.position(0).distance_to(&store.position(1));
    assert!(separation > 0.3);
    assert!(separation < 0.7);
}

#[test]
fn minimum_distance_only_applies_within_a_cell() {
    // 0.2 apart but on either side of the x = 5 cell boundary.
    let scene = scene_with(vec![Point::new(4.9, 2.0), Point::new(5.1, 2.0)]);
    let corrections = scene.minimum_distance_corrections();
    assert!(corrections.iter().all(|c| c.is_zero()));
}

#[test]
fn distant_agents_are_not_corrected() {
    let scene = scene_with(vec![Point::new(1.0, 1.0), Point::new(3.0, 3.0)]);
    assert!(scene.minimum_distance_corrections().iter().all(|c| c.is_zero()));
}

#[test]
fn agents_start_walking_their_first_segment() {
    let scene = scene_with(vec![Point::new(1.0, 5.0)]);
    let agent = scene.agent(0).unwrap();
    assert!(agent.is_alive());
    assert!((agent.velocity().speed() - 5.0).abs() < 1e-9);
    assert_eq!(agent.line().unwrap().begin(), Point::new(1.0, 5.0));
    assert_eq!(agent.path().unwrap().len(), 1);
    assert_eq!(agent.cell(), scene.grid().coord_of(&Point::new(1.0, 5.0)));
    assert!(scene.grid().cell(agent.cell().unwrap()).unwrap().agents().contains(&0));
}

#[test]
fn single_agent_reaches_the_exit_and_finishes_once() {
    let mut scene = scene_with(vec![Point::new(1.0, 5.0)]);
    let exits = Rc::new(RefCell::new(Vec::new()));
    let finishes = Rc::new(Cell::new(0));
    let steps = Rc::new(Cell::new(0u64));

    let sink = Rc::clone(&exits);
    scene.on_agent_exit(move |agent| sink.borrow_mut().push((agent.index(), agent.position(), agent.is_alive())));
    let counter = Rc::clone(&finishes);
    scene.on_finish(move || counter.set(counter.get() + 1));
    let ticks = Rc::clone(&steps);
    scene.on_step(move || ticks.set(ticks.get() + 1));

    run_until_done(&mut scene, 200);

    assert_eq!(scene.status(), SceneStatus::Done);
    assert_eq!(scene.alive_count(), 0);
    assert_eq!(finishes.get(), 1);
    assert_eq!(steps.get(), scene.ticks());

    let exits = exits.borrow();
    assert_eq!(exits.len(), 1);
    let (index, position, alive) = exits[0];
    assert_eq!(index, 0);
    assert!(!alive);
    assert!(scene.layout().exit().contains(&position));
    assert!(matches!(scene.pedestrian(0), Some(Pedestrian::Exited { index: 0, .. })));
    assert!(scene.grid().cells().all(|c| c.agents().is_empty()));

    scene.finish();
    scene.finish();
    assert_eq!(finishes.get(), 1);
}

#[test]
fn stepping_a_finished_scene_does_nothing() {
    let mut scene = scene_with(vec![Point::new(7.0, 8.0)]);
    run_until_done(&mut scene, 200);
    assert_eq!(scene.status(), SceneStatus::Done);

    let (time, ticks) = (scene.time(), scene.ticks());
    let position = scene.store().position(0);
    scene.step();
    assert_eq!(scene.time(), time);
    assert_eq!(scene.ticks(), ticks);
    assert_eq!(scene.store().position(0), position);
}

#[test]
fn indices_stay_stable_and_retirement_is_monotonic() {
    let mut scene = scene_with(vec![Point::new(8.0, 8.0), Point::new(1.0, 1.0), Point::new(2.0, 9.0)]);
    let mut previous_alive = vec![true; 3];
    let mut previous_count = scene.alive_count();

    while scene.status() == SceneStatus::Running && scene.ticks() < 400 {
        scene.step();
        for (i, agent) in scene.agents().enumerate() {
            assert_eq!(agent.index(), i);
            if !previous_alive[i] {
                assert!(!agent.is_alive(), "agent {} came back", i);
                assert!(agent.velocity().is_zero());
            }
            previous_alive[i] = agent.is_alive();
        }
        assert!(scene.alive_count() <= previous_count);
        previous_count = scene.alive_count();

        for cell in scene.grid().cells() {
            for &member in cell.agents() {
                assert!(scene.store().is_alive(member));
            }
        }
    }
    assert_eq!(scene.status(), SceneStatus::Done);
    assert_eq!(scene.agent_count(), 3);
}

#[test]
fn moving_agents_are_not_stationary() {
    let mut scene = scene_with(vec![Point::new(1.0, 5.0), Point::new(1.0, 1.0)]);
    scene.step();
    assert!(scene.stationary_agents().is_empty());
    let frame = scene.frame();
    assert_eq!(frame.tick, 1);
    assert_eq!(frame.positions.len(), 2);
    assert!(frame.alive.iter().all(|a| *a));
}

#[test]
fn spawned_scene_is_reproducible_with_a_seed() {
    let build = || {
        let layout = block_room();
        let cache = MemoryGridCache::new();
        let mut rng = StdRng::seed_from_u64(42);
        Scene::new(room_settings(25), layout, &cache, &mut rng, init_noop_logger()).unwrap()
    };
    let (a, b) = (build(), build());
    assert_eq!(a.store().positions(), b.store().positions());
    for position in a.store().positions() {
        assert!(a.is_accessible(position, true));
    }
}

fn assert_live_agents_inside_room(scene: &Scene) {
    for agent in scene.agents().filter(|a| a.is_alive()) {
        let p = agent.position();
        assert!(
            0.0 < p.x && p.x < 10.0 && 0.0 < p.y && p.y < 10.0,
            "agent {} left the room at {} on tick {}",
            agent.index(),
            p,
            scene.ticks()
        );
    }
}

#[test]
fn spawned_crowd_evacuates_with_both_planners() {
    for kind in [PlannerKind::Graph, PlannerKind::Local] {
        let layout = block_room();
        let grid = room_grid(&layout);
        let mut settings = room_settings(20);
        settings.planner.kind = kind;
        assert!(settings.enforce_minimum_distance);
        let mut rng = StdRng::seed_from_u64(7);
        let mut scene = Scene::from_grid(settings, layout, grid, &mut rng, init_noop_logger()).unwrap();

        while scene.status() == SceneStatus::Running && scene.ticks() < 20_000 {
            scene.step();
            assert_live_agents_inside_room(&scene);
        }
        assert_eq!(scene.status(), SceneStatus::Done, "{:?} planner left {} agents behind", kind, scene.alive_count());
        assert!(scene.is_finished());
    }
}

#[test]
fn crowds_of_several_sizes_leave_the_room() {
    for (pedestrians, seed) in [(2, 1), (5, 2), (20, 3)] {
        let layout = block_room();
        let cache = MemoryGridCache::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scene = Scene::new(room_settings(pedestrians), layout, &cache, &mut rng, init_noop_logger()).unwrap();

        while scene.status() == SceneStatus::Running && scene.ticks() < 20_000 {
            scene.step();
            assert_live_agents_inside_room(&scene);
        }
        assert_eq!(scene.alive_count(), 0, "{} agents stuck out of {}", scene.alive_count(), pedestrians);
    }
}

#[test]
fn pushed_neighbours_still_reach_a_shared_target() {
    // Both head for the top of the exit and are shoved apart on the first tick.
    let mut scene = scene_with(vec![Point::new(7.0, 8.0), Point::new(7.3, 8.0)]);
    let target = scene.agent(0).unwrap().line().unwrap().end();
    assert_eq!(scene.agent(1).unwrap().line().unwrap().end(), target);

    scene.step();
    let pushed = scene.store().position(0);
    assert!(pushed.x < 7.0);
    // Re-aimed at the segment end rather than walking parallel to it.
    let heading = scene.store().velocity(0).0;
    let to_target = target - pushed;
    assert!((heading.angle() - to_target.angle()).abs() < 1e-9);

    run_until_done(&mut scene, 400);
    assert_eq!(scene.status(), SceneStatus::Done);
}

#[test]
fn repeated_corrections_settle_at_the_minimum_distance() {
    let mut scene = scene_with(vec![Point::new(1.0, 2.0), Point::new(1.3, 2.0)]);
    let separation = |scene: &Scene| scene.store().position(0).distance_to(&scene.store().position(1));
    let mut previous = separation(&scene);
    for _ in 0..20 {
        let corrections = scene.minimum_distance_corrections();
        assert!((corrections[0].x + corrections[1].x).abs() < 1e-12);
        assert!((corrections[0].y + corrections[1].y).abs() < 1e-12);

        scene.enforce_minimum_distance();
        let current = separation(&scene);
        assert!(current >= previous - 1e-12, "separation shrank from {} to {}", previous, current);
        assert!(current < 0.7);
        previous = current;
    }
    assert!(previous > 0.69);
}

#[test]
fn corrections_never_push_agents_out_of_the_room() {
    let mut scene = scene_with(vec![Point::new(0.1, 2.0), Point::new(0.3, 2.0)]);
    let corrections = scene.minimum_distance_corrections();
    assert!(corrections[0].x < -0.1);

    scene.enforce_minimum_distance();
    assert_eq!(scene.store().position(0), Point::new(0.1, 2.0));
    assert!(scene.store().position(1).x > 0.3);
}

#[test]
fn routes_stay_contiguous_while_walking() {
    let layout = block_room();
    let grid = room_grid(&layout);
    let mut rng = StdRng::seed_from_u64(5);
    let mut scene = Scene::from_grid(room_settings(15), layout, grid, &mut rng, init_noop_logger()).unwrap();
    let destination = |agent: &AgentView<'_>| {
        let line = agent.line().unwrap();
        agent.path().unwrap().last_point().unwrap_or(line.end())
    };
    let destinations: Vec<Point> = scene.agents().map(|a| destination(&a)).collect();

    while scene.status() == SceneStatus::Running && scene.ticks() < 20_000 {
        scene.step();
        for agent in scene.agents().filter(|a| a.is_alive()) {
            let (line, path) = (agent.line().unwrap(), agent.path().unwrap());
            assert!(path.is_contiguous(), "agent {} holds a broken path", agent.index());
            if let Some(next) = path.first_point() {
                assert!(line.end().approx_eq(&next), "agent {} walks {} but continues at {}", agent.index(), line, next);
            }
            assert_eq!(destination(&agent), destinations[agent.index()]);
        }
    }
    assert_eq!(scene.status(), SceneStatus::Done);
}

#[test]
fn spawning_gives_up_when_nothing_is_accessible() {
    let floor = Obstacle::new("floor", ObstacleKind::Generic, Point::ORIGIN, size(10.0, 10.0), 1.0);
    let exit = Obstacle::new("exit", ObstacleKind::Exit, Point::new(9.0, 4.5), size(1.0, 1.0), 1.0);
    let layout = ObstacleLayout::new(size(10.0, 10.0), vec![floor], exit).unwrap();
    let grid = room_grid(&layout);
    let mut settings = room_settings(1);
    settings.spawn_attempts = 50;
    let mut rng = StdRng::seed_from_u64(1);

    let result = Scene::from_grid(settings, layout, grid, &mut rng, init_noop_logger());
    assert!(matches!(result, Err(DomainError::SpawnFailed { agent: 0, attempts: 50 })));
}

#[test]
fn agents_cannot_be_placed_inside_obstacles() {
    let layout = block_room();
    let grid = room_grid(&layout);
    let result = Scene::with_positions(room_settings(1), layout, grid, vec![Point::new(5.0, 5.0)], init_noop_logger());
    assert!(matches!(result, Err(DomainError::InvalidGeometry { .. })));
}
