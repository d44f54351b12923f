use super::{get_goal, RoutePlanner};
use crate::common::{DomainError, DomainResult};
use crate::domains::geometry::{LineSegment, Path, Point};
use crate::domains::obstacles::{Obstacle, ObstacleLayout};
use ordered_float::OrderedFloat;
use std::f64::consts::{PI, TAU};

/// Graph-free single-agent router.
///
/// Aims straight at the exit; when the line is blocked it detours around the
/// most extreme visible corner on whichever side needs the smaller turn, and
/// repeats from there.
pub struct LocalDetourPlanner<'a> {
    layout: &'a ObstacleLayout,
    detour_margin: f64,
    max_steps: usize,
}

#[derive(Debug, Clone, Copy)]
struct CornerCandidate {
    offset: f64,
    corner: Point,
    outward: Point,
}

/// Wraps an angle into (-pi, pi].
fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

impl<'a> LocalDetourPlanner<'a> {
    pub fn new(layout: &'a ObstacleLayout, detour_margin: f64, max_steps: usize) -> Self {
        Self {
            layout,
            detour_margin,
            max_steps,
        }
    }

    /// Next sub-goal around `blocking`, seen from `start` while heading along `bearing`.
    pub fn intermediate_goal(&self, start: Point, bearing: f64, blocking: &[&Obstacle]) -> Option<Point> {
        let candidates: Vec<CornerCandidate> = blocking
            .iter()
            .flat_map(|&obstacle| {
                let center = obstacle.center();
                obstacle.corners().iter().map(move |&corner| CornerCandidate {
                    offset: normalize_angle((corner - start).angle() - bearing),
                    corner,
                    outward: (corner - center).signum(),
                })
            })
            .collect();

        let extreme = |clockwise: bool| {
            candidates
                .iter()
                .filter(|c| (c.offset < 0.0) == clockwise)
                .max_by_key(|c| OrderedFloat(c.offset.abs()))
        };
        // Clockwise first so that equal turns favour it.
        let best = [extreme(true), extreme(false)]
            .into_iter()
            .flatten()
            .min_by_key(|c| OrderedFloat(c.offset.abs()))?;
        Some(best.corner + best.outward * self.detour_margin)
    }
}

impl RoutePlanner for LocalDetourPlanner<'_> {
    fn plan(&self, agent: usize, start: Point) -> DomainResult<Path> {
        let exit = self.layout.exit();
        let mut path = Path::new();
        let mut sub_start = start;
        let mut steps = 0;
        while !exit.contains(&sub_start) {
            if steps == self.max_steps {
                return Err(DomainError::DetourLimit {
                    agent,
                    steps: self.max_steps,
                });
            }
            let goal = get_goal(&sub_start, exit);
            let line = LineSegment::new(sub_start, goal);
            let blocking: Vec<&Obstacle> = self.layout.crossed_by(&line, false).collect();
            let sub_finish = if blocking.is_empty() {
                goal
            } else {
                self.intermediate_goal(sub_start, (goal - sub_start).angle(), &blocking)
                    .ok_or(DomainError::NoRoute {
                        agent,
                        x: sub_start.x,
                        y: sub_start.y,
                    })?
            };
            path.push(LineSegment::new(sub_start, sub_finish))?;
            sub_start = sub_finish;
            steps += 1;
        }
        if path.is_empty() {
            // Already standing in the exit.
            path.push(LineSegment::new(start, start))?;
        }
        Ok(path)
    }
}
