use super::obstacle::{Obstacle, ObstacleKind};
use crate::common::{DomainError, DomainResult};
use crate::domains::geometry::{LineSegment, Point, Size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One `{name, begin, size}` record; `begin` and `size` are fractions of the domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleRecord {
    pub name: String,
    pub begin: [f64; 2],
    pub size: [f64; 2],
    #[serde(default)]
    pub spawn_rate: f64,
}

/// The obstacle configuration document as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(default)]
    pub obstacles: Vec<ObstacleRecord>,
    #[serde(default)]
    pub exits: Vec<ObstacleRecord>,
    #[serde(default)]
    pub entrances: Vec<ObstacleRecord>,
}

impl LayoutDocument {
    pub fn from_json(json: &str) -> DomainResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Obstacles of a scene, with exactly one exit.
///
/// The exit is stored in the obstacle list (last) so that accessibility and
/// cell relevance treat it like any other rectangle. Entrances are kept aside.
#[derive(Debug, Clone)]
pub struct ObstacleLayout {
    domain: Size,
    obstacles: Vec<Obstacle>,
    exit_index: usize,
    entrances: Vec<Obstacle>,
}

impl ObstacleLayout {
    pub fn new(domain: Size, obstacles: Vec<Obstacle>, exit: Obstacle) -> DomainResult<Self> {
        Self::with_entrances(domain, obstacles, exit, Vec::new())
    }

    pub fn with_entrances(
        domain: Size,
        mut obstacles: Vec<Obstacle>,
        exit: Obstacle,
        entrances: Vec<Obstacle>,
    ) -> DomainResult<Self> {
        if exit.kind() != ObstacleKind::Exit {
            return Err(DomainError::InvalidLayout {
                reason: format!("Obstacle {} is not an exit", exit.name()),
            });
        }
        if let Some(extra) = obstacles.iter().find(|o| o.kind() == ObstacleKind::Exit) {
            return Err(DomainError::InvalidLayout {
                reason: format!("Exit {} listed among regular obstacles", extra.name()),
            });
        }
        obstacles.push(exit);
        let mut seen = BTreeSet::new();
        for obstacle in obstacles.iter().chain(entrances.iter()) {
            if !seen.insert(obstacle.name()) {
                return Err(DomainError::InvalidLayout {
                    reason: format!("Duplicate obstacle name {}", obstacle.name()),
                });
            }
        }
        let exit_index = obstacles.len() - 1;
        Ok(Self {
            domain,
            obstacles,
            exit_index,
            entrances,
        })
    }

    /// Scales a layout document to `domain`.
    ///
    /// Zero exit dimensions become one domain unit. Zero or several exits are fatal.
    pub fn from_document(
        document: &LayoutDocument,
        domain: Size,
        corner_margin: f64,
        source_name: &str,
    ) -> DomainResult<Self> {
        match document.exits.len() {
            0 => {
                return Err(DomainError::MissingExit {
                    source_name: source_name.to_string(),
                })
            }
            1 => {}
            count => {
                return Err(DomainError::MultipleExits {
                    source_name: source_name.to_string(),
                    count,
                })
            }
        }

        let scale = |record: &ObstacleRecord, exit: bool| -> DomainResult<(Point, Size)> {
            if record.begin.iter().any(|f| !(0.0..=1.0).contains(f)) {
                return Err(DomainError::InvalidLayout {
                    reason: format!("Begin of {} is not a domain fraction: {:?}", record.name, record.begin),
                });
            }
            let begin = Point::new(record.begin[0] * domain.width, record.begin[1] * domain.height);
            let mut width = record.size[0] * domain.width;
            let mut height = record.size[1] * domain.height;
            if exit {
                if width == 0.0 {
                    width = 1.0;
                }
                if height == 0.0 {
                    height = 1.0;
                }
            }
            Ok((begin, Size::new(width, height)?))
        };

        let mut obstacles = Vec::with_capacity(document.obstacles.len());
        for record in &document.obstacles {
            let (begin, size) = scale(record, false)?;
            obstacles.push(Obstacle::new(record.name.clone(), ObstacleKind::Generic, begin, size, corner_margin));
        }

        let exit_record = &document.exits[0];
        let (begin, size) = scale(exit_record, true)?;
        let exit = Obstacle::new(exit_record.name.clone(), ObstacleKind::Exit, begin, size, corner_margin);

        let mut entrances = Vec::with_capacity(document.entrances.len());
        for record in &document.entrances {
            let (begin, size) = scale(record, false)?;
            entrances.push(
                Obstacle::new(record.name.clone(), ObstacleKind::Entrance, begin, size, corner_margin)
                    .with_spawn_rate(record.spawn_rate),
            );
        }

        Self::with_entrances(domain, obstacles, exit, entrances)
    }

    pub fn domain(&self) -> Size {
        self.domain
    }

    /// All obstacles, the exit included.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn exit(&self) -> &Obstacle {
        &self.obstacles[self.exit_index]
    }

    pub fn entrances(&self) -> &[Obstacle] {
        &self.entrances
    }

    pub fn get(&self, name: &str) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.name() == name)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.obstacles.iter().map(|o| o.name().to_string()).collect()
    }

    /// Obstacles that block visibility and movement.
    pub fn interior(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().filter(|o| o.is_interior())
    }

    /// Strictly inside the domain on both axes.
    pub fn is_within_boundaries(&self, point: &Point) -> bool {
        0.0 < point.x && point.x < self.domain.width && 0.0 < point.y && point.y < self.domain.height
    }

    /// True when no interior obstacle is crossed by `segment`.
    pub fn is_line_free(&self, segment: &LineSegment, strict: bool) -> bool {
        self.interior().all(|o| !o.is_crossed_by(segment, strict))
    }

    /// Interior obstacles crossed by `segment`.
    pub fn crossed_by<'a>(&'a self, segment: &'a LineSegment, strict: bool) -> impl Iterator<Item = &'a Obstacle> + 'a {
        self.interior().filter(move |o| o.is_crossed_by(segment, strict))
    }

    /// Accessibility over the full obstacle list. `at_start` also forbids permeable rectangles.
    pub fn is_accessible(&self, point: &Point, at_start: bool) -> bool {
        self.is_within_boundaries(point) && is_clear_of(self.obstacles.iter(), point, at_start)
    }
}

/// Accessibility against a subset of obstacles.
pub fn is_clear_of<'a, I>(obstacles: I, point: &Point, at_start: bool) -> bool
where
    I: IntoIterator<Item = &'a Obstacle>,
{
    obstacles
        .into_iter()
        .all(|o| !o.contains(point) || (!at_start && o.is_permeable()))
}
