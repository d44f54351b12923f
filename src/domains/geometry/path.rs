use super::coordinate::Point;
use super::segment::LineSegment;
use crate::common::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Contiguous sequence of segments: every segment starts where the previous one ends.
///
/// Paths are consumed from the front and extended at the back. An empty path
/// is terminal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    segments: VecDeque<LineSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a path from segments, checking contiguity of every consecutive pair.
    pub fn from_segments<I: IntoIterator<Item = LineSegment>>(segments: I) -> DomainResult<Self> {
        let mut path = Path::new();
        for segment in segments {
            path.push(segment)?;
        }
        Ok(path)
    }

    fn check_connectivity(first: &LineSegment, second: &LineSegment) -> DomainResult<()> {
        if first.end().approx_eq(&second.begin()) {
            Ok(())
        } else {
            Err(DomainError::DisconnectedPath {
                reason: format!("{} & {} do not connect", first, second),
            })
        }
    }

    pub fn push(&mut self, segment: LineSegment) -> DomainResult<()> {
        if let Some(last) = self.segments.back() {
            Self::check_connectivity(last, &segment)?;
        }
        self.segments.push_back(segment);
        Ok(())
    }

    /// Extends the path with a segment from the current last point to `point`.
    pub fn push_point(&mut self, point: Point) -> DomainResult<()> {
        let last = self.last_point().ok_or_else(|| DomainError::DisconnectedPath {
            reason: "Path must have segments before adding points".to_string(),
        })?;
        self.segments.push_back(LineSegment::new(last, point));
        Ok(())
    }

    /// Appends all segments of `other`, checking the seam between the two paths.
    pub fn extend(&mut self, other: Path) -> DomainResult<()> {
        if let (Some(last), Some(first)) = (self.segments.back(), other.segments.front()) {
            Self::check_connectivity(last, first)?;
        }
        self.segments.extend(other.segments);
        Ok(())
    }

    pub fn pop_next_segment(&mut self) -> Option<LineSegment> {
        self.segments.pop_front()
    }

    pub fn first_point(&self) -> Option<Point> {
        self.segments.front().map(|s| s.begin())
    }

    pub fn last_point(&self) -> Option<Point> {
        self.segments.back().map(|s| s.end())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn length(&self) -> f64 {
        self.segments.iter().map(LineSegment::length).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineSegment> {
        self.segments.iter()
    }

    /// True when every consecutive pair shares its joint exactly.
    pub fn is_contiguous(&self) -> bool {
        self.segments
            .iter()
            .zip(self.segments.iter().skip(1))
            .all(|(a, b)| a.end() == b.begin())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path:")?;
        for segment in &self.segments {
            writeln!(f, "{}", segment)?;
        }
        Ok(())
    }
}
