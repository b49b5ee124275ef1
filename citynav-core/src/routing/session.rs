//! Interactive navigation: a session owns one computed [`PathStack`] and
//! consumes it move by move, recomputing the route whenever the traveller
//! strays too far from the next target.

use geo::{Distance, Euclidean};
use log::{debug, info};
use petgraph::graph::NodeIndex;

use super::backtrace::PathStack;
use super::{RouteMetric, find_path_stack};
use crate::Error;
use crate::model::CityModel;
use crate::model::streets::Compass;

/// Session lifecycle. `Recalculating` is only ever observable from within
/// a move: recomputation is synchronous and resolves to `EnRoute` or
/// `Aborted` before the call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingStart,
    EnRoute,
    Recalculating,
    Arrived,
    Aborted,
}

/// Outcome of one successful move.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveEvent {
    /// Moved along `street`; still en route.
    Advanced { street: String },
    /// Moved along `street`, drifted past the deviation threshold, and the
    /// route was recomputed from the new position.
    Recalculated { street: String },
    /// Moved along `street` onto the final destination.
    Arrived { street: String },
}

#[derive(Debug)]
pub struct NavigationSession {
    state: SessionState,
    metric: RouteMetric,
    path: Option<PathStack>,
    current: NodeIndex,
    target: Option<NodeIndex>,
    destination: NodeIndex,
    deviation_threshold: f64,
}

impl NavigationSession {
    /// Takes ownership of a computed stack. The stack top must be the
    /// traveller's position; its base is the destination the session keeps
    /// aiming for across recalculations.
    pub fn new(
        mut path: PathStack,
        metric: RouteMetric,
        deviation_threshold: f64,
    ) -> Result<Self, Error> {
        let destination = path
            .base()
            .ok_or_else(|| Error::InvalidData("navigation needs a non-empty path".to_string()))?;
        let Some(current) = path.pop() else {
            return Err(Error::InvalidData(
                "navigation needs a non-empty path".to_string(),
            ));
        };
        let target = path.peek();
        let (state, path) = if target.is_none() {
            (SessionState::Arrived, None)
        } else {
            (SessionState::AwaitingStart, Some(path))
        };
        Ok(Self {
            state,
            metric,
            path,
            current,
            target,
            destination,
            deviation_threshold,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn metric(&self) -> RouteMetric {
        self.metric
    }

    pub fn current_node(&self) -> NodeIndex {
        self.current
    }

    /// Next intermediate target on the planned route.
    pub fn next_target(&self) -> Option<NodeIndex> {
        self.target
    }

    pub fn destination(&self) -> NodeIndex {
        self.destination
    }

    /// The unconsumed remainder of the planned route.
    pub fn remaining(&self) -> Option<&PathStack> {
        self.path.as_ref()
    }

    /// Octant from the current position toward the next target, for
    /// prompting the traveller.
    pub fn heading_hint(&self, model: &CityModel) -> Option<Compass> {
        let target = self.target?;
        let from = model.streets.point(self.current);
        let to = model.streets.point(target);
        let dx = to.x() - from.x();
        let dy = to.y() - from.y();
        let hint = match (dx, dy) {
            _ if dx == 0.0 && dy > 0.0 => Compass::North,
            _ if dx == 0.0 && dy < 0.0 => Compass::South,
            _ if dy == 0.0 && dx > 0.0 => Compass::East,
            _ if dy == 0.0 && dx < 0.0 => Compass::West,
            _ if dx > 0.0 && dy > 0.0 => Compass::Northeast,
            _ if dx < 0.0 && dy > 0.0 => Compass::Northwest,
            _ if dx > 0.0 && dy < 0.0 => Compass::Southeast,
            _ if dx < 0.0 && dy < 0.0 => Compass::Southwest,
            _ => return None,
        };
        Some(hint)
    }

    /// One directional move. An impossible direction is reported and
    /// changes nothing; a successful move advances the position, consumes
    /// reached targets, and triggers recalculation past the deviation
    /// threshold.
    pub fn advance(&mut self, model: &CityModel, heading: Compass) -> Result<MoveEvent, Error> {
        match self.state {
            SessionState::AwaitingStart | SessionState::EnRoute => {}
            _ => {
                return Err(Error::InvalidData(
                    "navigation session already finished".to_string(),
                ));
            }
        }

        let (next, street) = model
            .streets
            .go_to(self.current, heading)
            .ok_or(Error::InvalidDirection(heading))?;
        let street = street.to_string();

        self.state = SessionState::EnRoute;
        self.current = next;
        debug!("moved {heading} onto '{street}'");

        if Some(next) == self.target {
            if let Some(path) = self.path.as_mut() {
                path.pop();
                self.target = path.peek();
            }
            if self.target.is_none() {
                info!("destination reached");
                self.state = SessionState::Arrived;
                self.path = None;
                return Ok(MoveEvent::Arrived { street });
            }
            return Ok(MoveEvent::Advanced { street });
        }

        if let Some(target) = self.target {
            let drift = Euclidean.distance(
                model.streets.point(self.current),
                model.streets.point(target),
            );
            if drift >= self.deviation_threshold {
                info!("drifted {drift:.1} units from the next target, recalculating");
                self.recalculate(model, self.metric)?;
                return Ok(MoveEvent::Recalculated { street });
            }
        }
        Ok(MoveEvent::Advanced { street })
    }

    /// Switches the routing metric and recomputes the remaining route from
    /// the current position.
    pub fn switch_metric(&mut self, model: &CityModel, metric: RouteMetric) -> Result<(), Error> {
        match self.state {
            SessionState::AwaitingStart | SessionState::EnRoute => {}
            _ => {
                return Err(Error::InvalidData(
                    "navigation session already finished".to_string(),
                ));
            }
        }
        info!("switching metric to {metric:?} and recalculating");
        self.recalculate(model, metric)
    }

    /// Abandons the session and releases the stack.
    pub fn abort(&mut self) {
        self.state = SessionState::Aborted;
        self.path = None;
    }

    /// Discards the remaining stack and re-routes current -> destination
    /// under `metric`. Unreachable aborts the session.
    fn recalculate(&mut self, model: &CityModel, metric: RouteMetric) -> Result<(), Error> {
        self.state = SessionState::Recalculating;
        self.metric = metric;
        self.path = None;

        match find_path_stack(&model.streets, self.current, self.destination, metric) {
            Ok(mut fresh) => {
                // The fresh stack tops out at the current position.
                fresh.pop();
                self.target = fresh.peek();
                if self.target.is_none() {
                    self.state = SessionState::Arrived;
                    self.path = None;
                } else {
                    self.path = Some(fresh);
                    self.state = SessionState::EnRoute;
                }
                Ok(())
            }
            Err(err) => {
                info!("recalculation failed, aborting navigation");
                self.state = SessionState::Aborted;
                self.target = None;
                Err(err)
            }
        }
    }
}
