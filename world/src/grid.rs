//! Static spatial discretisation owned by the world crate.

use grid_skirmish_core::{GridCoord, GridView, Node, WorldPoint};
use thiserror::Error;

/// Reasons grid construction fails.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GridError {
    /// The node radius cannot carve the world into cells.
    #[error("node_radius must be positive, got {radius}")]
    NonPositiveRadius {
        /// Radius supplied by the caller.
        radius: f32,
    },
    /// The requested world extent resolves to zero or negative cells.
    #[error("grid dimensions resolve to {size_x} x {size_y} cells")]
    DegenerateDimensions {
        /// Resolved column count.
        size_x: i64,
        /// Resolved row count.
        size_y: i64,
    },
}

/// Dense node grid built once at startup from world-space sampling.
///
/// Walkability is decided at construction by probing the injected obstacle
/// and waypoint predicates at each cell center; the grid is never resized or
/// mutated afterwards, so it can be shared read-only across every agent.
#[derive(Clone, Debug)]
pub struct GridField {
    size_x: i32,
    size_y: i32,
    world_width: f32,
    world_height: f32,
    nodes: Vec<Node>,
}

impl GridField {
    /// Builds the grid covering `world_width x world_height` world units.
    ///
    /// Cell centers are anchored at the bottom-left corner of the bounding
    /// box, offset by `(x * diameter + radius, y * diameter + radius)`. A
    /// cell is walkable unless `obstacle` holds at its center, with
    /// `waypoint` forcibly overriding the cell back to walkable.
    pub fn build<O, W>(
        world_width: f32,
        world_height: f32,
        node_radius: f32,
        mut obstacle: O,
        mut waypoint: W,
    ) -> Result<Self, GridError>
    where
        O: FnMut(WorldPoint) -> bool,
        W: FnMut(WorldPoint) -> bool,
    {
        if node_radius <= 0.0 {
            return Err(GridError::NonPositiveRadius {
                radius: node_radius,
            });
        }

        let diameter = node_radius * 2.0;
        let size_x = (world_width / diameter).round() as i64;
        let size_y = (world_height / diameter).round() as i64;

        if size_x <= 0 || size_y <= 0 || size_x > i64::from(i32::MAX) || size_y > i64::from(i32::MAX)
        {
            return Err(GridError::DegenerateDimensions { size_x, size_y });
        }

        let size_x = size_x as i32;
        let size_y = size_y as i32;

        let bottom_left_x = -world_width / 2.0;
        let bottom_left_y = -world_height / 2.0;

        let mut nodes = Vec::with_capacity(size_x as usize * size_y as usize);
        for y in 0..size_y {
            for x in 0..size_x {
                let center = WorldPoint::new(
                    bottom_left_x + x as f32 * diameter + node_radius,
                    bottom_left_y + y as f32 * diameter + node_radius,
                );

                let walkable = !obstacle(center) || waypoint(center);
                nodes.push(Node::new(walkable, center, GridCoord::new(x, y)));
            }
        }

        Ok(Self {
            size_x,
            size_y,
            world_width,
            world_height,
            nodes,
        })
    }

    /// Number of columns and rows in the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (i32, i32) {
        (self.size_x, self.size_y)
    }

    /// Captures a read-only view over the node grid.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(
            &self.nodes,
            self.size_x,
            self.size_y,
            self.world_width,
            self.world_height,
        )
    }

    /// Converts a spawn cell into world space.
    ///
    /// Spawning uses a one-unit-per-cell convention independent of the node
    /// geometry, mirroring how external spawn requests address the grid.
    #[must_use]
    pub fn spawn_position(&self, cell: GridCoord) -> WorldPoint {
        WorldPoint::new(cell.x() as f32, cell.y() as f32)
    }
}
