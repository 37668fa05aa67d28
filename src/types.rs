//! Shared identifiers, coordinates, and the order model used across the system.

use std::fmt;
use std::time::Duration;

/// Unique identifier for an order, assigned by the restaurant.
pub type OrderId = u64;
/// Index into the restaurant table.
pub type RestaurantId = usize;
/// Index into the customer table.
pub type CustomerId = usize;
/// Unique identifier for a driver thread.
pub type DriverId = usize;

/// A point on the delivery grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub x: i64,
    pub y: i64,
}

impl Coordinate {
    pub const ORIGIN: Coordinate = Coordinate { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Grid distance `|dx| + |dy|` to another coordinate.
    pub fn manhattan(self, other: Coordinate) -> u64 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

/// Simulated time needed to drive between two points.
pub fn travel_time(from: Coordinate, to: Coordinate, unit: Duration) -> Duration {
    let distance = u32::try_from(from.manhattan(to)).unwrap_or(u32::MAX);
    unit.saturating_mul(distance)
}

/// A ready order sitting in (or taken from) the handoff slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub restaurant: RestaurantId,
    pub customer: CustomerId,
}

/// One entry of the order stream read by the restaurant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderRecord {
    /// A real order from `restaurant` to `customer`.
    Order {
        restaurant: RestaurantId,
        customer: CustomerId,
    },
    /// Sentinel entry: the kitchen is quiet for this record.
    Idle,
}

/// Driver activity as shown in status reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverStatus {
    #[default]
    Idle,
    Busy,
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverStatus::Idle => f.write_str("idle"),
            DriverStatus::Busy => f.write_str("busy"),
        }
    }
}

/// Point-in-time view of one driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverSnapshot {
    pub id: DriverId,
    pub position: Coordinate,
    pub status: DriverStatus,
    pub completed: u64,
}

impl DriverSnapshot {
    /// Fresh driver parked at the origin.
    pub fn new(id: DriverId) -> Self {
        Self {
            id,
            position: Coordinate::ORIGIN,
            status: DriverStatus::Idle,
            completed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_ignores_direction() {
        let a = Coordinate::new(-2, 7);
        let b = Coordinate::new(3, -1);
        assert_eq!(a.manhattan(b), 13);
        assert_eq!(b.manhattan(a), 13);
        assert_eq!(a.manhattan(a), 0);
    }

    #[test]
    fn delivery_travel_time_is_deterministic() {
        let unit = Duration::from_millis(250);
        let start = Coordinate::ORIGIN;
        let restaurant = Coordinate::new(3, 4);
        let customer = Coordinate::new(1, 1);
        let to_restaurant = travel_time(start, restaurant, unit);
        let to_customer = travel_time(restaurant, customer, unit);
        assert_eq!(to_restaurant, Duration::from_millis(1750));
        assert_eq!(to_customer, Duration::from_millis(1250));
        assert_eq!(to_restaurant + to_customer, Duration::from_millis(3000));
    }

    #[test]
    fn extreme_coordinates_saturate_instead_of_overflowing() {
        let far_west = Coordinate::new(i64::MIN, 0);
        let far_east = Coordinate::new(i64::MAX, 1);
        assert_eq!(far_west.manhattan(far_east), u64::MAX);
        let unit = Duration::from_millis(250);
        assert_eq!(
            travel_time(far_west, far_east, unit),
            unit.saturating_mul(u32::MAX)
        );
    }

    #[test]
    fn status_renders_lowercase() {
        assert_eq!(DriverStatus::Idle.to_string(), "idle");
        assert_eq!(DriverStatus::Busy.to_string(), "busy");
    }
}
