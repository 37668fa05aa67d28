//! Driver (consumer) loop and the delivery trip simulation.

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::dispatch::{Claim, Dispatch};
use crate::tables::Tables;
use crate::types::{Coordinate, DriverId, Order, travel_time};

/// One worker's private view of itself; the shared board mirrors it.
pub struct Driver {
    id: DriverId,
    position: Coordinate,
}

impl Driver {
    pub fn new(id: DriverId) -> Self {
        Self {
            id,
            position: Coordinate::ORIGIN,
        }
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    /// Claim and deliver orders until the clock expires.
    pub fn run(&mut self, dispatch: &Dispatch, tables: &Tables, travel_unit: Duration) {
        loop {
            match dispatch.claim(self.id) {
                Claim::Expired => {
                    debug!("driver {} off shift at position ({})", self.id, self.position);
                    return;
                }
                Claim::Order(order) => self.deliver(dispatch, tables, order, travel_unit),
            }
        }
    }

    // Runs without the dispatch lock held, apart from the short board updates.
    fn deliver(
        &mut self,
        dispatch: &Dispatch,
        tables: &Tables,
        order: Order,
        travel_unit: Duration,
    ) {
        let (Some(restaurant), Some(customer)) =
            (tables.restaurant(order.restaurant), tables.customer(order.customer))
        else {
            warn!(
                "driver {} dropping order {} with unknown endpoints ({} -> {})",
                self.id, order.id, order.restaurant, order.customer
            );
            dispatch.abandon_delivery(self.id);
            return;
        };

        let to_restaurant = travel_time(self.position, restaurant, travel_unit);
        info!(
            "Driver {}: starting order {}, heading to restaurant {} (travel time = {} ms)",
            self.id,
            order.id,
            order.restaurant,
            to_restaurant.as_millis()
        );
        self.travel(dispatch, restaurant, to_restaurant);

        let to_customer = travel_time(self.position, customer, travel_unit);
        info!(
            "Driver {}: picked up order {}, heading to customer {} (travel time = {} ms)",
            self.id,
            order.id,
            order.customer,
            to_customer.as_millis()
        );
        self.travel(dispatch, customer, to_customer);

        dispatch.complete_delivery(self.id);
    }

    fn travel(&mut self, dispatch: &Dispatch, destination: Coordinate, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
        self.position = destination;
        dispatch.record_position(self.id, destination);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Handoff;
    use crate::types::DriverStatus;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn delivery_ends_at_customer_after_both_legs() {
        let tables = Tables::new(vec![Coordinate::new(3, 4)], vec![Coordinate::new(1, 1)]);
        let dispatch = Dispatch::new(10, 1, false);
        let order = Order {
            id: 0,
            restaurant: 0,
            customer: 0,
        };
        assert_eq!(dispatch.hand_off(Some(order)), Handoff::Published(0));
        let Claim::Order(claimed) = dispatch.claim(0) else {
            panic!("expected an order");
        };

        let mut driver = Driver::new(0);
        let unit = Duration::from_millis(2);
        let start = Instant::now();
        driver.deliver(&dispatch, &tables, claimed, unit);

        // (3 + 4) + (2 + 3) grid units.
        assert!(start.elapsed() >= unit * 12);
        assert_eq!(driver.position(), Coordinate::new(1, 1));
        let board = dispatch.snapshot();
        assert_eq!(board.drivers[0].position, Coordinate::new(1, 1));
        assert_eq!(board.drivers[0].status, DriverStatus::Idle);
        assert_eq!(board.drivers[0].completed, 1);
    }

    #[test]
    fn unknown_endpoint_leaves_driver_idle_and_uncounted() {
        let tables = Tables::new(vec![Coordinate::new(3, 4)], Vec::new());
        let dispatch = Dispatch::new(10, 1, false);
        let order = Order {
            id: 0,
            restaurant: 0,
            customer: 5,
        };
        assert_eq!(dispatch.hand_off(Some(order)), Handoff::Published(0));
        let Claim::Order(claimed) = dispatch.claim(0) else {
            panic!("expected an order");
        };
        assert_eq!(dispatch.snapshot().drivers[0].status, DriverStatus::Busy);

        let mut driver = Driver::new(0);
        driver.deliver(&dispatch, &tables, claimed, Duration::from_millis(1));

        let board = dispatch.snapshot();
        assert_eq!(board.drivers[0].status, DriverStatus::Idle);
        assert_eq!(board.drivers[0].completed, 0);
        assert_eq!(driver.position(), Coordinate::ORIGIN);
    }

    #[test]
    fn driver_is_busy_while_travelling() {
        let tables = Arc::new(Tables::new(
            vec![Coordinate::new(0, 0)],
            vec![Coordinate::new(20, 0)],
        ));
        let dispatch = Arc::new(Dispatch::new(1, 1, false));
        let order = Order {
            id: 0,
            restaurant: 0,
            customer: 0,
        };
        assert_eq!(dispatch.hand_off(Some(order)), Handoff::Published(0));

        let handle = {
            let dispatch = Arc::clone(&dispatch);
            let tables = Arc::clone(&tables);
            std::thread::spawn(move || {
                let mut driver = Driver::new(0);
                driver.run(&dispatch, &tables, Duration::from_millis(5));
                driver.position()
            })
        };

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(dispatch.snapshot().drivers[0].status, DriverStatus::Busy);
        // Expiry mid-trip does not cut the delivery short.
        dispatch.advance_clock();
        let position = handle.join().expect("driver thread panicked");
        assert_eq!(position, Coordinate::new(20, 0));
        assert_eq!(dispatch.snapshot().total_completed(), 1);
    }
}
