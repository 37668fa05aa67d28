//! Read-only restaurant and customer coordinate tables.

use crate::types::{Coordinate, CustomerId, RestaurantId};

/// Locations loaded at startup; never mutated once the run begins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tables {
    restaurants: Vec<Coordinate>,
    customers: Vec<Coordinate>,
}

impl Tables {
    pub fn new(restaurants: Vec<Coordinate>, customers: Vec<Coordinate>) -> Self {
        Self {
            restaurants,
            customers,
        }
    }

    pub fn restaurant(&self, id: RestaurantId) -> Option<Coordinate> {
        self.restaurants.get(id).copied()
    }

    pub fn customer(&self, id: CustomerId) -> Option<Coordinate> {
        self.customers.get(id).copied()
    }

    pub fn restaurants(&self) -> &[Coordinate] {
        &self.restaurants
    }

    pub fn customers(&self) -> &[Coordinate] {
        &self.customers
    }
}
