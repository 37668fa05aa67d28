//! Restaurant (producer) loop: turns order records into orders in the handoff slot.

use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::dispatch::{Dispatch, Handoff};
use crate::types::{Order, OrderId, OrderRecord};

/// What the restaurant did before it stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProducerReport {
    pub published: u64,
    pub idle_records: u64,
    /// True when the loop stopped on clock expiry rather than end of input.
    pub expired: bool,
}

/// Feed `records` into the slot until they run out or the clock expires.
///
/// Idle records sleep for `idle_delay` without holding the lock. The source is
/// dropped (closing any file behind it) before returning.
pub fn run<I>(dispatch: &Dispatch, records: I, idle_delay: Duration) -> ProducerReport
where
    I: IntoIterator<Item = OrderRecord>,
{
    let mut records = records.into_iter().peekable();
    let mut report = ProducerReport::default();
    let mut next_id: OrderId = 0;

    while let Some(record) = records.next() {
        let offer = match record {
            OrderRecord::Order {
                restaurant,
                customer,
            } => Some(Order {
                id: next_id,
                restaurant,
                customer,
            }),
            OrderRecord::Idle => None,
        };

        match dispatch.hand_off(offer) {
            Handoff::Expired => {
                debug!("clock expired, restaurant closing");
                report.expired = true;
                break;
            }
            Handoff::Idle => {
                report.idle_records += 1;
                thread::sleep(idle_delay);
            }
            Handoff::Published(id) => {
                if let Some(order) = offer {
                    info!(
                        "Restaurant: order {id} ready ({} -> {})",
                        order.restaurant, order.customer
                    );
                }
                report.published += 1;
                next_id += 1;
            }
        }

        if records.peek().is_none() {
            dispatch.mark_run_end();
        }
    }

    dispatch.mark_run_end();
    drop(records);
    report
}
