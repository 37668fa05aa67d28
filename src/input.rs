//! Input file parsing: the setup header and the lazily-read order record stream.
//!
//! Layout: a driver count line, `TABLE_SIZE` restaurant lines `x y`,
//! `TABLE_SIZE` customer lines `x y`, then one `restaurant customer` order
//! record per line until end of file. A negative component marks an idle record.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;

use crate::error::{SetupError, SetupResult};
use crate::tables::Tables;
use crate::types::{Coordinate, OrderRecord};

/// Number of restaurant and customer lines in the file header.
pub const TABLE_SIZE: usize = 10;
/// Upper bound on driver threads a single run may start.
pub const MAX_DRIVERS: usize = 1024;

/// Everything the header describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Setup {
    pub driver_count: usize,
    pub tables: Tables,
}

/// Line reader that skips blank lines and remembers 1-based line numbers.
struct Lines<R> {
    reader: R,
    line_no: usize,
}

impl<R: BufRead> Lines<R> {
    fn next_line(&mut self) -> std::io::Result<Option<(usize, String)>> {
        loop {
            let mut buf = String::new();
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let trimmed = buf.trim();
            if !trimmed.is_empty() {
                return Ok(Some((self.line_no, trimmed.to_string())));
            }
        }
    }

    fn require(&mut self, what: impl Into<String>) -> SetupResult<(usize, String)> {
        self.next_line()?
            .ok_or_else(|| SetupError::MissingLine { what: what.into() })
    }
}

fn parse_pair(text: &str) -> Option<(i64, i64)> {
    let mut parts = text.split_whitespace();
    let first = parts.next()?.parse().ok()?;
    let second = parts.next()?.parse().ok()?;
    Some((first, second))
}

fn read_table<R: BufRead>(lines: &mut Lines<R>, kind: &str) -> SetupResult<Vec<Coordinate>> {
    let mut table = Vec::with_capacity(TABLE_SIZE);
    for index in 0..TABLE_SIZE {
        let (line, content) = lines.require(format!("{kind} {index}"))?;
        let (x, y) = parse_pair(&content).ok_or(SetupError::MalformedLine { line, content })?;
        table.push(Coordinate::new(x, y));
    }
    Ok(table)
}

/// Parse the header; the returned iterator yields the order records that follow.
pub fn read_setup<R: BufRead>(reader: R) -> SetupResult<(Setup, OrderLines<R>)> {
    let mut lines = Lines { reader, line_no: 0 };

    let (line, content) = lines.require("driver count")?;
    let first = content.split_whitespace().next().unwrap_or_default();
    let drivers: i64 = first.parse().map_err(|_| SetupError::MalformedLine {
        line,
        content: content.clone(),
    })?;
    let driver_count =
        usize::try_from(drivers).map_err(|_| SetupError::NegativeDriverCount(drivers))?;
    if driver_count > MAX_DRIVERS {
        return Err(SetupError::TooManyDrivers {
            count: driver_count,
            max: MAX_DRIVERS,
        });
    }

    let restaurants = read_table(&mut lines, "restaurant")?;
    let customers = read_table(&mut lines, "customer")?;
    let tables = Tables::new(restaurants, customers);

    let records = OrderLines {
        lines,
        restaurants: tables.restaurants().len(),
        customers: tables.customers().len(),
    };
    Ok((
        Setup {
            driver_count,
            tables,
        },
        records,
    ))
}

/// Open `path` and parse its header.
pub fn open(path: &Path) -> SetupResult<(Setup, OrderLines<BufReader<File>>)> {
    let file = File::open(path).map_err(|source| SetupError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_setup(BufReader::new(file))
}

/// Order records following the header, read one line at a time.
///
/// Lines that are not two integers, or that name an id outside the tables,
/// are logged and skipped. A read error ends the stream.
pub struct OrderLines<R> {
    lines: Lines<R>,
    restaurants: usize,
    customers: usize,
}

impl<R: BufRead> OrderLines<R> {
    fn parse(&self, line: usize, content: &str) -> Option<OrderRecord> {
        let Some((restaurant, customer)) = parse_pair(content) else {
            warn!("skipping malformed order line {line}: {content:?}");
            return None;
        };
        if restaurant < 0 || customer < 0 {
            return Some(OrderRecord::Idle);
        }
        let (restaurant, customer) = (restaurant as usize, customer as usize);
        if restaurant >= self.restaurants || customer >= self.customers {
            warn!("skipping order line {line}: unknown restaurant {restaurant} or customer {customer}");
            return None;
        }
        Some(OrderRecord::Order {
            restaurant,
            customer,
        })
    }
}

impl<R: BufRead> Iterator for OrderLines<R> {
    type Item = OrderRecord;

    fn next(&mut self) -> Option<OrderRecord> {
        loop {
            let (line, content) = match self.lines.next_line() {
                Ok(Some(next)) => next,
                Ok(None) => return None,
                Err(err) => {
                    warn!("order input unreadable, treating as exhausted: {err}");
                    return None;
                }
            };
            if let Some(record) = self.parse(line, &content) {
                return Some(record);
            }
        }
    }
}
