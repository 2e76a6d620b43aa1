use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Category display name -> relative listing url, in page order.
///
/// A repeated name replaces the earlier url but keeps its position.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Categories {
    links: Vec<(String, String)>,
}

impl Categories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, href: String) {
        match self.links.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = href,
            None => self.links.push((name, href)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, href)| href.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links.iter().map(|(n, h)| (n.as_str(), h.as_str()))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// group label (e.g. 上市類股) -> its categories
pub type CategoryMap = BTreeMap<String, Categories>;

/// One stock as it appears on a category listing page.
///
/// `fields` keeps header order. A `None` value means the source cell was empty.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct StockRow {
    pub identity: String,
    pub fields: Vec<(String, Option<String>)>,
}

impl StockRow {
    pub fn new(name: &str, code: &str) -> Self {
        StockRow {
            identity: format!("{}/{}", name, code),
            fields: Vec::new(),
        }
    }

    /// Sets a column value; a repeated header name overwrites the earlier value.
    pub fn set(&mut self, header: &str, value: Option<String>) {
        match self.fields.iter_mut().find(|(name, _)| name == header) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((header.to_string(), value)),
        }
    }

    /// Value of a column, `None` when the column is missing or the cell was empty.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == header)
            .and_then(|(_, value)| value.as_deref())
    }
}

/// Rows of one listing page in extraction order, unique by identity.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StockTable {
    rows: Vec<StockRow>,
    index: HashMap<String, usize>,
}

impl StockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row. A duplicate identity replaces the earlier row but keeps its position.
    pub fn insert(&mut self, row: StockRow) {
        match self.index.get(&row.identity) {
            Some(&pos) => self.rows[pos] = row,
            None => {
                self.index.insert(row.identity.clone(), self.rows.len());
                self.rows.push(row);
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<&StockRow> {
        self.index.get(identity).map(|&pos| &self.rows[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &StockRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn notice_label(self) -> &'static str {
        match self {
            Direction::Up => "漲幅通知",
            Direction::Down => "跌幅通知",
        }
    }

    pub fn change_label(self) -> &'static str {
        match self {
            Direction::Up => "漲幅",
            Direction::Down => "跌幅",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    pub identity: String,
    pub price: String,
    pub previous_close: String,
    pub change_percent: f64,
    pub direction: Direction,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}){}, 當前股價:{}, 昨收:{}, {}:{}",
            self.direction.notice_label(),
            self.identity,
            self.price,
            self.previous_close,
            self.direction.change_label(),
            format_percent(self.change_percent)
        )
    }
}

/// Rounds to 5 decimals and always shows a fractional part (`10.0`, `-3.33333`).
pub fn format_percent(value: f64) -> String {
    let rounded = (value * 100_000.0).round() / 100_000.0;
    let text = rounded.to_string();
    if text.contains('.') || !rounded.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}
