use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::error::{Result, ScraperError};
use crate::models::{Categories, CategoryMap, StockRow, StockTable};
use crate::settings::NameMap;

static CLASS_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/class"]"#).expect("class link selector"));
static HEADER_WRAPPER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.table-header-wrapper").expect("header selector"));
static BODY_WRAPPER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.table-body-wrapper").expect("body selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("div.table-row").expect("row selector"));
// column cells carry the `Fxs(0)` utility class in both header and body
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse(r"div.Fxs\(0\)").expect("cell selector"));
static NAME_PART: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.Ell, span.Ell").expect("name selector"));

/// Text of an element, trimmed; `None` when there is none.
fn cell_text(element: &ElementRef) -> Option<String> {
    let text = element.text().collect::<String>();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The single string an element reduces to.
///
/// An element whose only child is a text node yields that text; one whose
/// only child is an element defers to it. No children, or more than one,
/// yields `None`. The name/code cell (two children) therefore counts as
/// empty just like a bare `<div></div>`.
pub fn node_string(element: &ElementRef) -> Option<String> {
    let mut children = element.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    if let Some(text) = only.value().as_text() {
        return Some(String::from(&**text));
    }
    ElementRef::wrap(only).and_then(|child| node_string(&child))
}

fn find_by_id<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().id() == Some(id))
}

/// Maps every configured group to the category links found in its container.
///
/// A group whose container id is missing from the page gets an empty mapping.
pub fn extract_categories(html: &str, names: &NameMap) -> CategoryMap {
    let document = Html::parse_document(html);
    let mut all = CategoryMap::new();

    for (group, id) in names {
        let mut categories = Categories::new();
        match find_by_id(&document, id) {
            Some(container) => {
                for link in container.select(&CLASS_LINK) {
                    if let Some(href) = link.value().attr("href") {
                        let name = cell_text(&link).unwrap_or_default();
                        categories.insert(name, href.to_string());
                    }
                }
            }
            None => warn!(group = %group, id = %id, "category container not found"),
        }
        all.insert(group.clone(), categories);
    }
    all
}

/// Column names of a listing page; index 0 is the name/code column.
pub fn extract_header(container: &ElementRef) -> Vec<String> {
    container
        .select(&CELL)
        .map(|cell| node_string(&cell).unwrap_or_default())
        .collect()
}

/// Drops the placeholder the site renders before a row's data columns.
///
/// The placeholder is the first cell that does not reduce to a single string
/// (usually the name/code cell). It and everything before it are discarded;
/// what follows is data, empty cells included. A row without any empty cell has
/// no data.
pub fn skip_leading_placeholder(cells: Vec<Option<String>>) -> Vec<Option<String>> {
    match cells.iter().position(Option::is_none) {
        Some(pos) => cells.into_iter().skip(pos + 1).collect(),
        None => Vec::new(),
    }
}

/// Removes thousands separators: `1,234.50` -> `1234.50`.
pub fn strip_separators(value: Option<String>) -> Option<String> {
    value.map(|v| v.replace(',', ""))
}

fn extract_row(index: usize, row: &ElementRef, header: &[String]) -> Result<StockRow> {
    let parts: Vec<Option<String>> = row.select(&NAME_PART).take(2).map(|e| cell_text(&e)).collect();
    let (name, code) = match parts.as_slice() {
        [Some(name), Some(code)] => (name, code),
        _ => {
            let found = parts.iter().filter(|p| p.is_some()).count();
            return Err(ScraperError::MalformedRow { index, found });
        }
    };

    let cells: Vec<Option<String>> = row
        .select(&CELL)
        .map(|cell| node_string(&cell).map(|v| v.trim().to_string()))
        .collect();
    if !cells.iter().any(Option::is_none) {
        warn!(row = index, identity = %format!("{}/{}", name, code), "no placeholder cell, row has no data");
    }
    let data = skip_leading_placeholder(cells);

    let mut stock = StockRow::new(name, code);
    for (column, value) in header.iter().skip(1).zip(data) {
        stock.set(column, strip_separators(value));
    }
    Ok(stock)
}

/// Parses a category listing page into its stock rows.
///
/// A page without a table body is an empty category and yields an empty
/// table. A row without both name and code fails the whole page.
pub fn extract_stock_table(html: &str) -> Result<StockTable> {
    let document = Html::parse_document(html);
    let mut table = StockTable::new();

    let body = match document.select(&BODY_WRAPPER).next() {
        Some(body) => body,
        None => return Ok(table),
    };
    let header = document
        .select(&HEADER_WRAPPER)
        .next()
        .map(|container| extract_header(&container))
        .ok_or(ScraperError::MissingSection("table header"))?;

    for (index, row) in body.select(&ROW).enumerate() {
        table.insert(extract_row(index, &row, &header)?);
    }
    Ok(table)
}
