use crate::models::{Direction, Notification, StockRow, StockTable};
use crate::settings::AlertRule;

/// Percentage change from `previous` to `current`; `None` when it cannot be computed.
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let pct = (current - previous) / previous * 100.0;
    pct.is_finite().then_some(pct)
}

fn price(row: &StockRow, column: &str) -> Option<(String, f64)> {
    let text = row.get(column)?;
    let value = text.trim().parse::<f64>().ok()?;
    Some((text.to_string(), value))
}

/// Checks one stock against the rule. Stocks without usable prices yield `None`.
pub fn check(row: &StockRow, rule: &AlertRule) -> Option<Notification> {
    let (price_text, current) = price(row, &rule.price_column)?;
    let (previous_text, previous) = price(row, &rule.previous_close_column)?;
    let pct = percent_change(current, previous)?;

    let direction = if pct > rule.up {
        Direction::Up
    } else if pct < -rule.down {
        Direction::Down
    } else {
        return None;
    };

    Some(Notification {
        identity: row.identity.clone(),
        price: price_text,
        previous_close: previous_text,
        change_percent: pct,
        direction,
    })
}

/// Notifications for every stock whose change crosses a threshold, in row order.
pub fn evaluate(rows: &StockTable, rule: &AlertRule) -> Vec<Notification> {
    rows.iter().filter_map(|row| check(row, rule)).collect()
}
