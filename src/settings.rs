//! Loader for the `key=value,value` files (`setting.txt`, `name.txt`) and the
//! typed run configuration built from them.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, ScraperError};

pub const DEFAULT_HOST: &str = "https://tw.stock.yahoo.com";
pub const DEFAULT_PRICE_COLUMN: &str = "股價";
pub const DEFAULT_PREVIOUS_CLOSE_COLUMN: &str = "昨收";

const KEY_WORKER_NUM: &str = "worker_num";
const KEY_UP: &str = "up_percentage_thrshold";
const KEY_DOWN: &str = "down_percentage_thrshold";
const KEY_CRAWL: &str = "crawler_name";
const KEY_EXCLUDE: &str = "not_crawler_name";
const KEY_HOST: &str = "host";
const KEY_CLASS_URL: &str = "class_url";
const KEY_PRICE_COLUMN: &str = "price_column";
const KEY_PREVIOUS_CLOSE_COLUMN: &str = "previous_close_column";

pub type SettingMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Upper,
    Lower,
    Keep,
}

impl Case {
    fn apply(self, s: &str) -> String {
        match self {
            Case::Upper => s.to_uppercase(),
            Case::Lower => s.to_lowercase(),
            Case::Keep => s.to_string(),
        }
    }
}

/// Which case each key's values are normalized to.
#[derive(Debug, Clone)]
pub struct CaseRule {
    default: Case,
    overrides: Vec<(String, Case)>,
}

impl CaseRule {
    pub fn all(case: Case) -> Self {
        CaseRule {
            default: case,
            overrides: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, case: Case) -> Self {
        self.overrides.push((key.to_string(), case));
        self
    }

    fn for_key(&self, key: &str) -> Case {
        self.overrides
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, case)| *case)
            .unwrap_or(self.default)
    }
}

fn is_stripped(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\t' | ' ' | '\u{3000}')
}

/// Parses setting text. Whitespace (full-width included) is removed everywhere,
/// `#` starts a comment, and a repeated key replaces the earlier one.
pub fn parse_settings(text: &str, rule: &CaseRule) -> Result<SettingMap> {
    let mut data = SettingMap::new();
    for (number, raw) in text.lines().enumerate() {
        let line: String = raw.chars().filter(|c| !is_stripped(*c)).collect();
        let line = line.split('#').next().unwrap_or_default();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| {
            ScraperError::Config(format!("line {}: expected key=value, got {:?}", number + 1, line))
        })?;
        let case = rule.for_key(key);
        let values = value.split(',').map(|v| case.apply(v)).collect();
        data.insert(key.to_string(), values);
    }
    Ok(data)
}

pub fn load_settings(path: &Path, rule: &CaseRule) -> Result<SettingMap> {
    let text = fs::read_to_string(path)
        .map_err(|e| ScraperError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    parse_settings(&text, rule)
}

/// Writes a mapping back in `key=v1,v2` form, one key per line.
pub fn serialize_settings(data: &SettingMap) -> String {
    data.iter()
        .map(|(key, values)| format!("{}={}\n", key, values.join(",")))
        .collect()
}

/// Case rule for `setting.txt`: values upper-cased, urls left alone.
pub fn setting_case_rule() -> CaseRule {
    CaseRule::all(Case::Upper)
        .with(KEY_HOST, Case::Keep)
        .with(KEY_CLASS_URL, Case::Keep)
}

/// Case rule for `name.txt`: element ids are case-sensitive.
pub fn name_case_rule() -> CaseRule {
    CaseRule::all(Case::Keep)
}

/// group label -> id of the landing page element holding that group's links
pub type NameMap = BTreeMap<String, String>;

pub fn name_map(data: &SettingMap) -> NameMap {
    data.iter()
        .filter_map(|(label, ids)| ids.first().map(|id| (label.clone(), id.clone())))
        .collect()
}

/// Thresholds and column names the evaluator works with.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRule {
    pub up: f64,
    pub down: f64,
    pub price_column: String,
    pub previous_close_column: String,
}

impl AlertRule {
    pub fn new(up: f64, down: f64) -> Self {
        AlertRule {
            up,
            down,
            price_column: DEFAULT_PRICE_COLUMN.to_string(),
            previous_close_column: DEFAULT_PREVIOUS_CLOSE_COLUMN.to_string(),
        }
    }
}

/// Everything a run needs, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub worker_num: usize,
    pub rule: AlertRule,
    pub crawl_groups: Vec<String>,
    pub excluded: Vec<String>,
    pub host: String,
    pub class_url: String,
    pub names: NameMap,
}

fn first<'a>(data: &'a SettingMap, key: &str) -> Option<&'a str> {
    data.get(key)
        .and_then(|values| values.first())
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn required<'a>(data: &'a SettingMap, key: &str) -> Result<&'a str> {
    first(data, key).ok_or_else(|| ScraperError::Config(format!("missing setting {}", key)))
}

fn number<T: std::str::FromStr>(data: &SettingMap, key: &str) -> Result<T> {
    let raw = required(data, key)?;
    raw.parse()
        .map_err(|_| ScraperError::Config(format!("{} is not a valid number: {:?}", key, raw)))
}

impl RunConfig {
    pub fn from_maps(settings: &SettingMap, names: NameMap) -> Result<Self> {
        let worker_num: usize = number(settings, KEY_WORKER_NUM)?;
        if worker_num == 0 {
            return Err(ScraperError::Config(format!("{} must be at least 1", KEY_WORKER_NUM)));
        }

        let mut rule = AlertRule::new(number(settings, KEY_UP)?, number(settings, KEY_DOWN)?);
        if let Some(column) = first(settings, KEY_PRICE_COLUMN) {
            rule.price_column = column.to_string();
        }
        if let Some(column) = first(settings, KEY_PREVIOUS_CLOSE_COLUMN) {
            rule.previous_close_column = column.to_string();
        }

        let crawl_groups: Vec<String> = settings
            .get(KEY_CRAWL)
            .map(|v| v.iter().filter(|s| !s.is_empty()).cloned().collect())
            .unwrap_or_default();
        if crawl_groups.is_empty() {
            return Err(ScraperError::Config(format!("missing setting {}", KEY_CRAWL)));
        }
        if let Some(unknown) = crawl_groups.iter().find(|g| !names.contains_key(*g)) {
            return Err(ScraperError::Config(format!(
                "{} lists {:?}, which the name file does not declare",
                KEY_CRAWL, unknown
            )));
        }

        let excluded: Vec<String> = settings
            .get(KEY_EXCLUDE)
            .map(|v| v.iter().filter(|s| !s.is_empty()).cloned().collect())
            .unwrap_or_default();

        let host = first(settings, KEY_HOST)
            .unwrap_or(DEFAULT_HOST)
            .trim_end_matches('/')
            .to_string();
        let class_url = first(settings, KEY_CLASS_URL)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}/class", host));

        Ok(RunConfig {
            worker_num,
            rule,
            crawl_groups,
            excluded,
            host,
            class_url,
            names,
        })
    }

    pub fn load(settings_path: &Path, names_path: &Path) -> Result<Self> {
        let settings = load_settings(settings_path, &setting_case_rule())?;
        let names = name_map(&load_settings(names_path, &name_case_rule())?);
        Self::from_maps(&settings, names)
    }
}
