use std::fs;

use class_alert::settings::{
    load_settings, serialize_settings, setting_case_rule, RunConfig,
};
use class_alert::ScraperError;

fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn loads_run_config_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write(
        &dir,
        "setting.txt",
        "worker_num=8\r\nup_percentage_thrshold=7 # 漲\r\ndown_percentage_thrshold=6\r\ncrawler_name=概念股\r\nnot_crawler_name=\r\nprice_column=成交\r\n",
    );
    let names = write(&dir, "name.txt", "概念股 = ConceptStock\n# comment only\n\n");

    let config = RunConfig::load(&settings, &names).unwrap();
    assert_eq!(config.worker_num, 8);
    assert_eq!(config.rule.up, 7.0);
    assert_eq!(config.rule.down, 6.0);
    assert_eq!(config.rule.price_column, "成交");
    assert_eq!(config.rule.previous_close_column, "昨收");
    assert!(config.excluded.is_empty());
    // ids keep their case
    assert_eq!(config.names["概念股"], "ConceptStock");
}

#[test]
fn saved_settings_reload_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "a.txt", "crawler_name=上市類股,集團股\nworker_num=3\nflag=on,off\n");
    let rule = setting_case_rule();
    let first = load_settings(&path, &rule).unwrap();
    assert_eq!(first["flag"], vec!["ON", "OFF"]);

    let copy = write(&dir, "b.txt", &serialize_settings(&first));
    assert_eq!(load_settings(&copy, &rule).unwrap(), first);
}

#[test]
fn missing_threshold_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write(&dir, "setting.txt", "worker_num=1\ncrawler_name=上市類股\n");
    let names = write(&dir, "name.txt", "上市類股=LISTED_STOCK\n");
    let err = RunConfig::load(&settings, &names).unwrap_err();
    assert!(matches!(err, ScraperError::Config(ref msg) if msg.contains("up_percentage_thrshold")));
}

#[test]
fn unreadable_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.txt");
    assert!(matches!(
        load_settings(&missing, &setting_case_rule()),
        Err(ScraperError::Config(_))
    ));
}
