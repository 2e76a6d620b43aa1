use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "class_alert")]
#[command(about = "Watch Yahoo TW stock categories for large intraday moves", long_about = None)]
pub struct Cli {
    /// Settings file (worker_num, thresholds, crawler_name, ...)
    #[arg(short, long, default_value = "setting.txt")]
    pub settings: PathBuf,

    /// Group label to landing page element id mapping
    #[arg(short, long, default_value = "name.txt")]
    pub names: PathBuf,

    /// Override worker_num from the settings file
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Print notifications as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Print the resolved category urls and exit
    #[arg(long)]
    pub list_targets: bool,

    #[arg(short, long)]
    pub verbose: bool,
}
