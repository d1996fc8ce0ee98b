use anomaly_detector::collector::collect_site;
use anomaly_detector::utils::{
    init_from_config, validate_input_file, validate_output_file, write_json,
};
use anomaly_detector::{AppConfig, DetectorRegistry, OutlierReport, ReportAssembler, SiteData};
use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{info, info_span};

/// Detect warning and alarm periods in collected site metrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML, or JSON with a .json extension).
    /// Defaults to $CONFIG_FILE, then config.toml
    #[arg(long)]
    conf_file: Option<String>,

    /// Where to write the collected data
    #[arg(long, default_value = "data.json")]
    data_file: String,

    /// Where to write the outlier reports
    #[arg(long, default_value = "report.json")]
    report_file: String,

    /// Overwrite existing output files
    #[arg(long)]
    overwrite: bool,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let args = Args::parse();
    let conf_file = args.conf_file.clone().unwrap_or_else(AppConfig::default_path);

    validate_input_file(&conf_file).context("conf-file")?;
    validate_output_file(&args.data_file, args.overwrite).context("data-file")?;
    validate_output_file(&args.report_file, args.overwrite).context("report-file")?;

    let config = AppConfig::from_file(&conf_file)?;
    init_from_config(&config.logging)?;
    info!(conf_file = %conf_file, datasets = config.datasets.len(), "Configuration loaded");

    let assembler = ReportAssembler::new(DetectorRegistry::from_config(&config.detection_methods))
        .with_workers(config.analysis.workers)
        .with_span(info_span!("analysis"));

    let mut rng = rand::thread_rng();
    let mut sites: Vec<SiteData> = Vec::with_capacity(config.datasets.len());
    let mut reports: Vec<OutlierReport> = Vec::with_capacity(config.datasets.len());

    for dataset in &config.datasets {
        let site = collect_site(dataset, &config.gen_collect_filters, Utc::now(), &mut rng)?;
        let report = assembler.assemble(&site, dataset);
        report.print_summary();

        sites.push(site);
        reports.push(report);
    }

    write_json(&sites, &args.data_file)?;
    write_json(&reports, &args.report_file)?;
    info!(data_file = %args.data_file, report_file = %args.report_file, "Results saved");

    Ok(())
}
