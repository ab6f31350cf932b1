use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use openabl_bench_plotter::{render_svg_file, Aggregation, ChartOptions, PlotMode, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Plot the results of OpenABL benchmark runs.
#[derive(Debug, Parser)]
#[command(about, long_about = None)]
struct PlotCli {
    /// The result directory written by `size-sweep` or `thread-scaling`
    result_dir: PathBuf,

    /// Which result files to plot
    #[clap(long, value_enum, default_value_t = PlotMode::Grouped)]
    mode: PlotMode,

    /// Where to write the SVG chart. Defaults to `<mode>.svg` inside the result directory.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Chart width in pixels
    #[clap(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    /// Chart height in pixels
    #[clap(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = PlotCli::parse();

    let aggregation = Aggregation::scan(&cli.result_dir, cli.mode)
        .with_context(|| format!("Cannot plot results in {}", cli.result_dir.display()))?;
    if aggregation.is_empty() {
        bail!(
            "No {} result files found in {}",
            cli.mode,
            cli.result_dir.display()
        );
    }

    let output = cli
        .output
        .unwrap_or_else(|| cli.result_dir.join(format!("{}.svg", cli.mode)));
    render_svg_file(
        &aggregation,
        &output,
        ChartOptions {
            width: cli.width,
            height: cli.height,
        },
    )?;

    Ok(())
}
