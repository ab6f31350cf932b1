use openabl_bench_runner::prelude::*;

fn main() -> BenchmarkResult<()> {
    let cli = init::<SizeSweepCli>();

    let install = OpenAblInstall::locate_from_env(cli.openabl_dir())?;
    let config = cli.bench_config()?;

    let mut driver = BenchmarkDriver::new(config, OpenAblRunner::new(install), SystemClock::new());
    let report = driver.run()?;

    report.print_summary();
    let failed = report.failed().count();
    if failed > 0 {
        log::warn!("{failed} of {} sweeps failed", report.outcomes.len());
    }

    Ok(())
}
