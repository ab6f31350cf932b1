use openabl_bench_runner::prelude::*;

fn main() -> BenchmarkResult<()> {
    let cli = init::<ThreadScalingCli>();

    let install = OpenAblInstall::locate_from_env(cli.openabl_dir())?;

    let mut driver = BenchmarkDriver::new(
        cli.bench_config(),
        OpenAblRunner::new(install),
        SystemClock::new(),
    );
    let report = driver.run()?;

    report.print_summary();
    if let Some(outcome) = report.failed().next() {
        log::warn!(
            "Thread scaling for {} did not complete, the chart will be missing points",
            outcome.table.model()
        );
    }

    Ok(())
}
