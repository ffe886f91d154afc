//! Terminal rendering of an [`AnalysisReport`].

use crate::export::csv::escape;
use anyhow::Result;
use console::style;
use kestrel_core::analysis::{AnalysisReport, EndpointStats, OriginMetric};
use kestrel_core::stats::Distribution;
use kestrel_core::threshold::{AdviceBasis, ResolvedThreshold};

pub fn output_json(report: &AnalysisReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

pub fn output_pretty(report: &AnalysisReport) -> Result<()> {
    let run = &report.run;

    println!("\n{}", style("Access Log Analysis").bold().cyan());
    println!("{}", style("===================").cyan());

    println!("\n{}", style("Processing").bold());
    println!("  Lines in file:      {}", run.total_lines);
    println!(
        "  Lines parsed:       {} ({:.1}%)",
        style(run.parsed_lines).yellow(),
        run.parsed_pct
    );
    println!("  Lines skipped:      {}", run.skipped_lines);
    println!("  Unique endpoints:   {}", run.unique_endpoints);
    println!("  Slow threshold:     {}", describe_threshold(&run.threshold));

    match (&run.first_timestamp, &run.last_timestamp) {
        (Some(first), Some(last)) => {
            println!("  Date range:         {} to {}", first, last);
            if let Some(duration) = &run.duration_display {
                println!("  Duration:           {}", duration);
            }
        }
        _ => println!("  Date range:         {}", style("Not available").dim()),
    }

    let general = &report.general;
    if general.total == 0 {
        println!("\n  {}", style("No requests could be parsed").dim());
        println!();
        return Ok(());
    }

    println!("\n{}", style("General").bold());
    println!("  Total requests:     {}", general.total);
    println!(
        "  Slow requests:      {} ({:.1}%)",
        style(general.slow).red(),
        general.slow_pct
    );
    println!(
        "  499 errors:         {} ({:.1}%)",
        general.error_499, general.error_499_pct
    );
    println!(
        "  CDN requests:       {} ({:.1}%)",
        general.cdn, general.cdn_pct
    );
    println!(
        "  Direct requests:    {} ({:.1}%)",
        general.direct, general.direct_pct
    );
    print_distribution("All", &general.response_times);
    print_distribution("CDN", &general.cdn_response_times);
    print_distribution("Direct", &general.direct_response_times);
    if general.error_499 > 0 {
        println!(
            "  499 response time:  mean {:.3}s, max {:.3}s",
            general.error_499_response_times.mean, general.error_499_response_times.max
        );
    }

    println!("\n{}", style("HTTP Status Codes").bold());
    for row in &report.statuses {
        println!(
            "  {} {:<24} {:>8} ({:>5.1}%)  cdn {:<6} direct {:<6} mean {:.3}s",
            style(row.status).yellow(),
            row.description.as_deref().unwrap_or("-"),
            row.total,
            row.percentage,
            row.cdn,
            row.direct,
            row.mean_time
        );
    }

    println!("\n{}", style("CDN vs Direct").bold());
    let origins = &report.origins;
    for metric in [&origins.total, &origins.slow, &origins.error_499] {
        print_origin_metric(metric);
    }
    if let Some(times) = &origins.mean_time {
        println!(
            "  {:<16} cdn {:.3}s  direct {:.3}s  diff {:+.3}s",
            "Mean time", times.cdn, times.direct, times.difference
        );
    }

    for section in &report.status_endpoints {
        println!(
            "\n{} {} ({} requests)",
            style(format!("Endpoints with status {}", section.status)).bold(),
            section.description.as_deref().unwrap_or(""),
            section.total
        );
        for (i, row) in section.endpoints.iter().enumerate() {
            println!(
                "  {:>2}. {} - {} ({:.1}%), mean {:.3}s",
                i + 1,
                row.endpoint,
                row.requests,
                row.percentage,
                row.mean_time
            );
        }
    }

    println!("\n{}", style("Top Endpoints").bold());
    print_endpoints(&report.top_endpoints);

    if !report.slowest_endpoints.is_empty() {
        println!("\n{}", style("Slowest Endpoints").bold());
        print_endpoints(&report.slowest_endpoints);
    }

    if !report.hourly.is_empty() {
        println!("\n{}", style("Hourly").bold());
        for row in &report.hourly {
            println!(
                "  {}:00  {:>7} requests  slow {:>5.1}%  499 {:>5.1}%  mean {:.3}s",
                row.hour, row.total, row.slow_pct, row.error_499_pct, row.mean_time
            );
        }
    }

    println!();
    Ok(())
}

fn describe_threshold(threshold: &ResolvedThreshold) -> String {
    match threshold.advice.map(|a| a.basis) {
        None => format!("{:.2}s", threshold.seconds),
        Some(AdviceBasis::Percentiles { p75, p90 }) => format!(
            "{:.2}s (suggested from p90 {:.3}s, p75 {:.3}s)",
            threshold.seconds, p90, p75
        ),
        Some(AdviceBasis::Mean { mean }) => format!(
            "{:.2}s (suggested from mean {:.3}s)",
            threshold.seconds, mean
        ),
        Some(AdviceBasis::Default) => format!("{:.2}s (default)", threshold.seconds),
    }
}

fn print_distribution(label: &str, dist: &Distribution) {
    if dist.count == 0 {
        return;
    }
    println!(
        "  {:<8} mean {:.3}s  p95 {:.3}s  p99 {:.3}s  max {:.3}s",
        label, dist.mean, dist.p95, dist.p99, dist.max
    );
}

fn print_origin_metric(metric: &OriginMetric) {
    println!(
        "  {:<16} cdn {} ({:.1}%)  direct {} ({:.1}%)  diff {:+}",
        metric.metric,
        metric.cdn,
        metric.cdn_pct,
        metric.direct,
        metric.direct_pct,
        metric.difference
    );
}

fn print_endpoints(rows: &[EndpointStats]) {
    for (i, ep) in rows.iter().enumerate() {
        println!(
            "  {:>2}. {}  {} requests, mean {:.3}s, max {:.3}s, slow {:.1}%, 499 {}",
            i + 1,
            style(&ep.endpoint).green(),
            ep.total,
            ep.mean_time,
            ep.max_time,
            ep.slow_pct,
            ep.errors_499
        );
    }
}

pub fn output_table(report: &AnalysisReport) -> Result<()> {
    let run = &report.run;
    let general = &report.general;

    println!("Metric,Value");
    println!("Total Lines,{}", run.total_lines);
    println!("Parsed Lines,{}", run.parsed_lines);
    println!("Skipped Lines,{}", run.skipped_lines);
    println!("Slow Threshold (s),{}", run.threshold.seconds);
    println!("Total Requests,{}", general.total);
    println!("Slow Requests,{}", general.slow);
    println!("499 Errors,{}", general.error_499);
    println!("CDN Requests,{}", general.cdn);
    println!("Direct Requests,{}", general.direct);
    println!("Mean Response Time (s),{:.3}", general.response_times.mean);
    println!("P95 Response Time (s),{:.3}", general.response_times.p95);
    println!("P99 Response Time (s),{:.3}", general.response_times.p99);

    println!();
    println!("Status,Requests,Percentage,CDN,Direct,Mean Time (s)");
    for row in &report.statuses {
        println!(
            "{},{},{:.1},{},{},{:.3}",
            row.status, row.total, row.percentage, row.cdn, row.direct, row.mean_time
        );
    }

    println!();
    println!("Endpoint,Requests,Mean Time (s),Max Time (s),Slow,Errors 499");
    for ep in &report.top_endpoints {
        println!(
            "{},{},{:.3},{:.3},{},{}",
            escape(&ep.endpoint),
            ep.total,
            ep.mean_time,
            ep.max_time,
            ep.slow,
            ep.errors_499
        );
    }

    println!();
    println!("Hour,Requests,Slow,Errors 499,Mean Time (s)");
    for row in &report.hourly {
        println!(
            "{},{},{},{},{:.3}",
            row.hour, row.total, row.slow, row.error_499, row.mean_time
        );
    }

    Ok(())
}
