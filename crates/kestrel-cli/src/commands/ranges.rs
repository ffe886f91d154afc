use crate::OutputFormat;
use anyhow::Result;
use console::style;
use kestrel_detectors::CdnRanges;
use kestrel_detectors::origin::RangeOrigin;

/// Print the CDN table `analyze` would classify against
pub fn execute(refresh: bool, format: OutputFormat) -> Result<()> {
    let ranges = CdnRanges::resolve(refresh);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ranges)?),
        OutputFormat::Table => {
            println!("Range,Source");
            let source = source_label(ranges.origin());
            for net in ranges.ranges() {
                println!("{},{}", net, source);
            }
        }
        OutputFormat::Pretty => {
            println!(
                "\n{} ({}, {} ranges)",
                style("CDN Ranges").bold().cyan(),
                source_label(ranges.origin()),
                ranges.len()
            );
            for net in ranges.ranges() {
                println!("  {}", net);
            }
            println!();
        }
    }

    Ok(())
}

fn source_label(origin: RangeOrigin) -> &'static str {
    match origin {
        RangeOrigin::Builtin => "built-in",
        RangeOrigin::Fetched => "fetched",
    }
}
