use clap::Parser;
use hantek6022::{
    data::{
        controls::{Channel, SampleRate, VoltageRange},
        measurement::Measurements,
        units::ProbeAttenuation,
        waveform::RawFrame,
    },
    device::{DeviceId, Hantek6022, OpenError},
    driver::{DriverError, ScopeDriver},
};
use log::debug;
use serde::Serialize;
use snafu::{OptionExt, ResultExt, Snafu};
use std::time::{Duration, Instant};

/// Reads one frame from a Hantek 6022 and dumps it.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// USB bus of the scope, defaults to the first one found
    #[arg(long, requires = "address")]
    bus: Option<u8>,

    /// USB address of the scope on its bus
    #[arg(long, requires = "bus")]
    address: Option<u8>,

    /// Sample rate register code, e.g. 0x10 for 16 MSa/s
    #[arg(long, default_value = "0x01", value_parser = parse_code)]
    rate: u8,

    /// CH1 voltage range register code, e.g. 0x01 for ±5 V
    #[arg(long, default_value = "0x01", value_parser = parse_code)]
    range1: u8,

    /// CH2 voltage range register code
    #[arg(long, default_value = "0x01", value_parser = parse_code)]
    range2: u8,

    /// Samples per channel, at most 131072
    #[arg(long, default_value_t = 1024)]
    samples: usize,

    /// Probe attenuation applied to the measurements (x1 or x10)
    #[arg(long, default_value = "x1")]
    probe: ProbeAttenuation,

    /// Bytes per channel shown in the hex dump
    #[arg(long, default_value_t = 64)]
    dump: usize,

    /// Print the measurements as JSON instead
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("could not open the scope"))]
    Open { source: OpenError },
    #[snafu(display("unknown sample rate code 0x{code:02x}"))]
    UnknownRate { code: u8 },
    #[snafu(display("unknown voltage range code 0x{code:02x}"))]
    UnknownRange { code: u8 },
    #[snafu(display("talking to the scope"))]
    Driver { source: DriverError },
    #[snafu(display("writing JSON"))]
    Json { source: serde_json::Error },
}

#[derive(Serialize)]
struct Capture {
    device: DeviceId,
    sample_rate: SampleRate,
    ranges: [VoltageRange; 2],
    samples: usize,
    duration_ms: u128,
    measurements: [Measurements; 2],
}

fn parse_code(s: &str) -> Result<u8, std::num::ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

#[snafu::report]
fn main() -> Result<(), CliError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    debug!("{args:?}");

    let sample_rate =
        SampleRate::from_code(args.rate).context(UnknownRateSnafu { code: args.rate })?;
    let range = |code| VoltageRange::from_code(code).context(UnknownRangeSnafu { code });
    let ranges = [range(args.range1)?, range(args.range2)?];

    let mut scope = match (args.bus, args.address) {
        (Some(bus), Some(address)) => Hantek6022::open(DeviceId { bus, address }),
        _ => Hantek6022::open_first(),
    }
    .context(OpenSnafu)?;

    scope.set_sample_rate(sample_rate).context(DriverSnafu)?;
    for ch in Channel::ALL {
        scope
            .set_voltage_range(ch, ranges[ch.index()])
            .context(DriverSnafu)?;
    }

    let started = Instant::now();
    let raw = scope.read_raw(args.samples).context(DriverSnafu)?;
    let duration = started.elapsed();
    scope.close().context(DriverSnafu)?;

    let volts = raw.to_volts(ranges);
    let measurements = Channel::ALL
        .map(|ch| Measurements::compute(&volts[ch.index()], sample_rate.rate, args.probe));

    if args.json {
        let capture = Capture {
            device: scope.id(),
            sample_rate,
            ranges,
            samples: raw.len(),
            duration_ms: duration.as_millis(),
            measurements,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&capture).context(JsonSnafu)?
        );
        return Ok(());
    }

    print_capture(&scope, &raw, &measurements, ranges, args.dump, duration);
    Ok(())
}

fn print_capture(
    scope: &Hantek6022,
    raw: &RawFrame,
    measurements: &[Measurements; 2],
    ranges: [VoltageRange; 2],
    dump: usize,
    duration: Duration,
) {
    println!("{}: {} samples per channel", scope.id(), raw.len());

    for ch in Channel::ALL {
        let bytes = match ch {
            Channel::Ch1 => &raw.ch1,
            Channel::Ch2 => &raw.ch2,
        };
        println!("{ch} ({})", ranges[ch.index()]);
        let shown = &bytes[..dump.min(bytes.len())];
        println!("{}", pretty_hex::pretty_hex(&shown));
        println!("{}", measurements[ch.index()].for_display().join("  "));
    }

    println!("{} ms", duration.as_millis());
}
