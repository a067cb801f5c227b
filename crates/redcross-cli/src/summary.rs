use console::Style;
use redcross_core::kpv::{GaussianFit, Slice};
use redcross_core::pipeline::config::AnalysisConfig;
use redcross_core::pipeline::DetectionOutput;

use crate::commands::simulate::SimulateArgs;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
        }
    }
}

pub fn print_simulation_summary(args: &SimulateArgs, kp_true: f64, config: &AnalysisConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Redcross Simulation"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(19)));
    println!();

    println!("  {}", s.header.apply_to("Injected Signal"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Kp"),
        s.value.apply_to(format!("{kp_true:.1} km/s"))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Vrest"),
        s.value.apply_to(format!("{:.1} km/s", args.vrest))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(format!(
            "{} (phase {:.2} to {:.2})",
            args.frames, args.phase_start, args.phase_end
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Noise"),
        s.value.apply_to(format!("{} per pixel", args.noise))
    );
    println!();

    println!("  {}", s.header.apply_to("Analysis"));
    match config.align {
        Some(ref align) => println!(
            "    {:<12}{}",
            s.label.apply_to("Alignment"),
            s.method.apply_to(format!("{} over {}", align.interpolation, align.shifts))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Alignment"),
            s.disabled.apply_to("disabled")
        ),
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Velocities"),
        s.value.apply_to(&config.ccf.velocities)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Noise model"),
        s.method.apply_to(config.ccf.noise)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Template"),
        s.method.apply_to(config.ccf.interpolation)
    );
    println!();
}

pub fn print_detection_summary(output: &DetectionOutput, kp_true: f64, vrest_true: f64) {
    let s = Styles::new();
    let peak = &output.report.peak;

    println!();
    println!("  {}", s.header.apply_to("Detection"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Peak"),
        s.value.apply_to(format!(
            "Kp {:.1} km/s, Vrest {:.1} km/s",
            peak.kp, peak.vrest
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("SNR"),
        s.value.apply_to(format!("{:.2}", peak.snr))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Offset"),
        s.value.apply_to(format!(
            "dKp {:+.1} km/s, dVrest {:+.1} km/s",
            peak.kp - kp_true,
            peak.vrest - vrest_true
        ))
    );
    print_fit(&s, &output.report.horizontal);
    print_fit(&s, &output.report.vertical);
    println!();
}

fn print_fit(s: &Styles, slice: &Slice) {
    let label = format!("{} fit", slice.axis);
    match slice.fit {
        Some(Ok(GaussianFit { center, sigma, .. })) => println!(
            "    {:<12}{}",
            s.label.apply_to(label),
            s.value.apply_to(format!("centre {center:.2} km/s, sigma {sigma:.2} km/s"))
        ),
        Some(Err(ref e)) => println!(
            "    {:<12}{}",
            s.label.apply_to(label),
            s.disabled.apply_to(format!("unavailable ({e})"))
        ),
        None => {}
    }
}
