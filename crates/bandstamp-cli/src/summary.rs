use bandstamp_core::pipeline::config::StampConfig;
use bandstamp_core::pipeline::{AlignmentOutput, RegistrationResidual, WriteOutcome};
use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    warn: Style,
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
            path: Style::new().underlined(),
            warn: Style::new().yellow().bold(),
        }
    }
}

pub fn print_stamp_summary(config: &StampConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Bandstamp"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(9)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir().display())
    );
    println!();

    println!("  {}", s.header.apply_to("Target"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("RA, Dec"),
        s.value.apply_to(format!("{:.6}, {:.6}", config.ra, config.dec))
    );
    match config.center() {
        Some((col, row)) => println!(
            "    {:<12}{}",
            s.label.apply_to("Center"),
            s.value.apply_to(format!("{col}, {row}"))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Center"),
            s.disabled.apply_to("from WCS")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Stamps"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bands"),
        s.value.apply_to(config.bands.join(", "))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Reference"),
        s.method.apply_to(&config.reference_band)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{}x{} px", config.width, config.height))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Edge"),
        s.method.apply_to(config.edge)
    );
    if config.clip_negative {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Negatives"),
            s.method.apply_to("clipped")
        );
    }
    if !config.overwrite {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Overwrite"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();
}

pub fn print_band_results(output: &AlignmentOutput, outcomes: &[WriteOutcome]) {
    let s = Styles::new();

    println!();
    println!(
        "  {} {}",
        s.header.apply_to("Aligned at pixel"),
        s.value.apply_to(format!("({}, {})", output.center.0, output.center.1))
    );
    for (band, outcome) in output.bands.iter().zip(outcomes) {
        let shift = format!("{:+.3}, {:+.3}", band.shift.dcol, band.shift.drow);
        let status = match outcome {
            WriteOutcome::Written(_) => s.method.apply_to("written"),
            WriteOutcome::Skipped(_) => s.disabled.apply_to("skipped"),
        };
        println!(
            "    {:<6}{:<22}{:<10}{}",
            s.label.apply_to(&band.band),
            s.value.apply_to(shift),
            status,
            s.path.apply_to(outcome.path().display())
        );
    }
    println!();
}

pub fn print_registration(residuals: &[RegistrationResidual]) {
    let s = Styles::new();

    println!("  {}", s.header.apply_to("Registration check"));
    for r in residuals {
        let text = format!("{:+.3}, {:+.3}", r.residual.dcol, r.residual.drow);
        let value = if r.residual.magnitude() > bandstamp_core::consts::REGISTRATION_WARN_PIXELS {
            s.warn.apply_to(text)
        } else {
            s.value.apply_to(text)
        };
        println!("    {:<6}{}", s.label.apply_to(&r.band), value);
    }
    println!();
}
