use console::Style;
use clearsky_core::pipeline::config::{PipelineConfig, SelectionPolicy};
use clearsky_core::pipeline::PipelineReport;

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
            warn: Style::new().yellow(),
        }
    }
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Clearsky Pipeline"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(17)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Catalog"),
        s.path.apply_to(config.catalog.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    match &config.date_range {
        Some(range) => println!(
            "  {:<14}{}",
            s.label.apply_to("Window"),
            s.value.apply_to(format!(
                "{} .. {}",
                range.start.format("%Y-%m-%d"),
                range.end.format("%Y-%m-%d")
            ))
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Window"),
            s.disabled.apply_to("all dates")
        ),
    }
    if let Some(max) = config.max_cloud_cover_scene {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Max cloud"),
            s.value.apply_to(format!("{max:.0}%"))
        );
    }
    if let Some(extent) = &config.extent {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Extent"),
            s.value.apply_to(format!(
                "[{}, {}, {}, {}]",
                extent.min_x, extent.min_y, extent.max_x, extent.max_y
            ))
        );
    }
    println!();

    // Masking
    println!("  {}", s.header.apply_to("Masking"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Exclude"),
        s.value.apply_to(format!("{:?}", config.masking.excluded_classes))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("No-data"),
        s.value.apply_to(config.masking.classification_nodata)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Mask bands"),
        s.value.apply_to(if config.masking.mask_bands { "yes" } else { "no" })
    );
    println!();

    // Selection
    let sel = &config.selection;
    println!("  {}", s.header.apply_to("Selection"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Policy"),
        s.method.apply_to(sel.policy)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Min valid"),
        s.value.apply_to(format!("{:.0}%", sel.min_fraction_valid * 100.0))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bucket"),
        s.value.apply_to(sel.granularity)
    );
    if sel.policy == SelectionPolicy::RepresentativeSingleDate {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Search"),
            s.method.apply_to(sel.search.strategy)
        );
        match sel.search.max_combinations {
            Some(cap) => println!(
                "    {:<12}{}",
                s.label.apply_to("Cap"),
                s.value.apply_to(cap)
            ),
            None => println!(
                "    {:<12}{}",
                s.label.apply_to("Cap"),
                s.disabled.apply_to("none")
            ),
        }
        if !sel.allowed_months.is_empty() {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Months"),
                s.value.apply_to(format!("{:?}", sel.allowed_months))
            );
        }
    }
    println!();

    // Compositing
    println!("  {}", s.header.apply_to("Compositing"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Method"),
        s.method.apply_to("Median")
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bands"),
        s.value.apply_to(config.compositing.bands.join(", "))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Fill"),
        s.value.apply_to(config.compositing.fill_value)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Naming"),
        s.value.apply_to(config.naming_template_text())
    );
    println!();
}

pub fn print_report(report: &PipelineReport) {
    let s = Styles::new();

    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Considered"),
        s.value.apply_to(report.scenes_considered)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Selected"),
        s.value.apply_to(format!(
            "{} scene(s) in {} bucket(s)",
            report.selection.scene_count(),
            report.selection.buckets.len()
        ))
    );
    if let Some(distance) = report.selection.total_distance {
        println!(
            "  {:<14}{}",
            s.label.apply_to("DOY distance"),
            s.value.apply_to(distance)
        );
    }
    for bucket in &report.selection.skipped {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Skipped"),
            s.disabled.apply_to(format!("{bucket} (no eligible scene)"))
        );
    }
    for (id, error) in &report.scene_failures {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Scene failed"),
            s.warn.apply_to(format!("{id}: {error}"))
        );
    }
    for failure in &report.bucket_failures {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Bucket failed"),
            s.warn.apply_to(format!(
                "{} {}: {}",
                failure.bucket, failure.band, failure.error
            ))
        );
    }
    println!();
    for path in &report.written {
        println!("  {}", s.path.apply_to(path.display()));
    }
}
