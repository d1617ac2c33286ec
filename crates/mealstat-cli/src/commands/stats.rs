//! Stats command - aggregate statistics over the order dataset.

use std::path::PathBuf;

use clap::Args;
use console::style;

use mealstat_core::export::read_dataset_file;
use mealstat_core::extract::rules::format_inr;
use mealstat_core::OrderStats;

use super::load_config;

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    /// Dataset CSV to read (default: export.output_file from config)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of restaurants in each ranking
    #[arg(long, default_value = "10")]
    top: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: StatsFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StatsFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub fn run(args: StatsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let offset = config.extraction.reporting_offset()?;
    let input = args
        .input
        .unwrap_or_else(|| config.export.output_file.clone());

    if !input.exists() {
        anyhow::bail!(
            "Dataset not found at {}. Run 'mealstat batch' first.",
            input.display()
        );
    }

    let records = read_dataset_file(&input, &config.export.timestamp_format, offset)?;
    let stats = OrderStats::compute(&records, args.top);

    match args.format {
        StatsFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        StatsFormat::Text => print!("{}", format_text(&stats)),
    }

    Ok(())
}

fn format_text(stats: &OrderStats) -> String {
    let mut output = String::new();
    let totals = &stats.totals;

    output.push_str(&format!("{}\n", style("Totals").bold()));
    output.push_str(&format!("  Orders:          {}\n", totals.orders));
    output.push_str(&format!("  Total spent:     {}\n", format_inr(totals.total_spent)));
    output.push_str(&format!("  Total discount:  {}\n", format_inr(totals.total_discount)));
    output.push_str(&format!(
        "  Average order:   {}\n",
        format_inr(totals.average_order_value)
    ));

    if let Some(delivery) = &stats.delivery {
        output.push_str(&format!(
            "  Delivery time:   {:.1} min avg ({:.0}-{:.0}) over {} orders\n",
            delivery.average_mins, delivery.min_mins, delivery.max_mins, delivery.measured_orders
        ));
    }

    if !stats.monthly.is_empty() {
        output.push_str(&format!("\n{}\n", style("By month").bold()));
        for month in &stats.monthly {
            output.push_str(&format!(
                "  {}  {:>4} orders  {:>14}\n",
                month.month,
                month.order_count,
                format_inr(month.total_spent)
            ));
        }
    }

    if !stats.top_by_spend.is_empty() {
        output.push_str(&format!("\n{}\n", style("Top restaurants by spend").bold()));
        for (i, r) in stats.top_by_spend.iter().enumerate() {
            output.push_str(&format!(
                "  {:>2}. {}  {}\n",
                i + 1,
                r.restaurant_name,
                format_inr(r.total_spent)
            ));
        }

        output.push_str(&format!("\n{}\n", style("Top restaurants by orders").bold()));
        for (i, r) in stats.top_by_orders.iter().enumerate() {
            output.push_str(&format!(
                "  {:>2}. {}  {} orders\n",
                i + 1,
                r.restaurant_name,
                r.order_count
            ));
        }
    }

    if totals.orders > 0 {
        output.push_str(&format!("\n{}\n", style("Orders by weekday").bold()));
        for day in &stats.by_weekday {
            output.push_str(&format!("  {}  {}\n", day.weekday, day.orders));
        }

        output.push_str(&format!("\n{}\n", style("Orders by hour").bold()));
        for hour in stats.by_hour.iter().filter(|h| h.orders > 0) {
            output.push_str(&format!("  {:02}:00  {}\n", hour.hour, hour.orders));
        }
    }

    output
}
