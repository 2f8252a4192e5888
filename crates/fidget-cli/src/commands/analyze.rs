//! `fidget analyze` — randomness quality battery over generated output.

use fidget_tests::{BatterySummary, run_all};

pub fn run(input: &str, output_path: Option<&str>) {
    let numbers = match read_numbers(input) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Failed to read {input}: {e}");
            std::process::exit(1);
        }
    };
    if numbers.is_empty() {
        eprintln!("{input} contains no numbers");
        std::process::exit(1);
    }

    let summary = run_all(&numbers);
    print_report(&numbers, &summary);

    if let Some(path) = output_path {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    eprintln!("Failed to write {path}: {e}");
                } else {
                    println!("\nWrote JSON report to {path}");
                }
            }
            Err(e) => eprintln!("Failed to serialize report: {e}"),
        }
    }
}

fn read_numbers(path: &str) -> std::io::Result<Vec<u16>> {
    let body = std::fs::read_to_string(path)?;
    Ok(body
        .split_whitespace()
        .filter_map(|tok| tok.parse::<u16>().ok())
        .filter(|&v| v < fidget_tests::RANGE as u16)
        .collect())
}

fn print_report(numbers: &[u16], summary: &BatterySummary) {
    println!("\n{}", "=".repeat(60));
    println!("RANDOMNESS QUALITY ANALYSIS ({} numbers)", numbers.len());
    println!("{}", "=".repeat(60));

    for result in &summary.results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        println!("\n{}:", result.name);
        println!("  Status: {status}");
        println!("  Statistic: {:.4}", result.statistic);
        if let Some(p) = result.p_value {
            println!("  p-value: {p:.4}");
        }
        println!("  {}", result.details);
    }

    println!("\n{}", "-".repeat(40));
    println!(
        "OVERALL SCORE: {}/{} tests passed ({:.0}%)",
        summary.passed,
        summary.total,
        summary.pass_rate * 100.0
    );
    println!("VERDICT: {} randomness quality", summary.verdict);
}
