//! Output formatting for CLI

use crate::pipeline::TrainingResult;

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

pub fn print_result(result: &TrainingResult) {
    print_kv("Episodes", &format_number(result.episodes));
    print_kv("Total steps", &format_number(result.total_steps));
    print_kv("Best score", &format_number(result.best_score));
    print_kv("Mean score", &format!("{:.1}", result.mean_score));
    print_kv("Crashes", &format_number(result.crashes));
    if result.unconverged_refits > 0 {
        print_kv("Unconverged refits", &format_number(result.unconverged_refits));
    }
}
