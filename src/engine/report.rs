//! Operator-facing banners and run statistics

use crate::engine::store::OutputPaths;
use crate::error::{LoadError, ProbeError};
use crate::proxy::checker::{CheckerConfig, Endpoint};
use crate::proxy::models::ValidationRecord;
use std::path::Path;
use std::time::Duration;

/// Number of fastest proxies listed in the summary
pub const TOP_FASTEST: usize = 5;

/// Default number of checked proxies between progress lines
pub const DEFAULT_PROGRESS_EVERY: usize = 100;

/// Statistics for a finished or interrupted run
#[derive(Debug, Clone)]
pub struct Summary {
    pub total: usize,
    pub checked: usize,
    pub passed: usize,
    pub elapsed: Duration,
    pub avg_liveness_ms: Option<f64>,
    pub avg_consistency_ms: Option<f64>,
    pub avg_total_ms: Option<f64>,
    /// Fastest accepted proxies by overall average latency, ascending
    pub fastest: Vec<ValidationRecord>,
    /// Completed output writes, including the startup reset
    pub flushes: usize,
}

fn mean(records: &[ValidationRecord], field: impl Fn(&ValidationRecord) -> u64) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: u64 = records.iter().map(field).sum();
    Some(sum as f64 / records.len() as f64)
}

impl Summary {
    pub fn new(
        records: &[ValidationRecord],
        total: usize,
        checked: usize,
        elapsed: Duration,
    ) -> Self {
        let mut fastest = records.to_vec();
        fastest.sort_by_key(|r| r.avg_total_ms);
        fastest.truncate(TOP_FASTEST);

        Self {
            total,
            checked,
            passed: records.len(),
            elapsed,
            avg_liveness_ms: mean(records, |r| r.liveness_ms),
            avg_consistency_ms: mean(records, |r| r.avg_consistency_ms),
            avg_total_ms: mean(records, |r| r.avg_total_ms),
            fastest,
            flushes: 0,
        }
    }

    pub fn with_flushes(mut self, flushes: usize) -> Self {
        self.flushes = flushes;
        self
    }

    /// Accepted share of checked proxies, in percent
    pub fn pass_rate(&self) -> Option<f64> {
        (self.checked > 0).then(|| self.passed as f64 / self.checked as f64 * 100.0)
    }

    /// Checked proxies per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.checked as f64 / secs
        } else {
            0.0
        }
    }
}

fn fmt_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.0}ms", v))
}

/// Prints progress and summaries to stdout
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    progress_every: usize,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self {
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl ConsoleReporter {
    pub fn new(progress_every: usize) -> Self {
        Self {
            progress_every: progress_every.max(1),
        }
    }

    pub fn banner(
        &self,
        input: &Path,
        total: usize,
        config: &CheckerConfig,
        outputs: &OutputPaths,
    ) {
        println!("{}", "=".repeat(72));
        println!("  proxy-sieve");
        println!("  input       : {} ({} proxies)", input.display(), total);
        println!("  liveness    : {}", config.liveness);
        println!("  consistency : {}", config.consistency);
        println!("  concurrency : {}", config.concurrency);
        println!(
            "  output      : {} / {}",
            outputs.plain.display(),
            outputs.json.display()
        );
        println!("{}", "=".repeat(72));
    }

    pub fn endpoint_status(&self, endpoint: &Endpoint, status: &Result<(), ProbeError>) {
        match status {
            Ok(()) => println!("  [ok] {} online", endpoint.name),
            Err(ProbeError::Status(code)) => {
                println!("  [!!] {} responded {}", endpoint.name, code)
            }
            Err(_) => println!("  [xx] {} offline", endpoint.name),
        }
    }

    pub fn precheck_result(&self, online: usize, total: usize) {
        if online < total {
            println!(
                "\nWarning: only {}/{} endpoints online, results may be inaccurate\n",
                online, total
            );
        } else {
            println!("\nAll endpoints online\n");
        }
    }

    pub fn accepted(&self, record: &ValidationRecord, checked: usize, total: usize, passed: usize) {
        println!(
            "[pass] {:<24} liveness {:>5}ms | consistency {:>5}ms + {:>5}ms | avg {:>5}ms | {}/{} checked, {} passed",
            record.proxy.as_str(),
            record.liveness_ms,
            record.consistency1_ms,
            record.consistency2_ms,
            record.avg_total_ms,
            checked,
            total,
            passed
        );
    }

    pub fn rejected(&self, checked: usize, total: usize, passed: usize) {
        if checked % self.progress_every == 0 {
            println!("  ... [{}/{}] | {} passed", checked, total, passed);
        }
    }

    pub fn summary(&self, summary: &Summary, outputs: &OutputPaths) {
        println!("\n{}", "=".repeat(72));
        println!("  total in file     : {}", summary.total);
        println!("  checked           : {}", summary.checked);
        println!("  passed            : {}", summary.passed);
        println!(
            "  pass rate         : {}",
            summary
                .pass_rate()
                .map_or_else(|| "n/a".to_string(), |r| format!("{:.2}%", r))
        );
        println!("  avg liveness      : {}", fmt_ms(summary.avg_liveness_ms));
        println!("  avg consistency   : {}", fmt_ms(summary.avg_consistency_ms));
        println!("  avg total         : {}", fmt_ms(summary.avg_total_ms));
        println!("  elapsed           : {:.1}s", summary.elapsed.as_secs_f64());
        println!("  throughput        : {:.1} proxies/s", summary.throughput());

        if !summary.fastest.is_empty() {
            println!("\n  Top {} fastest:", summary.fastest.len());
            for (i, r) in summary.fastest.iter().enumerate() {
                println!(
                    "    {}. {} - liveness {}ms | consistency {}ms | avg {}ms",
                    i + 1,
                    r.proxy,
                    r.liveness_ms,
                    r.avg_consistency_ms,
                    r.avg_total_ms
                );
            }
        }

        println!("\n  {} ({} proxies)", outputs.plain.display(), summary.passed);
        println!("  {} ({} records)", outputs.json.display(), summary.passed);
        println!("{}", "=".repeat(72));
    }

    pub fn input_unusable(&self, error: &LoadError) {
        eprintln!("Error: {}", error);
        eprintln!("Create the file with one proxy per line, for example:");
        eprintln!("  192.168.1.1:8080");
        eprintln!("  10.0.0.1:3128");
    }

    pub fn interrupted(&self, summary: &Summary, outputs: &OutputPaths) {
        println!(
            "\nInterrupted: {} proxies saved to {} ({}/{} checked)",
            summary.passed,
            outputs.plain.display(),
            summary.checked,
            summary.total
        );
    }
}
