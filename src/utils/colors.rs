// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Terminal output helpers
//!
//! Consistent markers for CLI reports. `colored` honours `NO_COLOR`.

use colored::Colorize;

/// Print a title underlined to at least 40 columns
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("{}", "═".repeat(title.chars().count().max(40)));
}

/// Print a section heading
pub fn print_section(title: &str) {
    println!();
    println!("{}:", title.bold());
}

pub fn print_bullet(content: &str) {
    println!("  • {}", content);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Errors go to stderr so they survive output redirection
pub fn print_error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}
