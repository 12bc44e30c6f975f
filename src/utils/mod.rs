// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Utility modules
//!
//! Common utilities for the nodeflow CLI.

pub mod colors;

pub use colors::*;
