// SPDX-License-Identifier: GPL-3.0-or-later

pub mod args;
pub mod config;
pub mod diagnostic;
pub mod invocation;
pub mod modes;
pub mod output;
