// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod breaker;
pub mod catalog;
pub mod gas_policy;
pub mod monitor;
pub mod probe;
pub mod settlement;
pub mod transfer;
pub mod watcher;
