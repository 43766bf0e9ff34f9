// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod fees;
pub mod metadata;
pub mod provider;
pub mod throttle;
