// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules for the storage schema.

pub mod messages;
pub mod sessions;
