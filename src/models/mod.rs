// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod facet;
pub mod form;
pub mod page;
pub mod query;
pub mod settings;
