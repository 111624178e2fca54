// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod canonicalize;
pub mod codec;
pub mod controller;
pub mod facet_cache;
pub mod fetcher;
pub mod history;
pub mod http_client;
pub mod logging;
pub mod session;
pub mod view;
