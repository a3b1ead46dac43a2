// ABOUTME: Media acquisition: SSRF URL guard and the capped download resolver
// ABOUTME: The resolver trait is the seam the pipeline mocks in tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

/// Capped media download from storage keys and external URLs
pub mod resolver;
/// SSRF defence for user-supplied URLs
pub mod url_guard;

pub use resolver::{HttpMediaResolver, MediaSource, ResolvedMedia};
pub use url_guard::{resolve_and_pin, validate_external_url};
