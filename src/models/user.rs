// ABOUTME: User account model and subscription tiers with monthly budget ceilings
// ABOUTME: Tier limits gate the per-user budget guard before any billable call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Subscription tier determining the monthly processing budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionTier {
    /// $1.00/month of API spend, roughly 2 episodes
    Free,
    /// $7.00/month, roughly 15-20 episodes
    Pro,
    /// $20.00/month, 50+ episodes
    Growth,
}

impl SubscriptionTier {
    /// Monthly API cost ceiling for this tier, in cents
    #[must_use]
    pub const fn monthly_limit_cents(self) -> i64 {
        match self {
            Self::Free => 100,
            Self::Pro => 700,
            Self::Growth => 2_000,
        }
    }
}

impl Display for SubscriptionTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Free => "FREE",
            Self::Pro => "PRO",
            Self::Growth => "GROWTH",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SubscriptionTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(Self::Free),
            "PRO" => Ok(Self::Pro),
            "GROWTH" => Ok(Self::Growth),
            other => Err(AppError::internal(format!("unknown tier: {other}"))),
        }
    }
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Login email, unique
    pub email: String,
    /// bcrypt password hash; never serialized into API responses
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the email address has been verified; unverified users cannot process episodes
    pub email_verified: bool,
    /// Current subscription tier
    pub tier: SubscriptionTier,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new unverified account on the free tier
    #[must_use]
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            email_verified: false,
            tier: SubscriptionTier::Free,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_limits_are_ascending() {
        assert_eq!(SubscriptionTier::Free.monthly_limit_cents(), 100);
        assert_eq!(SubscriptionTier::Pro.monthly_limit_cents(), 700);
        assert_eq!(SubscriptionTier::Growth.monthly_limit_cents(), 2_000);
    }

    #[test]
    fn test_tier_round_trips_through_strings() {
        for tier in [
            SubscriptionTier::Free,
            SubscriptionTier::Pro,
            SubscriptionTier::Growth,
        ] {
            assert_eq!(tier.to_string().parse::<SubscriptionTier>().unwrap(), tier);
        }
    }
}
