/*
 * vAgent SMTP routing rules
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
use crate::{Address, Domain};

/// Delivery queue selection when a routing override is in effect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize,
)]
pub enum DeliveryQueue {
    /// the delivery queue is named after the override domain.
    UseOverrideDomain,
    /// the delivery queue keeps the recipient's own domain, the override
    /// domain is only used as next hop.
    UseRecipientDomain,
}

/// How the mail bound to one recipient leaves the relay.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Route {
    /// normal DNS / organizational resolution.
    Organization,
    /// delivery forced through an explicit routing domain.
    Override {
        /// next hop for this recipient.
        domain: Domain,
        /// queue selection semantic.
        queue: DeliveryQueue,
    },
}

impl Default for Route {
    fn default() -> Self {
        Self::Organization
    }
}

/// Categorization of a recipient, computed by the hosting pipeline
/// upstream of the routing rules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize, serde::Deserialize,
)]
pub enum RecipientCategory {
    /// the recipient belongs to the relay's own organization.
    InSameOrganization,
    /// external, or not categorized yet.
    Other,
}

impl Default for RecipientCategory {
    fn default() -> Self {
        Self::Other
    }
}

/// representation of a recipient with its routing decision.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rcpt {
    /// Email address of the recipient.
    pub address: Address,
    /// Route used to deliver the email bound to this recipient.
    pub route: Route,
    /// Categorization computed by the host pipeline.
    pub category: RecipientCategory,
}

impl Rcpt {
    /// create a new recipient from its address.
    /// the route defaults to organizational resolution.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            route: Route::default(),
            category: RecipientCategory::default(),
        }
    }

    /// create a new recipient with its upstream categorization.
    #[must_use]
    pub fn with_category(address: Address, category: RecipientCategory) -> Self {
        Self {
            address,
            route: Route::default(),
            category,
        }
    }

    /// the domain the message is handed to for this recipient,
    /// overrides taken into account.
    #[must_use]
    pub fn effective_destination(&self) -> String {
        match &self.route {
            Route::Organization => self.address.domain().to_lowercase(),
            Route::Override { domain, .. } => domain.as_str().to_string(),
        }
    }
}

impl From<Address> for Rcpt {
    fn from(this: Address) -> Self {
        Self::new(this)
    }
}

impl std::fmt::Display for Rcpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address)
    }
}
