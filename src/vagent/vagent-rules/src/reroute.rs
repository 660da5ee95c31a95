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
use crate::directive::{find_directive, header, parse_hostname};
use crate::rule::{append_identity_headers, Rule, Verdict};
use crate::trace::{DiagnosticSink, ProcessingTrace};
use std::collections::BTreeSet;
use std::sync::Arc;
use vagent_common::{DeliveryQueue, MailContext, Rcpt, RecipientCategory, Route};
use vagent_config::Config;

/// The set of domains the relay accepts mail for, queried by the
/// accepted-domains exemption policy.
///
/// Implemented by the hosting pipeline over its own domain store; a plain
/// `BTreeSet<String>` of lower-cased domains works out of the box.
pub trait AcceptedDomains: Send + Sync {
    /// whether mail for this domain is accepted locally.
    fn is_locally_accepted(&self, domain: &str) -> bool;
}

impl AcceptedDomains for BTreeSet<String> {
    fn is_locally_accepted(&self, domain: &str) -> bool {
        self.contains(&domain.to_lowercase())
    }
}

/// Which recipients a reroute rule leaves on their organizational route.
pub enum ExemptionPolicy {
    /// nobody is exempt, every recipient is rerouted.
    None,
    /// recipients whose domain the relay accepts locally are exempt.
    AcceptedDomains(Arc<dyn AcceptedDomains>),
    /// recipients matching the configured exclusion lists are exempt.
    ExclusionLists {
        /// lower-cased exempted domains.
        domains: BTreeSet<String>,
        /// lower-cased exempted full addresses.
        addresses: BTreeSet<String>,
    },
    /// recipients categorized upstream as part of the organization are
    /// exempt. This variant keeps the recipient's own delivery queue.
    Categorization,
}

impl ExemptionPolicy {
    /// why this recipient is left untouched, `None` when it must be
    /// rerouted.
    fn exemption(&self, rcpt: &Rcpt) -> Option<String> {
        match self {
            Self::None => None,
            Self::AcceptedDomains(accepted) => accepted
                .is_locally_accepted(rcpt.address.domain())
                .then(|| format!("domain {} is locally accepted", rcpt.address.domain())),
            Self::ExclusionLists { domains, addresses } => {
                if domains.contains(&rcpt.address.domain().to_lowercase()) {
                    Some(format!("domain {} is excluded", rcpt.address.domain()))
                } else if addresses.contains(&rcpt.address.full().to_lowercase()) {
                    Some(format!("address {} is excluded", rcpt.address.full()))
                } else {
                    None
                }
            }
            Self::Categorization => (rcpt.category == RecipientCategory::InSameOrganization)
                .then(|| format!("recipient {} is in the same organization", rcpt.address)),
        }
    }

    /// queue semantic attached to the overrides this policy produces.
    const fn delivery_queue(&self) -> DeliveryQueue {
        match self {
            Self::Categorization => DeliveryQueue::UseRecipientDomain,
            _ => DeliveryQueue::UseOverrideDomain,
        }
    }
}

/// Forces delivery of the message through the hostname carried by the
/// [`header::REROUTE_TARGET`] directive, recipient per recipient.
///
/// Four variants exist, differing only by exemption policy; see the
/// constructors. All of them stamp [`header::PRODUCT_NAME`] on the messages
/// they touch and refuse to act again on a message already carrying it, so
/// a misconfigured pair of relays pointing at each other cannot loop the
/// same message forever.
pub struct Reroute {
    name: &'static str,
    product_value: &'static str,
    policy: ExemptionPolicy,
    debug_enabled: bool,
    log_untouched: bool,
    sink: Arc<dyn DiagnosticSink>,
}

impl Reroute {
    /// reroute every recipient, no exemption.
    #[must_use]
    pub fn all(config: &Config, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            name: "reroute-all",
            product_value: "VAgent-RerouteAll",
            policy: ExemptionPolicy::None,
            debug_enabled: config.rules.reroute.debug_enabled,
            log_untouched: true,
            sink,
        }
    }

    /// reroute recipients whose domain is not accepted locally.
    #[must_use]
    pub fn external_by_accepted_domains(
        config: &Config,
        accepted: Arc<dyn AcceptedDomains>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            name: "reroute-accepted-domains",
            product_value: "VAgent-RerouteAcceptedDomains",
            policy: ExemptionPolicy::AcceptedDomains(accepted),
            debug_enabled: config.rules.reroute.debug_enabled,
            log_untouched: false,
            sink,
        }
    }

    /// reroute recipients not matching the configured exclusion lists.
    #[must_use]
    pub fn external_by_exclusions(config: &Config, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            name: "reroute-exclusions",
            product_value: "VAgent-RerouteExclusions",
            policy: ExemptionPolicy::ExclusionLists {
                domains: config.rules.reroute.exempted_domain_set(),
                addresses: config.rules.reroute.exempted_address_set(),
            },
            debug_enabled: config.rules.reroute.debug_enabled,
            log_untouched: false,
            sink,
        }
    }

    /// reroute recipients categorized as outside the organization, keeping
    /// their own delivery queue.
    #[must_use]
    pub fn external_by_categorization(config: &Config, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            name: "reroute-categorization",
            product_value: "VAgent-RerouteCategorization",
            policy: ExemptionPolicy::Categorization,
            debug_enabled: config.rules.reroute.debug_enabled,
            log_untouched: false,
            sink,
        }
    }

    fn apply(
        &self,
        raw: &str,
        ctx: &mut MailContext,
        trace: &mut ProcessingTrace,
    ) -> Verdict {
        let target = match parse_hostname(header::REROUTE_TARGET, raw) {
            Err(error) => {
                trace.append(&error);
                return Verdict::rejected();
            }
            Ok(target) => target,
        };
        trace.append(format!("rerouting recipients through {target}"));

        let queue = self.policy.delivery_queue();
        for rcpt in &mut ctx.envelop.rcpt {
            if let Some(reason) = self.policy.exemption(rcpt) {
                trace.append(format!("recipient {rcpt} left untouched: {reason}"));
                continue;
            }
            rcpt.route = Route::Override {
                domain: target.clone(),
                queue,
            };
            trace.append(format!(
                "recipient {rcpt} rerouted to {target} ({queue})"
            ));
        }

        append_identity_headers(
            &mut ctx.mail,
            &[(header::PRODUCT_NAME, self.product_value)],
            trace,
        );
        Verdict::applied()
    }
}

impl Rule for Reroute {
    fn name(&self) -> &'static str {
        self.name
    }

    fn log_untouched_messages(&self) -> bool {
        self.log_untouched
    }

    fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    fn execute(
        &self,
        ctx: &mut MailContext,
        trace: &mut ProcessingTrace,
    ) -> anyhow::Result<Verdict> {
        if ctx.mail.is_system {
            trace.append("message skipped: system generated");
            return Ok(Verdict::skipped());
        }

        if ctx.mail.headers.contains(header::PRODUCT_NAME) {
            trace.append(format!(
                "message untouched: {} already present, possible mail loop",
                header::PRODUCT_NAME
            ));
            return Ok(Verdict::rejected());
        }

        let Some(raw) =
            find_directive(&ctx.mail.headers, header::REROUTE_TARGET).map(str::to_string)
        else {
            trace.append(format!(
                "message untouched: {} is not set",
                header::REROUTE_TARGET
            ));
            return Ok(Verdict::skipped());
        };

        Ok(self.apply(&raw, ctx, trace))
    }
}
