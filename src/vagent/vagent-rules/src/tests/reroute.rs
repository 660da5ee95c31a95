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
use super::helpers::{context, debug_config, MemorySink};
use crate::directive::header;
use crate::reroute::Reroute;
use crate::rule::Rule;
use crate::trace::Severity;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::sync::Arc;
use vagent_common::{addr, DeliveryQueue, Rcpt, RecipientCategory, Route};

fn override_to(domain: &str, queue: DeliveryQueue) -> Route {
    Route::Override {
        domain: domain.parse().unwrap(),
        queue,
    }
}

#[test]
fn reroute_all_overrides_every_recipient() {
    let sink = MemorySink::new();
    let rule = Reroute::all(&debug_config(), sink.clone());

    let mut ctx = context("sender@contoso.com", &["a@contoso.com", "b@gmail.com"]);
    ctx.mail
        .headers
        .push(header::REROUTE_TARGET, "relay.example.net");

    rule.run(&mut ctx);

    let expected = override_to("relay.example.net", DeliveryQueue::UseOverrideDomain);
    assert_eq!(ctx.envelop.rcpt[0].route, expected);
    assert_eq!(ctx.envelop.rcpt[1].route, expected);
    assert_eq!(
        ctx.envelop.rcpt[1].effective_destination(),
        "relay.example.net"
    );
    assert_eq!(
        ctx.mail.headers.find_first(header::PRODUCT_NAME),
        Some("VAgent-RerouteAll")
    );
    assert_eq!(sink.severities(), vec![Severity::Debug]);
}

#[test]
fn marker_header_blocks_a_second_pass() {
    let sink = MemorySink::new();
    let rule = Reroute::all(&debug_config(), sink.clone());

    let mut ctx = context("sender@contoso.com", &["a@gmail.com"]);
    ctx.mail
        .headers
        .push(header::REROUTE_TARGET, "relay.example.net");

    rule.run(&mut ctx);
    ctx.envelop.rcpt[0].route = Route::Organization;
    rule.run(&mut ctx);

    // the second pass saw its own marker and refused to act.
    assert_eq!(ctx.envelop.rcpt[0].route, Route::Organization);
    assert_eq!(sink.severities(), vec![Severity::Debug, Severity::Warning]);
    assert!(sink.text().contains("possible mail loop"));
}

#[test]
fn accepted_domains_are_exempt() {
    let sink = MemorySink::new();
    let accepted: Arc<BTreeSet<String>> =
        Arc::new(["contoso.com".to_string()].into_iter().collect());
    let rule = Reroute::external_by_accepted_domains(&debug_config(), accepted, sink.clone());

    let mut ctx = context("sender@contoso.com", &["u@contoso.com", "u@gmail.com"]);
    ctx.mail
        .headers
        .push(header::REROUTE_TARGET, "relay.example.net");

    rule.run(&mut ctx);

    assert_eq!(ctx.envelop.rcpt[0].route, Route::Organization);
    assert_eq!(
        ctx.envelop.rcpt[1].route,
        override_to("relay.example.net", DeliveryQueue::UseOverrideDomain)
    );
    assert_eq!(
        ctx.mail.headers.find_first(header::PRODUCT_NAME),
        Some("VAgent-RerouteAcceptedDomains")
    );
}

#[test]
fn exclusion_lists_are_exempt() {
    let sink = MemorySink::new();
    let mut config = debug_config();
    config.rules.reroute.exempted_domains = vec!["Contoso.com".to_string()];
    config.rules.reroute.exempted_addresses = vec!["VIP@gmail.com".to_string()];
    let rule = Reroute::external_by_exclusions(&config, sink.clone());

    let mut ctx = context(
        "sender@contoso.com",
        &["u@contoso.com", "vip@gmail.com", "u@gmail.com"],
    );
    ctx.mail
        .headers
        .push(header::REROUTE_TARGET, "relay.example.net");

    rule.run(&mut ctx);

    assert_eq!(ctx.envelop.rcpt[0].route, Route::Organization);
    assert_eq!(ctx.envelop.rcpt[1].route, Route::Organization);
    assert_eq!(
        ctx.envelop.rcpt[2].route,
        override_to("relay.example.net", DeliveryQueue::UseOverrideDomain)
    );
}

#[test]
fn categorization_keeps_the_recipient_queue() {
    let sink = MemorySink::new();
    let rule = Reroute::external_by_categorization(&debug_config(), sink.clone());

    let mut ctx = context("sender@contoso.com", &[]);
    ctx.envelop.rcpt = vec![
        Rcpt::with_category(addr!("u@contoso.com"), RecipientCategory::InSameOrganization),
        Rcpt::with_category(addr!("u@gmail.com"), RecipientCategory::Other),
    ];
    ctx.mail
        .headers
        .push(header::REROUTE_TARGET, "relay.example.net");

    rule.run(&mut ctx);

    assert_eq!(ctx.envelop.rcpt[0].route, Route::Organization);
    assert_eq!(
        ctx.envelop.rcpt[1].route,
        override_to("relay.example.net", DeliveryQueue::UseRecipientDomain)
    );
    // the delivery queue keeps the recipient's own domain.
    assert_eq!(ctx.envelop.rcpt[1].effective_destination(), "relay.example.net");
}

#[test]
fn invalid_target_warns_without_marker() {
    let sink = MemorySink::new();
    let rule = Reroute::all(&debug_config(), sink.clone());

    let mut ctx = context("sender@contoso.com", &["a@gmail.com"]);
    ctx.mail
        .headers
        .push(header::REROUTE_TARGET, "not a hostname");

    rule.run(&mut ctx);

    assert_eq!(ctx.envelop.rcpt[0].route, Route::Organization);
    // no marker either: a corrected retry must not look like a loop.
    assert!(!ctx.mail.headers.contains(header::PRODUCT_NAME));
    assert_eq!(sink.severities(), vec![Severity::Warning]);
}

#[test]
fn absent_target_is_a_silent_skip_for_filtered_variants() {
    let sink = MemorySink::new();
    let rule = Reroute::external_by_exclusions(&debug_config(), sink.clone());

    let mut ctx = context("sender@contoso.com", &["a@gmail.com"]);
    rule.run(&mut ctx);

    assert_eq!(ctx.envelop.rcpt[0].route, Route::Organization);
    assert!(sink.entries().is_empty());
}

#[test]
fn sender_mismatch_marker_does_not_block_rerouting() {
    use crate::sender_mismatch::SenderMismatch;

    let sink = MemorySink::new();
    let mismatch = SenderMismatch::new(&debug_config(), sink.clone());
    let reroute = Reroute::all(&debug_config(), sink.clone());

    let mut ctx = context("sender@contoso.com", &["a@gmail.com"]);
    ctx.mail.headers.push(header::MISMATCH_ACTION, "None");
    ctx.mail
        .headers
        .push(header::REROUTE_TARGET, "relay.example.net");

    mismatch.run(&mut ctx);
    reroute.run(&mut ctx);

    // the sender-mismatch marker lives under its own name, so the reroute
    // loop protection does not see it.
    assert_eq!(
        ctx.mail.headers.find_first(header::SENDER_PRODUCT_NAME),
        Some("VAgent-SenderMismatch")
    );
    assert_eq!(
        ctx.envelop.rcpt[0].route,
        override_to("relay.example.net", DeliveryQueue::UseOverrideDomain)
    );
    assert_eq!(sink.severities(), vec![Severity::Debug, Severity::Debug]);
}

#[test]
fn system_messages_are_exempt() {
    let sink = MemorySink::new();
    let rule = Reroute::all(&debug_config(), sink.clone());

    let mut ctx = context("sender@contoso.com", &["a@gmail.com"]);
    ctx.mail.is_system = true;
    ctx.mail
        .headers
        .push(header::REROUTE_TARGET, "relay.example.net");

    rule.run(&mut ctx);

    assert_eq!(ctx.envelop.rcpt[0].route, Route::Organization);
    assert!(!ctx.mail.headers.contains(header::PRODUCT_NAME));
}
