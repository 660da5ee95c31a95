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
use crate::inspector::Inspector;
use crate::rule::Rule;
use crate::trace::Severity;
use pretty_assertions::assert_eq;
use vagent_common::{addr, Address, Mailbox};

#[test]
fn clean_message_dumps_state_at_debug() {
    let sink = MemorySink::new();
    let rule = Inspector::new(&debug_config(), sink.clone());

    let mut ctx = context("sender@contoso.com", &["a@gmail.com"]);
    ctx.mail.to = vec![Mailbox::with_display_name(addr!("a@gmail.com"), "Ann")];
    ctx.mail.reply_to = vec![Mailbox::new(addr!("replies@contoso.com"))];
    ctx.mail.headers.push("X-Custom", "value");

    let before = ctx.clone();
    rule.run(&mut ctx);

    assert_eq!(ctx, before);
    assert_eq!(sink.severities(), vec![Severity::Debug]);
    let text = sink.text();
    assert!(text.contains("X-Custom: value"));
    assert!(text.contains("P1 RCPT TO: a@gmail.com"));
    assert!(text.contains("P2 TO: \"Ann\" <a@gmail.com>"));
    assert!(text.contains("P2 REPLY-TO: replies@contoso.com"));
}

#[test]
fn sender_mismatch_raises_a_warning() {
    let sink = MemorySink::new();
    let rule = Inspector::new(&debug_config(), sink.clone());

    let mut ctx = context("sender@contoso.com", &["a@gmail.com"]);
    ctx.mail.sender = addr!("other@contoso.com");

    let before = ctx.clone();
    rule.run(&mut ctx);

    // warnings are diagnostic only, the message is never mutated.
    assert_eq!(ctx, before);
    assert_eq!(sink.severities(), vec![Severity::Warning]);
    assert!(sink.text().contains("mismatch"));
}

#[test]
fn multi_address_sender_raises_a_warning() {
    let sink = MemorySink::new();
    let rule = Inspector::new(&debug_config(), sink.clone());

    let mut ctx = context("sender@contoso.com", &[]);
    let multi = Address::new_unchecked("sender@contoso.com,other@contoso.com".to_string());
    ctx.envelop.mail_from = multi.clone();
    ctx.mail.sender = multi.clone();
    ctx.mail.from = multi;

    rule.run(&mut ctx);

    assert_eq!(sink.severities(), vec![Severity::Warning]);
    assert!(sink.text().contains("more than one address"));
}

#[test]
fn silent_when_clean_and_debug_is_off() {
    let sink = MemorySink::new();
    let rule = Inspector::new(&vagent_config::Config::default(), sink.clone());

    let mut ctx = context("sender@contoso.com", &["a@gmail.com"]);
    rule.run(&mut ctx);

    assert!(sink.entries().is_empty());
}
